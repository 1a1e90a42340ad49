use ndarray::Array2;

/// Viterbi lattice of a first-order linear chain.
///
/// `state` is the `[T][L]` matrix whose element `[t][l]` holds the score of
/// label #l at position #t; it is built fresh for every search so callers can
/// add loss terms or constraints to it before decoding.
#[derive(Debug, Clone)]
pub struct Lattice {
    /// State scores
    pub state: Array2<f64>,
    /// Alpha score matrix
    ///
    /// Element `[t][l]` holds the best score of a path from BOS to (t, l).
    alpha_score: Array2<f64>,
    /// Backward edges
    ///
    /// Element `[t][j]` holds the label #i at t-1 on the best path into (t, j).
    backward_edge: Array2<u32>,
}

impl Lattice {
    pub fn new(state: Array2<f64>) -> Self {
        let dim = state.dim();
        Self {
            state,
            alpha_score: Array2::zeros(dim),
            backward_edge: Array2::zeros(dim),
        }
    }

    pub fn num_items(&self) -> usize {
        self.state.nrows()
    }

    pub fn num_labels(&self) -> usize {
        self.state.ncols()
    }

    /// Forbid every label at position `t` except `label`.
    pub fn constrain(&mut self, t: usize, label: u32) {
        for (l, score) in self.state.row_mut(t).iter_mut().enumerate() {
            if l != label as usize {
                *score = f64::NEG_INFINITY;
            }
        }
    }

    /// Best label path and its score under the transition scores `trans`.
    ///
    /// Ties go to the lowest label id. Returns `None` when no path has a
    /// finite score.
    pub fn viterbi(&mut self, trans: &Array2<f64>) -> Option<(Vec<u32>, f64)> {
        let t_len = self.num_items();
        let l_len = self.num_labels();
        if t_len == 0 {
            return Some((Vec::new(), 0.0));
        }

        // Compute the scores at (0, *)
        for j in 0..l_len {
            self.alpha_score[[0, j]] = self.state[[0, j]];
        }

        // Compute the scores at (t, *)
        for t in 1..t_len {
            for j in 0..l_len {
                let mut max_score = f64::NEG_INFINITY;
                let mut argmax = 0;
                for i in 0..l_len {
                    // Transit from (t-1, i) to (t, j)
                    let score = self.alpha_score[[t - 1, i]] + trans[[i, j]];
                    if score > max_score {
                        max_score = score;
                        argmax = i;
                    }
                }
                self.backward_edge[[t, j]] = argmax as u32;
                self.alpha_score[[t, j]] = max_score + self.state[[t, j]];
            }
        }

        // Find the node (#T, i) that reaches EOS with the maximum score
        let mut max_score = f64::NEG_INFINITY;
        let mut last = None;
        for (i, &score) in self.alpha_score.row(t_len - 1).iter().enumerate() {
            if score > max_score {
                max_score = score;
                last = Some(i as u32);
            }
        }
        let last = last?;

        // Tag labels by tracing the backward links
        let mut labels = vec![0u32; t_len];
        labels[t_len - 1] = last;
        for t in (0..t_len - 1).rev() {
            labels[t] = self.backward_edge[[t + 1, labels[t + 1] as usize]];
        }

        Some((labels, max_score))
    }
}
