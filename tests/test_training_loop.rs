use approx::assert_relative_eq;
use ndarray::Array2;
use structlearn::listener::{ListenerChain, LoggingListener, NoopListener};
use structlearn::tagging::{Attribute, TaggerModel, TaggingCorpus, ViterbiInference};
use structlearn::train::{
    Corpus, LearningRate, NonAnnotatedWeight, Perceptron, Plain, TowardBetter, Trainer,
    TrainingStatus, WeightedCorpus,
};
use structlearn::{
    EpochReport, Error, ExampleOutput, Inference, Model, Progress, Result, TrainingListener,
    UpdateTargetSelector,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tagging_corpus() -> TaggingCorpus {
    let mut corpus = TaggingCorpus::new();
    corpus
        .append(
            &[
                vec![Attribute::new("walk", 1.0)],
                vec![Attribute::new("shop", 1.0)],
                vec![Attribute::new("clean", 1.0)],
            ],
            &["sunny", "sunny", "rainy"],
        )
        .unwrap();
    corpus
        .append(
            &[
                vec![Attribute::new("clean", 1.0)],
                vec![Attribute::new("walk", 1.0), Attribute::new("shop", 0.5)],
            ],
            &["rainy", "sunny"],
        )
        .unwrap();
    corpus
        .append(
            &[
                vec![Attribute::new("shop", 1.0)],
                vec![Attribute::new("clean", 1.0)],
                vec![Attribute::new("clean", 0.5)],
            ],
            &["sunny", "rainy", "rainy"],
        )
        .unwrap();
    corpus
}

/// Records every hook call and vetoes where configured.
#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<String>,
    abort: bool,
    stop_before_epoch: Option<usize>,
    stop_after_epoch: Option<usize>,
    epoch_examples: Vec<usize>,
    progress: Vec<u64>,
}

impl<F: ?Sized, M: ?Sized> TrainingListener<F, M> for Recorder {
    fn before_training(&mut self, _inference: &F, _model: &M) -> bool {
        self.calls.push("before_training".to_string());
        !self.abort
    }

    fn before_epoch(&mut self, _inference: &F, _model: &M, epoch: usize, _iteration: u64) -> bool {
        self.calls.push(format!("before_epoch {}", epoch));
        self.stop_before_epoch != Some(epoch)
    }

    fn progress_report(&mut self, _inference: &F, _model: &M, progress: &Progress) {
        self.progress.push(progress.iteration);
    }

    fn after_epoch(&mut self, _inference: &F, _model: &M, report: &EpochReport) -> bool {
        self.calls.push(format!("after_epoch {}", report.epoch));
        self.epoch_examples.push(report.examples);
        self.stop_after_epoch != Some(report.epoch)
    }

    fn after_training(&mut self, _inference: &F, _model: &M) {
        self.calls.push("after_training".to_string());
    }
}

fn trainer(epochs: usize) -> Trainer<Perceptron<Plain>> {
    Trainer::new(Perceptron::plain())
        .with_epochs(epochs)
        .unwrap()
        .with_seed(42)
}

#[test]
fn test_mismatched_dataset_fails_before_listener() {
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let mut recorder = Recorder::default();
    let err = trainer(3)
        .train(
            &ViterbiInference,
            &mut model,
            corpus.inputs(),
            &corpus.outputs()[..2],
            &mut recorder,
        )
        .unwrap_err();

    assert_eq!(
        err,
        Error::DatasetMismatch {
            inputs: 3,
            outputs: 2
        }
    );
    assert!(recorder.calls.is_empty());
    assert_eq!(model, corpus.new_model());
}

#[test]
fn test_abort_before_start() {
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let mut recorder = Recorder {
        abort: true,
        ..Default::default()
    };
    let summary = trainer(3)
        .train(
            &ViterbiInference,
            &mut model,
            corpus.inputs(),
            corpus.outputs(),
            &mut recorder,
        )
        .unwrap();

    assert_eq!(summary.status, TrainingStatus::AbortedBeforeStart);
    assert_eq!(summary.epochs_completed, 0);
    assert_eq!(summary.iterations, 0);
    assert!(!summary.averaged);
    assert_eq!(recorder.calls, vec!["before_training"]);
    assert_eq!(model, corpus.new_model());
}

#[test]
fn test_stop_before_second_epoch() {
    init_logger();
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let mut recorder = Recorder {
        stop_before_epoch: Some(1),
        ..Default::default()
    };
    let summary = trainer(10)
        .train(
            &ViterbiInference,
            &mut model,
            corpus.inputs(),
            corpus.outputs(),
            &mut recorder,
        )
        .unwrap();

    assert_eq!(summary.status, TrainingStatus::StoppedBeforeEpoch { epoch: 1 });
    assert!(summary.stopped_early());
    assert_eq!(summary.epochs_completed, 1);
    assert_eq!(summary.iterations, 3);
    assert!(summary.averaged);
    assert_eq!(
        recorder.calls,
        vec![
            "before_training",
            "before_epoch 0",
            "after_epoch 0",
            "before_epoch 1",
            "after_training"
        ]
    );
}

#[test]
fn test_stop_after_epoch() {
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let mut recorder = Recorder {
        stop_after_epoch: Some(2),
        ..Default::default()
    };
    let summary = trainer(10)
        .train(
            &ViterbiInference,
            &mut model,
            corpus.inputs(),
            corpus.outputs(),
            &mut recorder,
        )
        .unwrap();

    assert_eq!(summary.status, TrainingStatus::StoppedAfterEpoch { epoch: 2 });
    assert_eq!(summary.epochs_completed, 3);
    assert_eq!(summary.epoch_losses.len(), 3);
    assert_eq!(summary.iterations, 9);
    assert_eq!(recorder.calls.last().unwrap(), "after_training");
}

#[test]
fn test_progress_interval() {
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let mut recorder = Recorder::default();
    let mut trainer = trainer(2);
    trainer.params_mut().set_progress_interval(2);
    trainer
        .train(
            &ViterbiInference,
            &mut model,
            corpus.inputs(),
            corpus.outputs(),
            &mut recorder,
        )
        .unwrap();
    assert_eq!(recorder.progress, vec![2, 4, 6]);

    let mut recorder = Recorder::default();
    trainer.params_mut().set_progress_interval(0);
    trainer
        .train(
            &ViterbiInference,
            &mut corpus.new_model(),
            corpus.inputs(),
            corpus.outputs(),
            &mut recorder,
        )
        .unwrap();
    assert!(recorder.progress.is_empty());
}

#[test]
fn test_listener_chain_sees_every_hook() {
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let mut first = Recorder::default();
    let mut second = Recorder {
        stop_after_epoch: Some(0),
        ..Default::default()
    };
    let mut logging = LoggingListener::new().with_total_epochs(5);
    let mut chain = ListenerChain::<ViterbiInference, TaggerModel>::new()
        .push(&mut logging)
        .push(&mut first)
        .push(&mut second);
    let summary = trainer(5)
        .train(
            &ViterbiInference,
            &mut model,
            corpus.inputs(),
            corpus.outputs(),
            &mut chain,
        )
        .unwrap();

    assert_eq!(summary.status, TrainingStatus::StoppedAfterEpoch { epoch: 0 });
    assert_eq!(first.calls, second.calls);
    assert_eq!(first.calls.len(), 4);
}

/// Sums the weights after every example.
#[derive(Default)]
struct WeightSnapshots {
    sums: Option<(Array2<f64>, Array2<f64>)>,
    count: u64,
}

impl<F: ?Sized> TrainingListener<F, TaggerModel> for WeightSnapshots {
    fn progress_report(&mut self, _inference: &F, model: &TaggerModel, _progress: &Progress) {
        match &mut self.sums {
            Some((state, trans)) => {
                *state += model.state_weights();
                *trans += model.transition_weights();
            }
            None => {
                self.sums = Some((
                    model.state_weights().clone(),
                    model.transition_weights().clone(),
                ));
            }
        }
        self.count += 1;
    }
}

#[test]
fn test_averaged_weights_are_mean_of_iterates() {
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let mut snapshots = WeightSnapshots::default();
    let mut trainer = trainer(4);
    trainer.params_mut().set_progress_interval(1);
    let summary = trainer
        .train(
            &ViterbiInference,
            &mut model,
            corpus.inputs(),
            corpus.outputs(),
            &mut snapshots,
        )
        .unwrap();

    assert!(summary.averaged);
    assert_eq!(snapshots.count, 12);
    let n = snapshots.count as f64;
    let (state, trans) = snapshots.sums.unwrap();
    for (w, s) in model.state_weights().iter().zip(state.iter()) {
        assert_relative_eq!(*w, s / n, epsilon = 1e-9);
    }
    for (w, s) in model.transition_weights().iter().zip(trans.iter()) {
        assert_relative_eq!(*w, s / n, epsilon = 1e-9);
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let corpus = tagging_corpus();
    let mut trainer = trainer(6);

    let mut first = corpus.new_model();
    let summary = trainer
        .train(
            &ViterbiInference,
            &mut first,
            corpus.inputs(),
            corpus.outputs(),
            &mut NoopListener,
        )
        .unwrap();
    assert!(summary.reproducible);

    // The same trainer reseeds on every run
    let mut second = corpus.new_model();
    trainer
        .train(
            &ViterbiInference,
            &mut second,
            corpus.inputs(),
            corpus.outputs(),
            &mut NoopListener,
        )
        .unwrap();
    assert_eq!(first, second);

    let mut third = corpus.new_model();
    Trainer::new(Perceptron::plain())
        .with_epochs(6)
        .unwrap()
        .with_seed(42)
        .train(
            &ViterbiInference,
            &mut third,
            corpus.inputs(),
            corpus.outputs(),
            &mut NoopListener,
        )
        .unwrap();
    assert_eq!(first, third);
}

#[test]
fn test_weighted_secondary_corpus() {
    let primary = tagging_corpus();
    let mut secondary = tagging_corpus();
    secondary
        .append(&[vec![Attribute::new("walk", 1.0)]], &["sunny"])
        .unwrap();
    // Both corpora share the dictionaries of `secondary`
    let mut model = secondary.new_model();

    let weighted = WeightedCorpus::new(
        Corpus::new(secondary.inputs(), secondary.outputs()).unwrap(),
        0.5,
        0.25,
    )
    .unwrap();
    assert_eq!(weighted.sample_size(0), 2);
    assert_eq!(weighted.sample_size(2), 4);
    assert_eq!(weighted.sample_size(3), 5);

    let mut recorder = Recorder::default();
    let summary = trainer(4)
        .train_weighted(
            &ViterbiInference,
            &mut model,
            Corpus::new(&primary.inputs()[..2], &primary.outputs()[..2]).unwrap(),
            Some(weighted),
            &mut recorder,
        )
        .unwrap();

    assert_eq!(recorder.epoch_examples, vec![4, 5, 6, 7]);
    assert_eq!(summary.iterations, 22);
}

#[test]
fn test_secondary_weight_never_negative() {
    let corpus = tagging_corpus();
    let mut model = corpus.new_model();
    let weighted = WeightedCorpus::new(
        Corpus::new(corpus.inputs(), corpus.outputs()).unwrap(),
        1.0,
        -0.5,
    )
    .unwrap();
    assert_eq!(weighted.weight_at(3), 0.0);

    let mut recorder = Recorder::default();
    trainer(4)
        .with_randomize(false)
        .train_weighted(
            &ViterbiInference,
            &mut model,
            Corpus::new(&corpus.inputs()[..1], &corpus.outputs()[..1]).unwrap(),
            Some(weighted),
            &mut recorder,
        )
        .unwrap();
    // weights 1.0, 0.5, 0.0, 0.0 over three secondary examples
    assert_eq!(recorder.epoch_examples, vec![4, 3, 1, 1]);

    assert!(WeightedCorpus::new(
        Corpus::new(corpus.inputs(), corpus.outputs()).unwrap(),
        -0.1,
        0.0
    )
    .is_err());
}

#[test]
fn test_non_annotated_weight_curriculum() {
    let corpus = tagging_corpus();
    let prediction = TowardBetter::new(1.0)
        .unwrap()
        .with_non_annotated_weight(NonAnnotatedWeight::new(0.0, 0.5).unwrap());
    let mut trainer = Trainer::new(Perceptron::new(prediction).with_partial_annotation(true))
        .with_epochs(2)
        .unwrap()
        .with_seed(1);
    trainer
        .train(
            &ViterbiInference,
            &mut corpus.new_model(),
            corpus.inputs(),
            corpus.outputs(),
            &mut NoopListener,
        )
        .unwrap();
    assert_eq!(trainer.strategy().prediction().non_annotated_weight(), Some(0.5));

    trainer.params_mut().set_epochs(6).unwrap();
    trainer
        .train(
            &ViterbiInference,
            &mut corpus.new_model(),
            corpus.inputs(),
            corpus.outputs(),
            &mut NoopListener,
        )
        .unwrap();
    // 0.0 + 5 * 0.5 is clamped to the annotated weight
    assert_eq!(trainer.strategy().prediction().non_annotated_weight(), Some(1.0));
}

// Probe task: the model records what the strategy hands it.

#[derive(Debug, Clone, PartialEq)]
struct Same;

impl ExampleOutput<u32> for Same {
    fn create_new_object(&self) -> Self {
        Same
    }

    fn feature_vector_length_squared(&self, _input: &u32, _other: &Self) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Probe {
    seen: Vec<(u32, f64)>,
    iterations: Vec<u64>,
}

impl Model<u32, Same> for Probe {
    fn update(&mut self, input: &u32, _target: &Same, _predicted: &Same, rate: f64) -> Result<f64> {
        self.seen.push((*input, rate));
        Ok(0.0)
    }

    fn sum_updates(&mut self, iteration: u64) {
        self.iterations.push(iteration);
    }

    fn average(&mut self, _iterations: u64) {}
}

struct Constant;

impl Inference<u32, Same, Probe> for Constant {
    fn inference(&self, _model: &Probe, _input: &u32) -> Result<Same> {
        Ok(Same)
    }

    fn partial_inference(&self, _model: &Probe, _input: &u32, _partial: &Same) -> Result<Same> {
        Ok(Same)
    }

    fn loss_augmented_inference(&self, _m: &Probe, _i: &u32, _r: &Same, _w: f64) -> Result<Same> {
        Ok(Same)
    }

    fn loss_augmented_inference_weighted(
        &self,
        _m: &Probe,
        _i: &u32,
        _p: &Same,
        _r: &Same,
        _a: f64,
        _n: f64,
    ) -> Result<Same> {
        Ok(Same)
    }

    fn calculate_suffer_loss(
        &self,
        _m: &Probe,
        _i: &u32,
        _r: &Same,
        _p: &Same,
        _s: &dyn UpdateTargetSelector<Same>,
    ) -> f64 {
        0.0
    }
}

fn probe_run(trainer: &mut Trainer<Perceptron<Plain>>) -> Probe {
    let inputs: Vec<u32> = (0..8).collect();
    let outputs = vec![Same; 8];
    let mut probe = Probe::default();
    trainer
        .train(&Constant, &mut probe, &inputs, &outputs, &mut NoopListener)
        .unwrap();
    probe
}

#[test]
fn test_example_order() {
    let mut ordered = Trainer::new(Perceptron::plain())
        .with_epochs(2)
        .unwrap()
        .with_randomize(false);
    let probe = probe_run(&mut ordered);
    let inputs: Vec<u32> = probe.seen.iter().map(|(i, _)| *i).collect();
    assert_eq!(inputs, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(probe.iterations, (1..=16).collect::<Vec<u64>>());

    let first = probe_run(&mut trainer(2));
    let second = probe_run(&mut trainer(2));
    assert_eq!(first, second);
    let mut epoch: Vec<u32> = first.seen[..8].iter().map(|(i, _)| *i).collect();
    epoch.sort_unstable();
    assert_eq!(epoch, (0..8).collect::<Vec<u32>>());
}

#[test]
fn test_learning_rate_schedule() {
    let mut trainer = Trainer::new(Perceptron::plain())
        .with_epochs(3)
        .unwrap()
        .with_learning_rate(0.5)
        .unwrap()
        .with_randomize(false);
    trainer
        .params_mut()
        .set_learning_rate_update(LearningRate::InverseEpoch)
        .unwrap();
    let probe = probe_run(&mut trainer);
    let rates: Vec<f64> = probe.seen.iter().map(|(_, r)| *r).collect();
    assert_eq!(rates[0], 0.5);
    assert_eq!(rates[8], 0.25);
    assert_relative_eq!(rates[16], 0.5 / 3.0);
}
