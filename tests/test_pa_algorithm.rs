use approx::assert_relative_eq;
use structlearn::listener::NoopListener;
use structlearn::tagging::{
    Attribute, Sequence, TaggerModel, Tags, TaggingCorpus, Tagger, ViterbiInference,
};
use structlearn::train::{PassiveAggressive, StepContext, Trainer, UpdateStrategy};
use structlearn::{ExampleOutput, Inference, Model, Result, UpdateTargetSelector};

fn alternating() -> (Vec<Vec<Attribute>>, Vec<&'static str>) {
    let xseq = vec![
        vec![Attribute::new("a", 1.0)],
        vec![Attribute::new("b", 1.0)],
        vec![Attribute::new("a", 1.0)],
        vec![Attribute::new("b", 1.0)],
        vec![Attribute::new("a", 1.0)],
        vec![Attribute::new("b", 1.0)],
        vec![Attribute::new("a", 1.0)],
        vec![Attribute::new("b", 1.0)],
        vec![Attribute::new("a", 1.0)],
    ];
    let yseq = vec!["X", "Y", "X", "Y", "X", "Y", "X", "Y", "X"];
    (xseq, yseq)
}

#[test]
fn test_pa_types() {
    let (xseq, yseq) = alternating();
    let mut corpus = TaggingCorpus::new();
    corpus.append(&xseq, &yseq).unwrap();

    fn check<S>(strategy: S, corpus: &TaggingCorpus, xseq: &[Vec<Attribute>], yseq: &[&str])
    where
        S: UpdateStrategy<Sequence, Tags, TaggerModel, ViterbiInference>,
    {
        let name = strategy.name();
        let mut model = corpus.new_model();
        let mut trainer = Trainer::new(strategy)
            .with_epochs(50)
            .unwrap()
            .with_seed(1);
        let summary = trainer
            .train(
                &ViterbiInference,
                &mut model,
                corpus.inputs(),
                corpus.outputs(),
                &mut NoopListener,
            )
            .unwrap();
        assert_eq!(summary.epoch_losses[0], 4.0, "{}", name);
        assert_eq!(*summary.epoch_losses.last().unwrap(), 0.0, "{}", name);

        let predicted = Tagger::new(&model, corpus).tag(xseq).unwrap();
        assert_eq!(predicted, yseq, "{}", name);
    }

    for c in &[0.1, 1.0, 10.0] {
        check(PassiveAggressive::pa(), &corpus, &xseq, &yseq);
        check(PassiveAggressive::pa1(*c).unwrap(), &corpus, &xseq, &yseq);
        check(PassiveAggressive::pa2(*c).unwrap(), &corpus, &xseq, &yseq);
    }
}

#[test]
fn test_pa_rejects_bad_aggressiveness() {
    assert!(PassiveAggressive::pa1(0.0).is_err());
    assert!(PassiveAggressive::pa1(-1.0).is_err());
    assert!(PassiveAggressive::pa2(f64::NAN).is_err());
    assert!(PassiveAggressive::pa2(f64::INFINITY).is_err());
}

// A task with fixed loss and feature distance, so the step size shows up
// directly in the update rate.

#[derive(Debug, Clone, PartialEq)]
struct Fixed(u8);

impl ExampleOutput<()> for Fixed {
    fn create_new_object(&self) -> Self {
        Fixed(0)
    }

    fn feature_vector_length_squared(&self, _input: &(), other: &Self) -> f64 {
        if self == other {
            0.0
        } else {
            2.0
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RateRecorder {
    rates: Vec<f64>,
}

impl Model<(), Fixed> for RateRecorder {
    fn update(&mut self, _input: &(), target: &Fixed, predicted: &Fixed, rate: f64) -> Result<f64> {
        self.rates.push(rate);
        Ok(if target == predicted { 0.0 } else { 1.0 })
    }

    fn sum_updates(&mut self, _iteration: u64) {}

    fn average(&mut self, _iterations: u64) {}
}

struct AlwaysWrong;

impl Inference<(), Fixed, RateRecorder> for AlwaysWrong {
    fn inference(&self, _model: &RateRecorder, _input: &()) -> Result<Fixed> {
        Ok(Fixed(2))
    }

    fn partial_inference(&self, _m: &RateRecorder, _i: &(), partial: &Fixed) -> Result<Fixed> {
        Ok(partial.clone())
    }

    fn loss_augmented_inference(
        &self,
        _m: &RateRecorder,
        _i: &(),
        _r: &Fixed,
        _w: f64,
    ) -> Result<Fixed> {
        Ok(Fixed(2))
    }

    fn loss_augmented_inference_weighted(
        &self,
        _m: &RateRecorder,
        _i: &(),
        _p: &Fixed,
        _r: &Fixed,
        _a: f64,
        _n: f64,
    ) -> Result<Fixed> {
        Ok(Fixed(2))
    }

    fn calculate_suffer_loss(
        &self,
        _m: &RateRecorder,
        _i: &(),
        reference: &Fixed,
        predicted: &Fixed,
        selector: &dyn UpdateTargetSelector<Fixed>,
    ) -> f64 {
        if selector.select(reference, predicted) == reference {
            0.0
        } else {
            4.0
        }
    }
}

fn one_step<S>(mut strategy: S, reference: Fixed) -> f64
where
    S: UpdateStrategy<(), Fixed, RateRecorder, AlwaysWrong>,
{
    let mut model = RateRecorder::default();
    let step = StepContext {
        epoch: 0,
        iteration: 1,
        learning_rate: 1.0,
    };
    strategy
        .train_one_example(&AlwaysWrong, &mut model, &(), &reference, &step)
        .unwrap();
    assert_eq!(model.rates.len(), 1);
    model.rates[0]
}

#[test]
fn test_step_sizes() {
    // suffer loss 4, squared distance 2
    assert_relative_eq!(one_step(PassiveAggressive::pa(), Fixed(1)), 2.0);
    assert_relative_eq!(one_step(PassiveAggressive::pa1(1.0).unwrap(), Fixed(1)), 1.0);
    assert_relative_eq!(one_step(PassiveAggressive::pa1(5.0).unwrap(), Fixed(1)), 2.0);
    assert_relative_eq!(one_step(PassiveAggressive::pa2(1.0).unwrap(), Fixed(1)), 1.6);
}

#[test]
fn test_correct_prediction_gives_zero_step() {
    // The prediction equals the reference: zero distance, zero suffer loss
    assert_eq!(one_step(PassiveAggressive::pa(), Fixed(2)), 0.0);
    assert_eq!(one_step(PassiveAggressive::pa1(1.0).unwrap(), Fixed(2)), 0.0);
    assert_eq!(one_step(PassiveAggressive::pa2(1.0).unwrap(), Fixed(2)), 0.0);
}
