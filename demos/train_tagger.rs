use structlearn::listener::{ConvergenceListener, ListenerChain, LoggingListener};
use structlearn::tagging::{
    Attribute, Sequence, TaggerModel, Tags, TaggingCorpus, Tagger, ViterbiInference,
};
use structlearn::train::{AlgorithmParams, TrainerParams, UpdateStrategy};
use structlearn::Trainer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Structured Perceptron Training and Tagging Example");
    println!("==================================================\n");

    // Create training data
    let xseq = vec![
        vec![Attribute::new("walk", 1.0), Attribute::new("shop", 0.5)],
        vec![Attribute::new("walk", 1.0)],
        vec![Attribute::new("walk", 1.0), Attribute::new("clean", 0.5)],
        vec![Attribute::new("shop", 0.5), Attribute::new("clean", 0.5)],
        vec![Attribute::new("walk", 0.5), Attribute::new("clean", 1.0)],
        vec![Attribute::new("clean", 1.0), Attribute::new("shop", 0.1)],
        vec![Attribute::new("walk", 1.0), Attribute::new("shop", 0.5)],
        vec![],
        vec![Attribute::new("clean", 1.0)],
    ];
    let yseq = vec![
        "sunny", "sunny", "sunny", "rainy", "rainy", "rainy", "sunny", "sunny", "rainy",
    ];

    println!("Training data:");
    println!("  Sequence length: {}", xseq.len());
    println!("  Labels: {:?}\n", yseq);

    let mut corpus = TaggingCorpus::new();
    corpus.append(&xseq, &yseq)?;

    // The algorithm is picked by name, the way an outer driver would
    let algorithm = std::env::args().nth(1).unwrap_or_else(|| "pa1".to_string());
    let mut params = AlgorithmParams::default();
    params.set("algorithm", &algorithm)?;
    params.set("c", "1.0")?;

    let mut trainer_params = TrainerParams::default();
    trainer_params.set("epochs", "30")?;
    trainer_params.set("seed", "1")?;
    println!("Setting parameters:");
    println!("  Algorithm: {}", params.get("algorithm")?);
    println!("  Epochs: {}", trainer_params.get("epochs")?);
    println!("  Averaging: {}\n", trainer_params.get("average_weights")?);

    let strategy: Box<dyn UpdateStrategy<Sequence, Tags, TaggerModel, ViterbiInference>> =
        params.build()?;
    let mut trainer = Trainer::with_params(strategy, trainer_params);

    let mut model = corpus.new_model();
    let mut logging = LoggingListener::new().with_total_epochs(30);
    let mut convergence = ConvergenceListener::new(1e-9);
    let mut listener = ListenerChain::<ViterbiInference, TaggerModel>::new()
        .push(&mut logging)
        .push(&mut convergence);

    println!("Training model...\n");
    let summary = trainer.train(
        &ViterbiInference,
        &mut model,
        corpus.inputs(),
        corpus.outputs(),
        &mut listener,
    )?;

    println!("==================================================");
    println!(
        "Training finished: {:?} after {} epochs",
        summary.status, summary.epochs_completed
    );
    if let Some(epoch) = convergence.converged_at() {
        println!("Converged at epoch {}", epoch + 1);
    }
    println!("==================================================\n");

    let tagger = Tagger::new(&model, &corpus);

    println!("Testing on new data:");
    let test_seq = vec![
        vec![Attribute::new("walk", 1.0)],
        vec![Attribute::new("shop", 1.0)],
        vec![Attribute::new("clean", 1.0)],
    ];
    let result = tagger.tag(&test_seq)?;
    println!("  Input: walk -> shop -> clean");
    println!("  Predicted labels: {:?}", result);

    Ok(())
}
