use sensescore::{Evaluation, Grain, ScoreConfigBuilder};
use std::time::{Duration, Instant};

use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    /// Number of items of the synthetic dataset
    #[arg(short, long, default_value_t = 1000)]
    items: usize,
    /// Number of instances of every item
    #[arg(long, default_value_t = 100)]
    instances: usize,
    #[arg(short, long, default_value_t = Grain::Coarse)]
    grain: Grain,
    #[arg(short, long)]
    parallel: bool,
}

fn build_inputs(items: usize, instances: usize) -> (String, String, String) {
    let mut key = String::new();
    let mut sensemap = String::new();
    let mut answers = String::new();
    for item in 0..items {
        for sense in 0..10 {
            sensemap.push_str(&format!("w{item}%{sense} 5 w{item}%c{}\n", sense / 5));
        }
        for instance in 0..instances {
            key.push_str(&format!("w{item} {instance} w{item}%{}\n", instance % 10));
            answers.push_str(&format!(
                "w{item} {instance} w{item}%{}/60 w{item}%c0/40\n",
                (instance * 3) % 10
            ));
        }
    }
    (key, sensemap, answers)
}

fn main() {
    let args = Args::parse();
    let n_samples = args.n_samples;
    let (key, sensemap, answers) = build_inputs(args.items, args.instances);
    let config = ScoreConfigBuilder::default()
        .grain(args.grain)
        .parallel(args.parallel)
        .build();
    let mut total_duration = Duration::ZERO;
    for _ in 0..n_samples {
        let now = Instant::now();
        let mut evaluation = Evaluation::new(config);
        evaluation.load_key(key.as_bytes()).unwrap();
        evaluation.load_sensemap(sensemap.as_bytes()).unwrap();
        evaluation.score_answers(answers.as_bytes()).unwrap();
        evaluation.summary().unwrap();
        total_duration += now.elapsed();
    }
    println!(
        "Total duration: {} with {n_samples} samples",
        total_duration.as_secs_f64()
    )
}
