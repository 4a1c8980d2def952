use anyhow::{Context, Result};
use clap::Parser;
use sensescore::{Evaluation, Grain, ScoreConfigBuilder};
use std::path::PathBuf;

const DETAILED_HELP: &str = "\
This is a scorer for senseval2. Answers are one per line in the form

\t<item> <instance> <answer> [ <answer> [ ... ]] [<comment>]

<item> is a lexical item, sometimes just a word, sometimes a word plus a part of speech, for
example \"fish\" or \"fish-v\".

<instance> is an arbitrary identifier. It cannot contain whitespace.

<answer> is in the form [^ \\t/]+ followed by an optional \"/\" plus weight. Weights above 1 are
divided by 100 until they are at most 1.

A <comment> is in the form \"!![^\\n]*\".

Answers are compared against a key. Both answers and keys are in the format described above.
Additionally, a sense map provides a subsumption table of the senses. A sense map line is in the
form

\t<subsumee>[ <numsubsumed> <subsumer>]

The log level of the diagnostics written to stderr is set with RUST_LOG (default: warn).";

#[derive(Debug, Parser)]
#[command(
    name = "sensescore",
    version,
    about = "Scores word sense disambiguation answers against a key (Senseval2)",
    after_help = DETAILED_HELP
)]
struct Args {
    /// Print the score of every instance
    #[arg(short, long)]
    verbose: bool,
    /// Fine grained scoring (default)
    #[arg(short, long, overrides_with_all = ["mixed", "coarse"])]
    fine: bool,
    /// Mixed grain scoring
    #[arg(short, long, overrides_with_all = ["fine", "coarse"])]
    mixed: bool,
    /// Coarse grained scoring
    #[arg(short, long, overrides_with_all = ["fine", "mixed"])]
    coarse: bool,
    /// Score the instances on multiple cores
    #[arg(long)]
    parallel: bool,
    /// Answers of the evaluated system
    answers: PathBuf,
    /// Gold-standard key
    key: PathBuf,
    /// Sense map, possibly empty
    sensemap: PathBuf,
}

impl Args {
    fn grain(&self) -> Grain {
        if self.coarse {
            Grain::Coarse
        } else if self.mixed {
            Grain::Mixed
        } else {
            Grain::Fine
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = ScoreConfigBuilder::default()
        .grain(args.grain())
        .verbose(args.verbose)
        .parallel(args.parallel)
        .build();
    log::debug!("{}", config);

    let mut evaluation = Evaluation::new(config);
    evaluation
        .load_key_file(&args.key)
        .with_context(|| format!("reading the key {}", args.key.display()))?;
    evaluation
        .load_sensemap_file(&args.sensemap)
        .with_context(|| format!("reading the sense map {}", args.sensemap.display()))?;
    let scores = evaluation
        .score_answers_file(&args.answers)
        .with_context(|| format!("reading the answers {}", args.answers.display()))?;

    if config.verbose() {
        for score in &scores {
            println!("{}", score);
        }
    }
    let summary = evaluation
        .summary()
        .context("cannot summarize the evaluation")?;
    println!();
    println!(
        "{} score for \"{}\" using key \"{}\":",
        config.grain().label(),
        args.answers.display(),
        args.key.display()
    );
    print!("{}", summary);
    println!();
    Ok(())
}
