/*
 * This modules contains the `ScoreConfig` struct, which implements the default trait, and the
 * builder used to customize it. The config is given to an `Evaluation` to choose the grain of
 * the scoring and how the instances are scored.
*/
use crate::scoring::Grain;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
/// Config struct used to simplify the inputs of an evaluation. It implements the default trait:
/// fine grained scoring, no verbose output and sequential scoring.
pub struct ScoreConfig {
    /// Granularity used to compare the answers to the key.
    grain: Grain,
    /// Should the score of every instance be reported?
    verbose: bool,
    /// Can we use multiple cores to score the instances? The instances are still accumulated in
    /// their input order.
    parallel: bool,
}

impl ScoreConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn grain(&self) -> Grain {
        self.grain
    }
    pub fn verbose(&self) -> bool {
        self.verbose
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl From<(Grain, bool, bool)> for ScoreConfig {
    fn from(value: (Grain, bool, bool)) -> Self {
        Self {
            grain: value.0,
            verbose: value.1,
            parallel: value.2,
        }
    }
}

impl From<ScoreConfig> for (Grain, bool, bool) {
    fn from(value: ScoreConfig) -> Self {
        (value.grain, value.verbose, value.parallel)
    }
}

impl From<ScoreConfigBuilder> for ScoreConfig {
    fn from(value: ScoreConfigBuilder) -> Self {
        Self {
            grain: value.grain.unwrap_or_default(),
            verbose: value.verbose,
            parallel: value.parallel,
        }
    }
}

impl Display for ScoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!(
            "Grain used for the scoring: {}\n Reporting every instance: {}\n Using parallel computations: {}",
            self.grain, self.verbose, self.parallel
        );
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize a `ScoreConfig` structure.
#[derive(Debug, Default)]
pub struct ScoreConfigBuilder {
    grain: Option<Grain>,
    verbose: bool,
    parallel: bool,
}

impl ScoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn grain(mut self, grain: Grain) -> Self {
        self.grain = Some(grain);
        self
    }
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn build(self) -> ScoreConfig {
        ScoreConfig::from(self)
    }
}
