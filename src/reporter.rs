/**
This modules turns the counters accumulated during an evaluation into the three summary
statistics: precision, recall and the attempted percentage.
*/
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};

/// Counters accumulated while the key, the sensemap and the answers are read. A tally is created
/// empty for every evaluation and only grows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tally {
    /// Number of key lines accepted.
    pub keyed_instances: usize,
    /// Sum of the normalized weights of the key.
    pub key_weight: f64,
    /// Total weight the system committed to, over every accepted answer line.
    pub attempted_weight: f64,
    /// Sum of the scores of every scored instance.
    pub score_sum: f64,
    /// Answer lines accepted by the parser.
    pub instances_handled: usize,
    /// Answer lines that could be scored against the key.
    pub instances_scored: usize,
    /// Answer lines whose instance is absent from the key.
    pub instances_unkeyed: usize,
    /// Lines of any input rejected by the parsers.
    pub lines_rejected: usize,
}

impl Tally {
    pub fn summary(&self) -> Result<Summary, SummaryError> {
        Summary::new(self.score_sum, self.attempted_weight, self.keyed_instances)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which denominator of the summary was zero.
pub enum Denominator {
    AttemptedWeight,
    KeyedInstances,
}

impl Display for Denominator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttemptedWeight => write!(f, "the system attempted no answer"),
            Self::KeyedInstances => write!(f, "the key has no instance"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryError {
    DivisionByZero(Denominator),
}

impl Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero(denominator) => {
                write!(f, "Encountered division by zero: {}", denominator)
            }
        }
    }
}

impl Error for SummaryError {}

/// Summary statistics of an evaluation. Displaying it gives the classic Senseval report:
///
/// ```rust
/// use sensescore::Summary;
///
/// let summary = Summary::new(1.0, 2.0, 2).unwrap();
/// let expected = " precision: 0.500 (1.00 correct of 2.00 attempted)
///  recall: 0.500 (1.00 correct of 2.00 in total)
///  attempted: 100.000 % (2.00 attempted of 2.00 in total)\n";
/// assert_eq!(expected, summary.to_string());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Score over the attempted weight
    pub precision: f64,
    /// Score over the number of keyed instances
    pub recall: f64,
    /// Attempted weight over the number of keyed instances, in percent
    pub attempted: f64,
    pub score_sum: f64,
    pub attempted_weight: f64,
    pub keyed_instances: usize,
}

impl Summary {
    /// Computes the statistics. Fails instead of producing a NaN or an infinite value when the
    /// system attempted nothing or when the key is empty.
    pub fn new(
        score_sum: f64,
        attempted_weight: f64,
        keyed_instances: usize,
    ) -> Result<Self, SummaryError> {
        if attempted_weight == 0.0 {
            return Err(SummaryError::DivisionByZero(Denominator::AttemptedWeight));
        }
        if keyed_instances == 0 {
            return Err(SummaryError::DivisionByZero(Denominator::KeyedInstances));
        }
        let keyed = keyed_instances as f64;
        Ok(Self {
            precision: score_sum / attempted_weight,
            recall: score_sum / keyed,
            attempted: attempted_weight / keyed * 100.0,
            score_sum,
            attempted_weight,
            keyed_instances,
        })
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyed = self.keyed_instances as f64;
        writeln!(
            f,
            " precision: {:.3} ({:.2} correct of {:.2} attempted)",
            self.precision, self.score_sum, self.attempted_weight
        )?;
        writeln!(
            f,
            " recall: {:.3} ({:.2} correct of {:.2} in total)",
            self.recall, self.score_sum, keyed
        )?;
        writeln!(
            f,
            " attempted: {:.3} % ({:.2} attempted of {:.2} in total)",
            self.attempted, self.attempted_weight, keyed
        )
    }
}
