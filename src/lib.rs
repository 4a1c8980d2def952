/*!
This library scores the output of word sense disambiguation (WSD) systems against a
gold-standard key, the way the Senseval2 scorer does. It reports the precision, the recall and
the percentage of the key attempted by the system.

# GRAINS
Three granularities are supported:
* Fine: an answer is correct when its sense is exactly one of the senses of the key.
* Mixed: an exact answer, or an answer subsumed by a key sense, gets its full weight. An answer
    that subsumes a key sense gets a share of its weight, inversely proportional to the number of
    senses it groups.
* Coarse: every sense is replaced by its group (itself and all of its subsumers). An answer is
    correct when its group overlaps the group of a key sense.

The subsumptions are read from a sensemap. Without sensemap entries, the three grains give the
same results (up to senses repeated in the key).

# Terminology
* An item is a lexical entry, such as `"fish"` or `"fish-v"`.
* An instance is one occurrence of an item, identified by an arbitrary token.
* A sense is one of the meanings an item can take. An answer gives a sense to an instance, with
  an optional weight.
* The attempted weight is the total confidence the system committed to over all its answers.

# Formats
Answers and keys share the same line format:

`<item> <instance> <answer> [<answer> ...] [!!comment]`

where `<answer>` is a sense, optionally followed by `/` and a weight. Weights above 1 are read as
percentages. A sensemap line is either a single sense or a chain
`<subsumee> <count> <subsumer> [<count> <subsumer> ...]`.
*/

pub mod adapter;
mod answers;
mod config;
mod evaluation;
mod hierarchy;
mod reporter;
mod scoring;

// The public api starts here
pub use answers::{
    scale_weight, Answer, AnswerKey, AnswerLine, AnswerLineError, InstanceKey, LineKind,
    COMMENT_MARKER,
};

pub use hierarchy::{SenseHierarchy, SenseMapError};

pub use scoring::{Grain, GrainParsingError, InstanceScore, Scorer, ScoringError};

pub use reporter::{Denominator, Summary, SummaryError, Tally};

pub use config::{ScoreConfig, ScoreConfigBuilder};

pub use evaluation::{score_files, Evaluation, EvaluationError, Report};
