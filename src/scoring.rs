/**
This module scores the answers of a system for a single instance against the key. Three
granularities are supported:

* Fine: an answer gets its weight when its sense is one of the key senses.
* Mixed: an answer gets its full weight when it matches a key sense or is subsumed by one, and a
    share of its weight when it subsumes a key sense.
* Coarse: an answer gets its weight when its group (the sense and all its subsumers) overlaps the
    group of a key sense.
*/
use crate::answers::{Answer, AnswerKey, AnswerLine, InstanceKey};
use crate::hierarchy::SenseHierarchy;
use enum_iterator::Sequence;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fmt::{self, Display},
    str::FromStr,
};

/// Granularity of the scoring.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Sequence, Serialize, Deserialize,
)]
pub enum Grain {
    #[default]
    Fine,
    Mixed,
    Coarse,
}

impl Display for Grain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GrainParsingError(String);

impl Display for GrainParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into a Grain. Expected fine, mixed or coarse",
            self.0
        )
    }
}

impl Error for GrainParsingError {}

impl FromStr for Grain {
    type Err = GrainParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fine" | "f" => Ok(Grain::Fine),
            "mixed" | "m" => Ok(Grain::Mixed),
            "coarse" | "c" => Ok(Grain::Coarse),
            _ => Err(GrainParsingError(String::from(s))),
        }
    }
}

impl Grain {
    /// Name of the grain as it appears in the report header, e.g. `Fine-grained`.
    pub fn label(&self) -> String {
        format!("{}-grained", self)
    }

    /// Scores the `answers` given for an instance against the `key` of that instance.
    pub fn score(&self, answers: &[Answer], key: &[Answer], hierarchy: &SenseHierarchy) -> f64 {
        match self {
            Grain::Fine => score_fine(answers, key),
            Grain::Mixed => score_mixed(answers, key, hierarchy),
            Grain::Coarse => score_coarse(answers, key, hierarchy),
        }
    }
}

/// Every key entry with the same sense adds the weight of the answer. A key listing a sense twice
/// therefore credits it twice.
fn score_fine(answers: &[Answer], key: &[Answer]) -> f64 {
    let mut total = 0.0;
    for answer in answers {
        for key_answer in key {
            if answer.sense == key_answer.sense {
                total += answer.weight;
            }
        }
    }
    total
}

fn score_mixed(answers: &[Answer], key: &[Answer], hierarchy: &SenseHierarchy) -> f64 {
    let mut total = 0.0;
    for answer in answers {
        if key.iter().any(|k| k.sense == answer.sense) {
            log::debug!("answer {} matches the key", answer.sense);
            total += answer.weight;
            continue;
        }
        if let Some(k) = key
            .iter()
            .find(|k| hierarchy.subsumes(&k.sense, &answer.sense))
        {
            log::debug!("key {} subsumes answer {}", k.sense, answer.sense);
            total += answer.weight;
            continue;
        }
        // Every key subsumed by the answer adds its share.
        for k in key
            .iter()
            .filter(|k| hierarchy.subsumes(&answer.sense, &k.sense))
        {
            log::debug!("answer {} subsumes key {}", answer.sense, k.sense);
            match hierarchy.branch_factor(&answer.sense) {
                Some(count) if count > 0 => total += answer.weight * (1.0 / count as f64),
                _ => log::warn!(
                    "sense {} subsumes {} but groups no sense, no partial credit given",
                    answer.sense,
                    k.sense
                ),
            }
        }
    }
    total
}

fn score_coarse(answers: &[Answer], key: &[Answer], hierarchy: &SenseHierarchy) -> f64 {
    let key_groups: Vec<_> = key.iter().map(|k| hierarchy.group(&k.sense)).collect();
    let mut total = 0.0;
    for answer in answers {
        let answer_group = hierarchy.group(&answer.sense);
        if key_groups
            .iter()
            .any(|group| !group.is_disjoint(&answer_group))
        {
            total += answer.weight;
        }
    }
    total
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Error returned when an instance cannot be scored.
pub enum ScoringError {
    /// The instance is not present in the key.
    NoKey(InstanceKey),
}

impl Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoKey(key) => write!(
                f,
                "no answer key for item {} instance {}",
                key.item, key.instance
            ),
        }
    }
}

impl Error for ScoringError {}

/// Score of a single instance, along with what was compared to obtain it. When displayed, it
/// gives the verbose per-instance output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceScore {
    pub item: String,
    pub instance: String,
    pub score: f64,
    /// Distinct key senses, in key order.
    pub key_senses: Vec<String>,
    pub answers: Vec<Answer>,
}

impl Display for InstanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "score for \"{}_{}\": {:.3}",
            self.item, self.instance, self.score
        )?;
        writeln!(f, " key   = {}", self.key_senses.iter().join(" "))?;
        writeln!(f, " guess = {}", self.answers.iter().join(" "))
    }
}

/// Scores parsed system lines against a key, with a given grain.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    key: &'a AnswerKey,
    hierarchy: &'a SenseHierarchy,
    grain: Grain,
}

impl<'a> Scorer<'a> {
    pub fn new(key: &'a AnswerKey, hierarchy: &'a SenseHierarchy, grain: Grain) -> Self {
        Self {
            key,
            hierarchy,
            grain,
        }
    }

    pub fn grain(&self) -> Grain {
        self.grain
    }

    /// Scores one system line. Fails when the key has no entry for the instance.
    pub fn score(&self, line: &AnswerLine) -> Result<InstanceScore, ScoringError> {
        let instance_key = line.instance_key();
        let key = self
            .key
            .get(&instance_key)
            .ok_or(ScoringError::NoKey(instance_key))?;
        let score = self.grain.score(&line.answers, key, self.hierarchy);
        Ok(InstanceScore {
            item: line.item.clone(),
            instance: line.instance.clone(),
            score,
            key_senses: key.iter().map(|k| k.sense.clone()).unique().collect(),
            answers: line.answers.clone(),
        })
    }

    /// Scores every line. The results are in the same order as the lines, whether or not the
    /// scoring is done in parallel.
    pub fn score_all(
        &self,
        lines: &[AnswerLine],
        parallel: bool,
    ) -> Vec<Result<InstanceScore, ScoringError>> {
        if parallel {
            lines.par_iter().map(|l| self.score(l)).collect()
        } else {
            lines.iter().map(|l| self.score(l)).collect()
        }
    }
}
