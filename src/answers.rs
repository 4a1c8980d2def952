/**
This module parses answer lines. The same format is used by the gold-standard key and by the
answers of the system being evaluated:

`<item> <instance> <answer> [<answer> ...] [!!comment]`

where every `<answer>` is either a bare sense identifier (implicit weight of 1) or a sense
identifier followed by `/` and an explicit weight.
*/
use ahash::HashMap as AHashMap;
use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fmt::{self, Display},
};

/// Everything following this marker on an answer line is a comment.
pub const COMMENT_MARKER: &str = "!!";

/// A single sense given for an instance, with the confidence attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Sense identifier, such as `"fish%1:13:00::"`.
    pub sense: String,
    /// Weight of the answer, between 0 and 1 once the line is normalized.
    pub weight: f64,
}

impl Answer {
    pub fn new<S: Into<String>>(sense: S, weight: f64) -> Self {
        Self {
            sense: sense.into(),
            weight,
        }
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:.3}", self.sense, self.weight)
    }
}

/// Identifies one disambiguation decision: a lexical item and the occurrence of that item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    pub item: String,
    pub instance: String,
}

impl InstanceKey {
    pub fn new<I: Into<String>, N: Into<String>>(item: I, instance: N) -> Self {
        Self {
            item: item.into(),
            instance: instance.into(),
        }
    }
}

impl Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.item, self.instance)
    }
}

/// Is the line coming from the gold-standard key or from the evaluated system? The kind only
/// changes the bookkeeping of the attempted weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Key,
    System,
}

#[derive(Debug, Clone, PartialEq)]
/// Error returned when an answer line cannot be used. The line is skipped by the callers.
pub enum AnswerLineError {
    /// The line does not contain an item and an instance.
    Malformed(String),
    /// One of the explicit weights is not a finite, non-negative number.
    BadWeight { line: String, token: String },
    /// The line has an item and an instance but no answer.
    NoAnswer { item: String, instance: String },
}

impl Display for AnswerLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(line) => write!(f, "bad answer line {}", line),
            Self::BadWeight { line, token } => {
                write!(f, "bad weight in `{}`, bad answer line {}", token, line)
            }
            Self::NoAnswer { item, instance } => write!(
                f,
                "no answer provided by system for {}, {}",
                item, instance
            ),
        }
    }
}

impl Error for AnswerLineError {}

/// A parsed and normalized answer line.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerLine {
    pub item: String,
    pub instance: String,
    /// Normalized answers, in the order they appeared on the line.
    pub answers: Vec<Answer>,
    kind: LineKind,
    /// Sum of the explicit weights (after scaling). `None` when the line only had bare senses.
    explicit_weight: Option<f64>,
}

impl AnswerLine {
    /// Parses and normalizes a single line.
    ///
    /// * `line`: The raw line. A trailing line terminator is ignored.
    /// * `kind`: Whether the line belongs to the key or to the system answers.
    pub fn parse(line: &str, kind: LineKind) -> Result<Self, AnswerLineError> {
        let (item, instance, rest) =
            split_fields(line).ok_or_else(|| AnswerLineError::Malformed(line.to_string()))?;
        let answers_text = match rest.find(COMMENT_MARKER) {
            Some(idx) => &rest[..idx],
            None => rest,
        };

        let mut answers = Vec::new();
        let mut total_weight = 0.0;
        let mut explicit_weight: Option<f64> = None;
        for token in answers_text.split_ascii_whitespace() {
            match token.split_once('/') {
                Some((sense, raw_weight)) => {
                    let weight =
                        parse_weight(raw_weight).ok_or_else(|| AnswerLineError::BadWeight {
                            line: line.to_string(),
                            token: token.to_string(),
                        })?;
                    *explicit_weight.get_or_insert(0.0) += weight;
                    total_weight += weight;
                    answers.push(Answer::new(sense, weight));
                }
                None => {
                    total_weight += 1.0;
                    answers.push(Answer::new(token, 1.0));
                }
            }
        }
        if answers.is_empty() {
            return Err(AnswerLineError::NoAnswer {
                item: item.to_string(),
                instance: instance.to_string(),
            });
        }
        normalize(&mut answers, total_weight);
        Ok(Self {
            item: item.to_string(),
            instance: instance.to_string(),
            answers,
            kind,
            explicit_weight,
        })
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn instance_key(&self) -> InstanceKey {
        InstanceKey::new(self.item.as_str(), self.instance.as_str())
    }

    /// Weight this line adds to the total weight attempted by the system. Key lines never count
    /// as attempts. A system line counts the sum of its explicit weights, or exactly one full
    /// attempt when it only lists bare senses, whatever their number.
    pub fn attempted_weight(&self) -> f64 {
        match (self.kind, self.explicit_weight) {
            (LineKind::Key, _) => 0.0,
            (LineKind::System, Some(weight)) => weight,
            (LineKind::System, None) => 1.0,
        }
    }

    /// Sum of the normalized weights of the answers.
    pub fn total_weight(&self) -> f64 {
        self.answers.iter().fold(0.0, |acc, a| acc + a.weight)
    }
}

/// Splits a line into its item, its instance and the rest of the line.
/// Only ASCII whitespace separates fields, other blanks belong to the identifiers.
fn split_fields(line: &str) -> Option<(&str, &str, &str)> {
    let line = line.trim_ascii_start();
    let item_end = line.find(|c: char| c.is_ascii_whitespace())?;
    let item = &line[..item_end];
    let rest = line[item_end..].trim_ascii_start();
    let instance_end = rest
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(rest.len());
    if instance_end == 0 {
        return None;
    }
    Some((item, &rest[..instance_end], &rest[instance_end..]))
}

fn parse_weight(raw: &str) -> Option<f64> {
    let weight: f64 = raw.parse().ok()?;
    if !weight.is_finite() || weight.is_sign_negative() {
        return None;
    }
    Some(scale_weight(weight))
}

/// Brings weights given on a larger scale (usually out of 100) between 0 and 1 by dividing them
/// by 100 as many times as needed.
pub fn scale_weight(mut weight: f64) -> f64 {
    while weight > 1.0 {
        weight /= 100.0;
    }
    weight
}

/// When the rounded total weight is above 1, the answers are given an equal share of a single
/// full answer.
fn normalize(answers: &mut [Answer], total_weight: f64) {
    if total_weight.round() > 1.0 {
        let share = 1.0 / answers.len() as f64;
        answers.iter_mut().for_each(|a| a.weight = share);
    }
}

/// The gold-standard answers, indexed by instance.
#[derive(Debug, Clone, Default)]
pub struct AnswerKey {
    entries: AHashMap<InstanceKey, Vec<Answer>>,
    keyed_instances: usize,
    total_weight: f64,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a key from raw lines. Unusable lines are logged and skipped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = Self::new();
        key.add_lines(lines);
        key
    }

    /// Parses and stores every line. Unusable lines are logged and skipped, their number is
    /// returned.
    pub fn add_lines<I, S>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rejected = 0;
        for line in lines {
            if let Err(e) = self.add_line(line.as_ref()) {
                log::warn!("{}", e);
                rejected += 1;
            }
        }
        rejected
    }

    /// Parses a key line and stores it.
    pub fn add_line(&mut self, line: &str) -> Result<(), AnswerLineError> {
        let parsed = AnswerLine::parse(line, LineKind::Key)?;
        self.insert(parsed);
        Ok(())
    }

    /// Stores the answers of a parsed line. A later line for the same instance replaces the
    /// earlier one, but every stored line counts as a keyed instance.
    pub fn insert(&mut self, line: AnswerLine) {
        self.total_weight += line.total_weight();
        self.keyed_instances += 1;
        let key = line.instance_key();
        self.entries.insert(key, line.answers);
    }

    pub fn get(&self, key: &InstanceKey) -> Option<&[Answer]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of key lines accepted so far.
    pub fn keyed_instances(&self) -> usize {
        self.keyed_instances
    }

    /// Sum of the normalized weights of every accepted key line.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of distinct instances in the key.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};
    use rstest::rstest;

    fn are_close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn weights(line: &AnswerLine) -> Vec<f64> {
        line.answers.iter().map(|a| a.weight).collect()
    }

    #[rstest]
    #[case(0.3, 0.3)]
    #[case(1.0, 1.0)]
    #[case(45.0, 0.45)]
    #[case(4500.0, 0.45)]
    #[case(150.0, 0.015)]
    #[case(100.0, 1.0)]
    fn test_scale_weight(#[case] raw: f64, #[case] expected: f64) {
        assert!(are_close(scale_weight(raw), expected));
    }

    #[test]
    fn test_parse_single_implicit_answer() {
        let line = AnswerLine::parse("art.n art.40001 art%1:09:00::", LineKind::System).unwrap();
        assert_eq!(line.item, "art.n");
        assert_eq!(line.instance, "art.40001");
        assert_eq!(line.answers, vec![Answer::new("art%1:09:00::", 1.0)]);
        assert_eq!(line.attempted_weight(), 1.0);
    }

    #[rstest]
    #[case(LineKind::Key)]
    #[case(LineKind::System)]
    fn test_implicit_answers_share_one_full_answer(#[case] kind: LineKind) {
        let line = AnswerLine::parse("bank.n 12 a b c d", kind).unwrap();
        assert_eq!(weights(&line), vec![0.25; 4]);
    }

    #[test]
    fn test_explicit_weights_are_kept_below_one() {
        let line = AnswerLine::parse("bank.n 12 a/0.2 b/0.7", LineKind::System).unwrap();
        assert_eq!(weights(&line), vec![0.2, 0.7]);
        assert!(are_close(line.attempted_weight(), 0.9));
    }

    #[test]
    fn test_percent_weights() {
        let line = AnswerLine::parse("bank.n 12 a/40 b/60", LineKind::System).unwrap();
        assert!(are_close(line.answers[0].weight, 0.4));
        assert!(are_close(line.answers[1].weight, 0.6));
        assert!(are_close(line.attempted_weight(), 1.0));
    }

    #[test]
    fn test_rounded_total_below_threshold_is_not_normalized() {
        // 1.2 rounds to 1, the weights are kept as is.
        let line = AnswerLine::parse("bank.n 12 a/0.6 b/0.6", LineKind::System).unwrap();
        assert_eq!(weights(&line), vec![0.6, 0.6]);
    }

    #[test]
    fn test_mixed_implicit_and_explicit_weights() {
        let line = AnswerLine::parse("bank.n 12 a b/0.5", LineKind::System).unwrap();
        assert_eq!(weights(&line), vec![0.5, 0.5]);
        // Only the explicit weight counts as attempted.
        assert!(are_close(line.attempted_weight(), 0.5));
    }

    #[test]
    fn test_key_lines_are_never_attempts() {
        let line = AnswerLine::parse("bank.n 12 a/0.5", LineKind::Key).unwrap();
        assert_eq!(line.attempted_weight(), 0.0);
        let line = AnswerLine::parse("bank.n 12 a", LineKind::Key).unwrap();
        assert_eq!(line.attempted_weight(), 0.0);
    }

    #[rstest]
    #[case("bank.n 12 a !! a comment", vec!["a"])]
    #[case("bank.n 12 a b!!c", vec!["a", "b"])]
    #[case("bank.n\t12\ta\tb  ", vec!["a", "b"])]
    #[case("bank.n 12 a\n", vec!["a"])]
    fn test_answer_senses(#[case] raw: &str, #[case] expected: Vec<&str>) {
        let line = AnswerLine::parse(raw, LineKind::System).unwrap();
        let senses: Vec<_> = line.answers.iter().map(|a| a.sense.as_str()).collect();
        assert_eq!(senses, expected);
    }

    #[rstest]
    #[case("")]
    #[case("bank.n")]
    #[case("   ")]
    fn test_malformed_lines(#[case] raw: &str) {
        assert_eq!(
            AnswerLine::parse(raw, LineKind::System),
            Err(AnswerLineError::Malformed(raw.to_string()))
        );
    }

    #[rstest]
    #[case("bank.n 12")]
    #[case("bank.n 12 ")]
    #[case("bank.n 12 !! only a comment")]
    fn test_no_answer(#[case] raw: &str) {
        assert_eq!(
            AnswerLine::parse(raw, LineKind::System),
            Err(AnswerLineError::NoAnswer {
                item: String::from("bank.n"),
                instance: String::from("12")
            })
        );
    }

    #[rstest]
    #[case("bank.n 12 a/high")]
    #[case("bank.n 12 a/0.5 b/")]
    #[case("bank.n 12 a/inf")]
    #[case("bank.n 12 a/-3")]
    fn test_bad_weight(#[case] raw: &str) {
        let res = AnswerLine::parse(raw, LineKind::System);
        assert!(matches!(res, Err(AnswerLineError::BadWeight { .. })));
    }

    #[test]
    fn test_key_repeated_instance_overwrites() {
        let key = AnswerKey::from_lines(["bank.n 1 a", "bank.n 2 b", "bank.n 1 c"]);
        assert_eq!(key.len(), 2);
        assert_eq!(key.keyed_instances(), 3);
        assert_eq!(
            key.get(&InstanceKey::new("bank.n", "1")).unwrap(),
            &[Answer::new("c", 1.0)]
        );
    }

    #[test]
    fn test_non_breaking_space_is_part_of_the_sense() {
        let line = AnswerLine::parse("bank.n 12 a\u{a0}b c", LineKind::System).unwrap();
        let senses: Vec<_> = line.answers.iter().map(|a| a.sense.as_str()).collect();
        assert_eq!(senses, vec!["a\u{a0}b", "c"]);
        let line = AnswerLine::parse("año\u{a0}n 12 a", LineKind::System).unwrap();
        assert_eq!(line.item, "año\u{a0}n");
        assert_eq!(line.instance, "12");
    }

    #[test]
    fn test_add_lines_counts_rejected_lines() {
        let mut key = AnswerKey::new();
        assert_eq!(key.add_lines(["bank.n 1 a", "bank.n", "bank.n 2 b/x"]), 2);
        assert_eq!(key.add_lines(["bank.n 2 b"]), 0);
        assert_eq!(key.keyed_instances(), 2);
    }

    #[test]
    fn test_key_skips_bad_lines() {
        let key = AnswerKey::from_lines(["bank.n 1 a", "", "bank.n 2", "bank.n 3 a/x"]);
        assert_eq!(key.len(), 1);
        assert_eq!(key.keyed_instances(), 1);
        assert!(are_close(key.total_weight(), 1.0));
    }

    #[test]
    fn test_scaled_weights_are_in_unit_interval() {
        fn scaled_in_unit_interval(raw: f64) -> TestResult {
            if !raw.is_finite() || raw < 0.0 {
                return TestResult::discard();
            }
            let scaled = scale_weight(raw);
            TestResult::from_bool((0.0..=1.0).contains(&scaled))
        }
        let mut qc = QuickCheck::new().tests(2000);
        qc.quickcheck(scaled_in_unit_interval as fn(f64) -> TestResult)
    }

    #[test]
    fn test_implicit_lines_never_exceed_one_answer() {
        fn implicit_total(senses: Vec<u8>) -> TestResult {
            if senses.is_empty() {
                return TestResult::discard();
            }
            let answers: Vec<String> = senses.iter().map(|s| format!("s{}", s)).collect();
            let raw = format!("item inst {}", answers.join(" "));
            let line = match AnswerLine::parse(&raw, LineKind::System) {
                Ok(line) => line,
                Err(_) => return TestResult::failed(),
            };
            TestResult::from_bool(line.total_weight() <= 1.0 + 1e-9)
        }
        let mut qc = QuickCheck::new().tests(1000);
        qc.quickcheck(implicit_total as fn(Vec<u8>) -> TestResult)
    }
}
