/**
An evaluation owns everything a scoring run needs: the key, the sense hierarchy and the counters.
The inputs must be given in order: the key, then the sensemap, then the answers of the system.
*/
use crate::answers::{AnswerKey, AnswerLine, LineKind};
use crate::config::ScoreConfig;
use crate::hierarchy::SenseHierarchy;
use crate::reporter::{Summary, SummaryError, Tally};
use crate::scoring::{InstanceScore, Scorer};
use std::{
    error::Error,
    fmt::{self, Display},
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

#[derive(Debug)]
/// Errors that stop an evaluation. Problems limited to a single line are logged and skipped
/// instead.
pub enum EvaluationError {
    /// An input file could not be opened.
    Open { path: PathBuf, source: io::Error },
    /// An input could not be read.
    Read(io::Error),
    Summary(SummaryError),
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open {}: {}", path.display(), source)
            }
            Self::Read(source) => write!(f, "cannot read input: {}", source),
            Self::Summary(summary_err) => Display::fmt(summary_err, f),
        }
    }
}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Read(source) => Some(source),
            Self::Summary(summary_err) => Some(summary_err),
        }
    }
}

impl From<io::Error> for EvaluationError {
    fn from(value: io::Error) -> Self {
        Self::Read(value)
    }
}

impl From<SummaryError> for EvaluationError {
    fn from(value: SummaryError) -> Self {
        Self::Summary(value)
    }
}

/// Reads every line of `reader`, without its terminator. A line that is not valid UTF-8 is logged
/// and left out, the number of such lines is returned along with the others.
fn read_lines<R: BufRead>(reader: R) -> Result<(Vec<String>, usize), EvaluationError> {
    let mut lines = Vec::new();
    let mut rejected = 0;
    for bytes in reader.split(b'\n') {
        let mut bytes = bytes?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        match String::from_utf8(bytes) {
            Ok(line) => lines.push(line),
            Err(e) => {
                log::warn!(
                    "skipping a line that is not valid UTF-8: {}",
                    String::from_utf8_lossy(e.as_bytes())
                );
                rejected += 1;
            }
        }
    }
    Ok((lines, rejected))
}

fn open(path: &Path) -> Result<BufReader<File>, EvaluationError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| EvaluationError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// State of a scoring run.
///
/// # Example
/// ```rust
/// use sensescore::{Evaluation, Grain, ScoreConfigBuilder};
///
/// let config = ScoreConfigBuilder::default().grain(Grain::Mixed).build();
/// let mut evaluation = Evaluation::new(config);
/// evaluation.load_key("bank.n 1 bank%1\nbank.n 2 bank%2\n".as_bytes()).unwrap();
/// evaluation.load_sensemap("bank%1 2 bank%0\nbank%2 2 bank%0\n".as_bytes()).unwrap();
/// let scores = evaluation
///     .score_answers("bank.n 1 bank%1\nbank.n 2 bank%0\n".as_bytes())
///     .unwrap();
///
/// assert_eq!(scores[0].score, 1.0);
/// // `bank%0` subsumes the key and groups two senses.
/// assert_eq!(scores[1].score, 0.5);
/// let summary = evaluation.summary().unwrap();
/// assert_eq!(summary.precision, 0.75);
/// assert_eq!(summary.recall, 0.75);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    config: ScoreConfig,
    key: AnswerKey,
    hierarchy: SenseHierarchy,
    tally: Tally,
}

impl Evaluation {
    pub fn new(config: ScoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    pub fn hierarchy(&self) -> &SenseHierarchy {
        &self.hierarchy
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Reads the gold-standard key, one answer line per line.
    pub fn load_key<R: BufRead>(&mut self, reader: R) -> Result<(), EvaluationError> {
        let (lines, undecoded) = read_lines(reader)?;
        self.tally.lines_rejected += undecoded + self.key.add_lines(lines);
        self.tally.keyed_instances = self.key.keyed_instances();
        self.tally.key_weight = self.key.total_weight();
        log::info!(
            "key loaded: {} instances ({} distinct)",
            self.key.keyed_instances(),
            self.key.len()
        );
        Ok(())
    }

    /// Reads the sensemap. Must be called after the key and before the answers.
    pub fn load_sensemap<R: BufRead>(&mut self, reader: R) -> Result<(), EvaluationError> {
        let (lines, undecoded) = read_lines(reader)?;
        self.tally.lines_rejected += undecoded + self.hierarchy.add_lines(lines);
        log::info!("sensemap loaded: {} senses", self.hierarchy.len());
        Ok(())
    }

    /// Reads and scores the answers of the system. Every accepted line adds to the attempted
    /// weight, even when its instance is missing from the key. The scores of the instances found
    /// in the key are returned in input order.
    pub fn score_answers<R: BufRead>(
        &mut self,
        reader: R,
    ) -> Result<Vec<InstanceScore>, EvaluationError> {
        let (raw_lines, undecoded) = read_lines(reader)?;
        self.tally.lines_rejected += undecoded;
        let mut lines = Vec::new();
        for line in raw_lines {
            match AnswerLine::parse(&line, LineKind::System) {
                Ok(parsed) => {
                    self.tally.attempted_weight += parsed.attempted_weight();
                    self.tally.instances_handled += 1;
                    lines.push(parsed);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    self.tally.lines_rejected += 1;
                }
            }
        }

        let scorer = Scorer::new(&self.key, &self.hierarchy, self.config.grain());
        let results = scorer.score_all(&lines, self.config.parallel());
        let mut scores = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(score) => {
                    self.tally.score_sum += score.score;
                    self.tally.instances_scored += 1;
                    scores.push(score);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    self.tally.instances_unkeyed += 1;
                }
            }
        }
        log::info!(
            "{} answers scored, {} without key",
            self.tally.instances_scored,
            self.tally.instances_unkeyed
        );
        Ok(scores)
    }

    pub fn load_key_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EvaluationError> {
        self.load_key(open(path.as_ref())?)
    }

    pub fn load_sensemap_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EvaluationError> {
        self.load_sensemap(open(path.as_ref())?)
    }

    pub fn score_answers_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Vec<InstanceScore>, EvaluationError> {
        self.score_answers(open(path.as_ref())?)
    }

    pub fn summary(&self) -> Result<Summary, SummaryError> {
        self.tally.summary()
    }
}

/// Outcome of a complete run: the score of every keyed instance and the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub instances: Vec<InstanceScore>,
    pub tally: Tally,
    pub summary: Summary,
}

/// Runs a whole evaluation from files: the key is read first, then the sensemap and finally the
/// answers.
///
/// * `config`: Grain and options of the scoring.
/// * `answers`: Answers of the evaluated system.
/// * `key`: Gold-standard answers.
/// * `sensemap`: Sense hierarchy, possibly empty.
pub fn score_files<A, K, S>(
    config: ScoreConfig,
    answers: A,
    key: K,
    sensemap: S,
) -> Result<Report, EvaluationError>
where
    A: AsRef<Path>,
    K: AsRef<Path>,
    S: AsRef<Path>,
{
    let mut evaluation = Evaluation::new(config);
    evaluation.load_key_file(key)?;
    evaluation.load_sensemap_file(sensemap)?;
    let instances = evaluation.score_answers_file(answers)?;
    let summary = evaluation.summary()?;
    Ok(Report {
        instances,
        tally: *evaluation.tally(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreConfigBuilder;
    use crate::scoring::Grain;
    use rstest::rstest;

    fn run(grain: Grain, key: &str, sensemap: &str, answers: &str) -> Evaluation {
        let config = ScoreConfigBuilder::default().grain(grain).build();
        let mut evaluation = Evaluation::new(config);
        evaluation.load_key(key.as_bytes()).unwrap();
        evaluation.load_sensemap(sensemap.as_bytes()).unwrap();
        evaluation.score_answers(answers.as_bytes()).unwrap();
        evaluation
    }

    #[test]
    fn test_all_correct() {
        let evaluation = run(Grain::Fine, "w 1 a\nw 2 b\n", "", "w 1 a\nw 2 b\n");
        let summary = evaluation.summary().unwrap();
        assert_eq!(
            (summary.precision, summary.recall, summary.attempted),
            (1.0, 1.0, 100.0)
        );
    }

    #[test]
    fn test_half_correct() {
        let evaluation = run(Grain::Fine, "w 1 a\nw 2 b\n", "", "w 1 a\nw 2 a\n");
        let summary = evaluation.summary().unwrap();
        assert_eq!(
            (summary.precision, summary.recall, summary.attempted),
            (0.5, 0.5, 100.0)
        );
    }

    #[test]
    fn test_unkeyed_answers_still_count_as_attempted() {
        let evaluation = run(Grain::Fine, "w 1 a\nw 2 b\n", "", "w 1 a\nw 3 a\n");
        let tally = evaluation.tally();
        assert_eq!(tally.attempted_weight, 2.0);
        assert_eq!(tally.instances_handled, 2);
        assert_eq!(tally.instances_scored, 1);
        assert_eq!(tally.instances_unkeyed, 1);
        let summary = evaluation.summary().unwrap();
        assert_eq!((summary.precision, summary.recall), (0.5, 0.5));
    }

    #[test]
    fn test_rejected_lines_are_counted() {
        let evaluation = run(
            Grain::Fine,
            "w 1 a\n\nw 2\n",
            "b 2 a\nb x a\n",
            "w 1 a/x\nw 1 a\n",
        );
        let tally = evaluation.tally();
        assert_eq!(tally.lines_rejected, 4);
        assert_eq!(tally.keyed_instances, 1);
        assert_eq!(tally.attempted_weight, 1.0);
    }

    #[test]
    fn test_empty_key_fails_the_summary() {
        let evaluation = run(Grain::Fine, "", "", "w 1 a\n");
        assert!(matches!(
            evaluation.summary(),
            Err(SummaryError::DivisionByZero(_))
        ));
    }

    #[rstest]
    #[case(Grain::Fine, 0.0)]
    #[case(Grain::Mixed, 0.5)]
    #[case(Grain::Coarse, 1.0)]
    fn test_grains_on_coarser_answer(#[case] grain: Grain, #[case] expected: f64) {
        let evaluation = run(grain, "w 1 b\n", "b 2 a\nc 2 a\n", "w 1 a\n");
        assert_eq!(evaluation.tally().score_sum, expected);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_parallel_matches_sequential(#[case] parallel: bool) {
        let config = ScoreConfigBuilder::default()
            .grain(Grain::Coarse)
            .parallel(parallel)
            .build();
        let mut evaluation = Evaluation::new(config);
        let key: String = (0..200).map(|i| format!("w {} s{}\n", i, i % 7)).collect();
        let answers: String = (0..200).map(|i| format!("w {} s{}\n", i, i % 5)).collect();
        evaluation.load_key(key.as_bytes()).unwrap();
        evaluation.load_sensemap("s1 2 s0\ns2 2 s0\n".as_bytes()).unwrap();
        let scores = evaluation.score_answers(answers.as_bytes()).unwrap();
        let instances: Vec<_> = scores.iter().map(|s| s.instance.as_str()).collect();
        let expected: Vec<String> = (0..200).map(|i| i.to_string()).collect();
        assert_eq!(instances, expected);
    }

    #[test]
    fn test_lines_that_are_not_utf8_are_skipped() {
        let mut evaluation = Evaluation::new(ScoreConfig::default());
        evaluation
            .load_key(&b"w 1 a\r\na\xf1o.n 2 b\nw 3 c\n"[..])
            .unwrap();
        evaluation.load_sensemap(&b"b 2 \xff\nc 2 a\n"[..]).unwrap();
        evaluation
            .score_answers(&b"w 1 a\nw 2 \xe9\nw 3 a\n"[..])
            .unwrap();
        let tally = evaluation.tally();
        assert_eq!(tally.keyed_instances, 2);
        assert_eq!(tally.lines_rejected, 3);
        assert_eq!(tally.instances_handled, 2);
        assert_eq!(tally.score_sum, 1.0);
        assert!(evaluation.hierarchy().subsumes("a", "c"));
        assert!(!evaluation.hierarchy().is_known("b"));
    }

    #[test]
    fn test_missing_file() {
        let mut evaluation = Evaluation::new(ScoreConfig::default());
        let res = evaluation.load_key_file("this/file/does/not/exist");
        assert!(matches!(res, Err(EvaluationError::Open { .. })));
    }
}
