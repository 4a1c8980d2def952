/*
 * Helpers for the tools that turn annotated documents into the flat files read by the scorer.
 * Reading the annotated documents is left to those tools: they hand over, for every annotated
 * term, the external references attached to it.
*/
use std::{
    error::Error,
    fmt::{self, Display},
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::Path,
    str::FromStr,
};

/// Name of the gold-standard file created by `AnswerFileWriter::create_in`.
pub const GOLD_FILENAME: &str = "gold";
/// Name of the system answers file created by `AnswerFileWriter::create_in`.
pub const SYSTEM_FILENAME: &str = "system";
/// Name of the (empty) sensemap created by `AnswerFileWriter::create_in`.
pub const SENSEMAP_FILENAME: &str = "sense_mappings";

/// Confidence attached to an external reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    /// The reference was given without a confidence value (`U`).
    Unweighted,
    Value(f64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceParsingError(String);

impl Display for ConfidenceParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not parse the {} into a confidence. Expected `U` or a number",
            self.0
        )
    }
}

impl Error for ConfidenceParsingError {}

impl FromStr for Confidence {
    type Err = ConfidenceParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "U" => Ok(Confidence::Unweighted),
            other => other
                .parse()
                .map(Confidence::Value)
                .map_err(|_| ConfidenceParsingError(String::from(s))),
        }
    }
}

/// A sense given to a term by some resource (a gold annotator or a system).
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalReference {
    /// Label of the resource that produced the reference.
    pub resource: String,
    /// The sense identifier.
    pub reference: String,
    pub confidence: Confidence,
}

impl ExternalReference {
    pub fn new<R, S>(resource: R, reference: S, confidence: Confidence) -> Self
    where
        R: Into<String>,
        S: Into<String>,
    {
        Self {
            resource: resource.into(),
            reference: reference.into(),
            confidence,
        }
    }
}

/// Picks the reference with the highest confidence. Ties go to the first reference. The first
/// unweighted reference met is returned right away, with a weight of 0.
pub fn best_reference<'a, I>(references: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a ExternalReference>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for reference in references {
        match reference.confidence {
            Confidence::Unweighted => return Some((reference.reference.as_str(), 0.0)),
            Confidence::Value(value) => {
                if best.map_or(true, |(_, best_value)| value > best_value) {
                    best = Some((reference.reference.as_str(), value));
                }
            }
        }
    }
    best
}

/// Writes the gold and system answer lines of annotated terms.
///
/// Each term whose references include the gold resource produces one gold line, and one system
/// line when the system resource annotated it too. The document name is used as the item and the
/// term identifier as the instance.
pub struct AnswerFileWriter<G: Write, S: Write> {
    gold: G,
    system: S,
    gold_resource: String,
    system_resource: String,
}

impl<G: Write, S: Write> AnswerFileWriter<G, S> {
    pub fn new<L: Into<String>, M: Into<String>>(
        gold: G,
        system: S,
        gold_resource: L,
        system_resource: M,
    ) -> Self {
        Self {
            gold,
            system,
            gold_resource: gold_resource.into(),
            system_resource: system_resource.into(),
        }
    }

    /// Writes the lines of a term. Returns `false` when the term has no gold reference, in which
    /// case nothing is written.
    pub fn write_term(
        &mut self,
        document: &str,
        term_id: &str,
        references: &[ExternalReference],
    ) -> io::Result<bool> {
        let gold = best_reference(
            references
                .iter()
                .filter(|r| r.resource == self.gold_resource),
        );
        let Some((gold_sense, _)) = gold else {
            return Ok(false);
        };
        writeln!(self.gold, "{}\t{}\t{}", document, term_id, gold_sense)?;
        let system = best_reference(
            references
                .iter()
                .filter(|r| r.resource == self.system_resource),
        );
        if let Some((system_sense, _)) = system {
            writeln!(self.system, "{}\t{}\t{}", document, term_id, system_sense)?;
        }
        Ok(true)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.gold.flush()?;
        self.system.flush()
    }

    pub fn into_inner(self) -> (G, S) {
        (self.gold, self.system)
    }
}

impl AnswerFileWriter<BufWriter<File>, BufWriter<File>> {
    /// Opens (in append mode) the gold and system files of `dir`, and creates an empty sensemap
    /// next to them so that the scorer always has one to read.
    pub fn create_in<L: Into<String>, M: Into<String>>(
        dir: &Path,
        gold_resource: L,
        system_resource: M,
    ) -> io::Result<Self> {
        let append = |name: &str| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(name))
                .map(BufWriter::new)
        };
        let gold = append(GOLD_FILENAME)?;
        let system = append(SYSTEM_FILENAME)?;
        write_empty_sensemap(&dir.join(SENSEMAP_FILENAME))?;
        Ok(Self::new(gold, system, gold_resource, system_resource))
    }
}

/// Creates (or truncates) a sensemap without any entry.
pub fn write_empty_sensemap(path: &Path) -> io::Result<()> {
    File::create(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reference(resource: &str, sense: &str, confidence: &str) -> ExternalReference {
        ExternalReference::new(resource, sense, confidence.parse().unwrap())
    }

    #[rstest]
    #[case("U", Confidence::Unweighted)]
    #[case("0.8", Confidence::Value(0.8))]
    #[case(" 1 ", Confidence::Value(1.0))]
    fn test_confidence_from_str(#[case] raw: &str, #[case] expected: Confidence) {
        assert_eq!(raw.parse::<Confidence>(), Ok(expected));
    }

    #[test]
    fn test_confidence_from_str_error() {
        assert!("high".parse::<Confidence>().is_err());
    }

    #[test]
    fn test_best_reference() {
        let refs = vec![
            reference("wn", "a", "0.2"),
            reference("wn", "b", "0.7"),
            reference("wn", "c", "0.7"),
        ];
        assert_eq!(best_reference(&refs), Some(("b", 0.7)));
    }

    #[test]
    fn test_best_reference_unweighted() {
        let refs = vec![
            reference("wn", "a", "0.9"),
            reference("wn", "b", "U"),
            reference("wn", "c", "U"),
        ];
        assert_eq!(best_reference(&refs), Some(("b", 0.0)));
    }

    #[test]
    fn test_best_reference_empty() {
        let refs: Vec<ExternalReference> = vec![];
        assert_eq!(best_reference(&refs), None);
    }

    #[test]
    fn test_write_term() {
        let mut writer = AnswerFileWriter::new(Vec::new(), Vec::new(), "gold", "ukb");
        let refs = vec![
            reference("gold", "bank%1", "1.0"),
            reference("ukb", "bank%2", "0.3"),
            reference("ukb", "bank%1", "0.6"),
            reference("other", "bank%3", "0.9"),
        ];
        assert!(writer.write_term("doc.naf", "t1", &refs).unwrap());
        let only_system = vec![reference("ukb", "bank%1", "0.6")];
        assert!(!writer.write_term("doc.naf", "t2", &only_system).unwrap());
        let only_gold = vec![reference("gold", "river%1", "U")];
        assert!(writer.write_term("doc.naf", "t3", &only_gold).unwrap());

        let (gold, system) = writer.into_inner();
        assert_eq!(
            String::from_utf8(gold).unwrap(),
            "doc.naf\tt1\tbank%1\ndoc.naf\tt3\triver%1\n"
        );
        assert_eq!(String::from_utf8(system).unwrap(), "doc.naf\tt1\tbank%1\n");
    }
}
