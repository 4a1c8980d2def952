/**
The sense hierarchy is read from a sensemap. Each line of a sensemap either declares a sense on
its own, or declares a chain of subsumptions:

`<subsumee> <count> <subsumer> [<count> <subsumer> ...]`

The count is the number of senses grouped under the subsumer. It is used to split the credit
given to an answer that is coarser than the key.
*/
use ahash::{HashMap as AHashMap, HashSet as AHashSet};
use std::{
    error::Error,
    fmt::{self, Display},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A sensemap line contained at least one unusable subsumption entry. The usable entries of the
/// line are still recorded.
pub struct SenseMapError {
    pub line: String,
    pub rejected: usize,
}

impl Display for SenseMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bad subsumption table entry: '{}' ({} entr{} ignored)",
            self.line,
            self.rejected,
            if self.rejected == 1 { "y" } else { "ies" }
        )
    }
}

impl Error for SenseMapError {}

/// Subsumption relations between senses.
///
/// The transitive closure of `subsumed` is computed when the entries are added: a subsumer
/// inherits what its subsumee subsumes *at that moment*. Senses added under the subsumee later on
/// are not propagated, so the order of the sensemap lines matters.
#[derive(Debug, Clone, Default)]
pub struct SenseHierarchy {
    /// sense -> direct subsumers, in insertion order
    subsumed_by: AHashMap<String, Vec<String>>,
    /// sense -> senses it subsumes, accumulated at insertion time
    subsuming: AHashMap<String, Vec<String>>,
    /// subsumer -> declared number of subsumed senses
    branch_factors: AHashMap<String, u32>,
    known: AHashSet<String>,
}

impl SenseHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a hierarchy from the lines of a sensemap. Bad entries are logged and skipped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hierarchy = Self::new();
        hierarchy.add_lines(lines);
        hierarchy
    }

    /// Records every line of a sensemap. Lines with bad entries are logged, their number is
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

    /// Records a sense without any subsumption relation.
    pub fn declare(&mut self, sense: &str) {
        if !self.known.contains(sense) {
            self.known.insert(sense.to_string());
        }
    }

    /// Records that `subsumer` subsumes `subsumee` and that `subsumer` groups `count` senses.
    pub fn add_entry(&mut self, subsumee: &str, count: u32, subsumer: &str) {
        self.declare(subsumee);
        self.declare(subsumer);
        self.subsumed_by
            .entry(subsumee.to_string())
            .or_default()
            .push(subsumer.to_string());
        self.branch_factors.insert(subsumer.to_string(), count);
        let subsumed = self.subsuming.entry(subsumer.to_string()).or_default();
        if !subsumed.iter().any(|s| s == subsumee) {
            subsumed.push(subsumee.to_string());
        }
        // Read after the push so that a self subsumption sees its own entry.
        let inherited = self.subsuming.get(subsumee).cloned().unwrap_or_default();
        if let Some(subsumed) = self.subsuming.get_mut(subsumer) {
            for sense in inherited {
                if !subsumed.contains(&sense) {
                    subsumed.push(sense);
                }
            }
        }
    }

    /// Parses a sensemap line and records its entries. Entries are read left to right; an entry
    /// with a count that is not a non-negative integer, or without a subsumer, is skipped and the
    /// following entries are still read.
    pub fn add_line(&mut self, line: &str) -> Result<(), SenseMapError> {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        if tokens.len() == 1 {
            self.declare(tokens[0]);
            return Ok(());
        }
        let mut rejected = 0;
        for i in (0..tokens.len().saturating_sub(1)).step_by(2) {
            let subsumee = tokens[i];
            let count = tokens[i + 1].parse::<u32>();
            match (count, tokens.get(i + 2)) {
                (Ok(count), Some(subsumer)) => self.add_entry(subsumee, count, subsumer),
                _ => rejected += 1,
            }
        }
        if rejected > 0 {
            return Err(SenseMapError {
                line: line.trim().to_string(),
                rejected,
            });
        }
        Ok(())
    }

    /// Direct subsumers of `sense`.
    pub fn subsumers(&self, sense: &str) -> &[String] {
        self.subsumed_by
            .get(sense)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Senses subsumed by `sense`, directly or through the subsumers recorded before it. Each
    /// sense is listed once.
    pub fn subsumed(&self, sense: &str) -> &[String] {
        self.subsuming
            .get(sense)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Does `ancestor` subsume `sense`?
    pub fn subsumes(&self, ancestor: &str, sense: &str) -> bool {
        self.subsumed(ancestor).iter().any(|s| s == sense)
    }

    /// Declared number of senses grouped under `sense`, if `sense` subsumes anything.
    pub fn branch_factor(&self, sense: &str) -> Option<u32> {
        self.branch_factors.get(sense).copied()
    }

    /// The group of a sense: the sense itself and everything reachable by following the
    /// subsumed-by relation. Cycles in the sensemap are visited once.
    pub fn group<'a>(&'a self, sense: &'a str) -> AHashSet<&'a str> {
        let mut group = AHashSet::default();
        let mut stack = vec![sense];
        while let Some(current) = stack.pop() {
            if !group.insert(current) {
                continue;
            }
            stack.extend(self.subsumers(current).iter().map(String::as_str));
        }
        group
    }

    pub fn is_known(&self, sense: &str) -> bool {
        self.known.contains(sense)
    }

    /// Number of distinct senses mentioned by the sensemap.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
