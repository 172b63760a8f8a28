
use log::debug;
use rustc_hash::FxHashSet as HashSet;
use std::path::Path;

use crate::parsing::read_lines;

/// The set of `rsid:chrom:pos` loci that are valid for one reference build
#[derive(Clone, Debug, Default)]
pub struct LocusWhitelist {
    loci: HashSet<String>
}

impl LocusWhitelist {
    /// Loads a newline-delimited whitelist, which may be gzip compressed.
    /// # Arguments
    /// * `filename` - path to the whitelist
    pub fn from_path(filename: &Path) -> anyhow::Result<Self> {
        let lines = read_lines(filename)?;
        let whitelist = Self::from_lines(lines);
        debug!("Loaded {} whitelisted loci from {filename:?}", whitelist.len());
        Ok(whitelist)
    }

    /// Builds a whitelist from in-memory keys; surrounding whitespace and blank lines are ignored
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        let loci = lines.into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self { loci }
    }

    /// Counts how many of the provided keys are in the whitelist
    pub fn count_matches(&self, keys: &HashSet<String>) -> usize {
        keys.iter()
            .filter(|k| self.loci.contains(*k))
            .count()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.loci.contains(key)
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_matching() {
        let whitelist = LocusWhitelist::from_lines(["rs1:1:10", "rs2:1:20 ", "", "rs3:1:30"]);
        assert_eq!(whitelist.len(), 3);
        assert!(whitelist.contains("rs2:1:20"));

        let keys: HashSet<String> = ["rs1:1:10", "rs2:1:21", "rs3:1:30"].iter().map(|s| s.to_string()).collect();
        assert_eq!(whitelist.count_matches(&keys), 2);
    }
}
