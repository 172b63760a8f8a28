
use log::trace;
use serde::Serialize;
use std::iter::Peekable;

use crate::data_types::genotype::{GenotypeRecord, MISSING_CALL};
use crate::errors::CoreError;

/// The vendor export dialects we support, told apart by their column count
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum_macros::Display)]
pub enum GenotypeDialect {
    /// rsid, chrom, pos, allele1, allele2
    #[strum(serialize = "AncestryDNA")]
    Ancestry,
    /// rsid, chrom, pos, genotype
    #[strum(serialize = "23andMe")]
    TwentyThreeAndMe
}

impl GenotypeDialect {
    /// Picks the dialect from the first data line.
    /// # Arguments
    /// * `first_line` - the first tab-delimited data line of the input
    /// # Errors
    /// * if the line has neither 4 nor 5 columns
    pub fn detect(first_line: &str) -> Result<Self, CoreError> {
        let num_columns = first_line.split('\t').count();
        match num_columns {
            4 => Ok(GenotypeDialect::TwentyThreeAndMe),
            5 => Ok(GenotypeDialect::Ancestry),
            nc => Err(CoreError::Format {
                message: format!("unexpected number of columns in first data line: {nc}")
            })
        }
    }

    /// Number of tab-delimited columns in this dialect
    pub fn num_columns(&self) -> usize {
        match self {
            GenotypeDialect::Ancestry => 5,
            GenotypeDialect::TwentyThreeAndMe => 4
        }
    }

    /// Parses a single data line.
    /// Returns `Ok(None)` for rows that are skipped: blank lines, no-calls, and non-ACGT genotypes.
    /// # Arguments
    /// * `line` - a tab-delimited data line
    /// # Errors
    /// * if the column count does not match this dialect
    /// * if the position is not a positive integer
    pub fn parse_line(&self, line: &str) -> Result<Option<GenotypeRecord>, CoreError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != self.num_columns() {
            return Err(CoreError::Format {
                message: format!("expected {} columns for {self} input, found {}: {line:?}", self.num_columns(), columns.len())
            });
        }

        let rsid = columns[0];
        let chrom = columns[1];
        // positions are 1-based in the exports
        let position = columns[2].parse::<u64>().ok()
            .and_then(|p| p.checked_sub(1))
            .ok_or_else(|| CoreError::Format {
                message: format!("invalid position {:?} for {rsid}", columns[2])
            })?;
        let genotype = match self {
            GenotypeDialect::Ancestry => format!("{}{}", columns[3], columns[4]),
            GenotypeDialect::TwentyThreeAndMe => columns[3].to_string()
        };

        if genotype == MISSING_CALL {
            trace!("Skipping no-call for {rsid}");
            return Ok(None);
        }

        match GenotypeRecord::new(rsid.to_string(), chrom, position, genotype) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                trace!("Skipping row: {e}");
                Ok(None)
            }
        }
    }
}

/// Lazily converts raw data lines into genotype records.
/// Rows that fail genotype validation are skipped; structural problems are yielded as errors.
pub struct GenotypeParser<I: Iterator> {
    /// The dialect detected from the first line
    dialect: GenotypeDialect,
    /// Remaining lines
    lines: Peekable<I>
}

impl<I> GenotypeParser<I>
where
    I: Iterator,
    I::Item: AsRef<str>
{
    /// Creates a parser, detecting the dialect from the first line.
    /// # Arguments
    /// * `lines` - data lines, already filtered and tab-delimited
    /// # Errors
    /// * if there are no lines
    /// * if the first line does not match a known dialect
    pub fn new<T: IntoIterator<IntoIter = I>>(lines: T) -> Result<Self, CoreError> {
        let mut lines = lines.into_iter().peekable();
        let dialect = match lines.peek() {
            Some(first_line) => GenotypeDialect::detect(first_line.as_ref())?,
            None => return Err(CoreError::Format { message: "genotype input is empty".to_string() })
        };

        Ok(Self {
            dialect,
            lines
        })
    }

    pub fn dialect(&self) -> GenotypeDialect {
        self.dialect
    }
}

impl<I> Iterator for GenotypeParser<I>
where
    I: Iterator,
    I::Item: AsRef<str>
{
    type Item = Result<GenotypeRecord, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match self.dialect.parse_line(line.as_ref()) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {},
                Err(e) => return Some(Err(e))
            }
        }
        None
    }
}
