
use anyhow::{anyhow, ensure, Context};
use log::debug;
use rustc_hash::FxHashMap as HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::data_types::genotype::normalize_chrom;
use crate::errors::CoreError;

/// One row of a FASTA index (.fai)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReferenceIndexEntry {
    /// Byte offset of the first base of the sequence
    start_offset: u64,
    /// Number of bases in the sequence
    sequence_length: u64,
    /// Bases on each full line
    bases_per_line: u64,
    /// Bytes on each full line, including the line terminator
    bytes_per_line: u64
}

impl ReferenceIndexEntry {
    /// Constructor
    /// # Errors
    /// * if `bases_per_line` is 0 or larger than `bytes_per_line`
    pub fn new(start_offset: u64, sequence_length: u64, bases_per_line: u64, bytes_per_line: u64) -> anyhow::Result<Self> {
        ensure!(bases_per_line > 0, "bases per line must be > 0");
        ensure!(bytes_per_line >= bases_per_line, "bytes per line must be >= bases per line");
        Ok(Self {
            start_offset, sequence_length, bases_per_line, bytes_per_line
        })
    }

    /// Converts a 0-based position into a byte offset in the FASTA file, skipping over the line breaks.
    pub fn byte_offset(&self, position: u64) -> u64 {
        let full_lines = position / self.bases_per_line;
        let line_offset = position % self.bases_per_line;
        self.start_offset + full_lines * self.bytes_per_line + line_offset
    }

    // getters
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    pub fn sequence_length(&self) -> u64 {
        self.sequence_length
    }
}

/// A FASTA index loaded into memory, keyed by normalized chromosome name
#[derive(Clone, Debug, Default)]
pub struct ReferenceIndex {
    entries: HashMap<String, ReferenceIndexEntry>
}

impl ReferenceIndex {
    /// Loads a .fai file.
    /// # Arguments
    /// * `fai_fn` - path to the FASTA index
    pub fn from_fai(fai_fn: &Path) -> anyhow::Result<Self> {
        let file = File::open(fai_fn)
            .with_context(|| format!("Error while opening {fai_fn:?}:"))?;
        let index = Self::from_reader(file)
            .with_context(|| format!("Error while parsing {fai_fn:?}:"))?;
        debug!("Loaded {} index entries from {fai_fn:?}", index.entries.len());
        Ok(index)
    }

    /// Parses .fai content from any reader
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false) // no headers in the file, disable so we do not skip first row
            .flexible(true) // FASTQ indices carry a sixth column
            .quoting(false)
            .from_reader(reader);

        let mut entries: HashMap<String, ReferenceIndexEntry> = Default::default();
        for result in csv_reader.records() {
            let row = result?;
            ensure!(row.len() >= 5, "Expected 5 columns in index row, found {}: {row:?}", row.len());

            let parse_column = |index: usize| -> anyhow::Result<u64> {
                row[index].trim().parse::<u64>()
                    .with_context(|| format!("Error while parsing column {} of row: {row:?}", index + 1))
            };
            let sequence_length = parse_column(1)?;
            let start_offset = parse_column(2)?;
            let bases_per_line = parse_column(3)?;
            let bytes_per_line = parse_column(4)?;

            let chrom = normalize_chrom(&row[0]);
            let entry = ReferenceIndexEntry::new(start_offset, sequence_length, bases_per_line, bytes_per_line)
                .with_context(|| format!("Invalid index row for {chrom}"))?;
            entries.insert(chrom, entry);
        }

        Ok(Self {
            entries
        })
    }

    /// Computes the FASTA byte offset of a 0-based position.
    /// # Errors
    /// * if the chromosome is not in the index
    /// * if the position is past the end of the sequence
    pub fn byte_offset(&self, chrom: &str, position: u64) -> Result<u64, CoreError> {
        let entry = self.entries.get(chrom)
            .ok_or_else(|| CoreError::ReferenceLookup {
                chrom: chrom.to_string(),
                position,
                reason: "chromosome not found in index".to_string()
            })?;

        if position >= entry.sequence_length() {
            return Err(CoreError::ReferenceLookup {
                chrom: chrom.to_string(),
                position,
                reason: format!("position is past the sequence length of {}", entry.sequence_length())
            });
        }
        Ok(entry.byte_offset(position))
    }

    pub fn get(&self, chrom: &str) -> Option<&ReferenceIndexEntry> {
        self.entries.get(chrom)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A FASTA file opened for random access through its index.
/// Each request should open its own, the handle is not shared.
pub struct IndexedFasta {
    /// Source file, for error messages
    fasta_fn: PathBuf,
    /// The parsed .fai
    index: ReferenceIndex,
    /// Seekable handle on the FASTA
    reader: BufReader<File>,
    /// Where the reader currently sits, so nearby lookups can reuse the buffer
    reader_offset: u64,
    /// Total size of the FASTA in bytes
    file_length: u64
}

impl IndexedFasta {
    /// Opens a FASTA and its .fai index.
    /// # Arguments
    /// * `fasta_fn` - path to the uncompressed FASTA
    /// * `fai_fn` - path to the matching index
    pub fn open(fasta_fn: &Path, fai_fn: &Path) -> anyhow::Result<Self> {
        let index = ReferenceIndex::from_fai(fai_fn)?;
        let file = File::open(fasta_fn)
            .with_context(|| format!("Error while opening {fasta_fn:?}:"))?;
        let file_length = file.metadata()
            .with_context(|| format!("Error while reading metadata for {fasta_fn:?}:"))?
            .len();

        Ok(Self {
            fasta_fn: fasta_fn.to_path_buf(),
            index,
            reader: BufReader::new(file),
            reader_offset: 0,
            file_length
        })
    }

    /// Opens a FASTA, assuming the index sits next to it as `<fasta>.fai`
    pub fn open_with_default_index(fasta_fn: &Path) -> anyhow::Result<Self> {
        let mut fai_fn = fasta_fn.to_owned().into_os_string();
        fai_fn.push(".fai");
        Self::open(fasta_fn, &PathBuf::from(fai_fn))
    }

    /// Reads the single base at a 0-based position, upper-cased.
    /// # Arguments
    /// * `chrom` - normalized chromosome name
    /// * `position` - 0-based coordinate
    /// # Errors
    /// * `CoreError::ReferenceLookup` if the chromosome is missing or the offset is out of bounds
    /// * if the read itself fails
    pub fn fetch_base(&mut self, chrom: &str, position: u64) -> anyhow::Result<u8> {
        let offset = self.index.byte_offset(chrom, position)?;
        if offset >= self.file_length {
            return Err(CoreError::ReferenceLookup {
                chrom: chrom.to_string(),
                position,
                reason: format!("byte offset {offset} is beyond the end of {:?}", self.fasta_fn)
            }.into());
        }

        // array sites arrive sorted, so most jumps land inside the current buffer
        let jump = offset as i64 - self.reader_offset as i64;
        self.reader.seek_relative(jump)
            .with_context(|| format!("Error while seeking {:?} to offset {offset}", self.fasta_fn))?;
        self.reader_offset = offset;

        let mut buffer = [0_u8; 1];
        self.reader.read_exact(&mut buffer)
            .with_context(|| format!("Error while reading {:?} at offset {offset}", self.fasta_fn))?;
        self.reader_offset += 1;

        let base = buffer[0].to_ascii_uppercase();
        if !base.is_ascii_alphabetic() {
            return Err(anyhow!("Found {:?} at offset {offset} of {:?}; is the index stale?", base as char, self.fasta_fn));
        }
        Ok(base)
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 150 bases wrapped at 60, so lines are 61 bytes with the newline
    const MOCK_FAI: &str = "1\t150\t3\t60\t61\nMT\t20\t159\t60\t61\n";

    #[test]
    fn test_offsets() {
        let index = ReferenceIndex::from_reader(MOCK_FAI.as_bytes()).unwrap();
        assert_eq!(index.len(), 2);

        // line start, line end, and the first base after a line break
        assert_eq!(index.byte_offset("1", 0).unwrap(), 3);
        assert_eq!(index.byte_offset("1", 59).unwrap(), 62);
        assert_eq!(index.byte_offset("1", 60).unwrap(), 64);
        assert_eq!(index.byte_offset("1", 125).unwrap(), 3 + 2 * 61 + 5);

        // MT is normalized to M
        assert_eq!(index.byte_offset("M", 0).unwrap(), 159);
        assert!(index.get("MT").is_none());
    }

    #[test]
    fn test_lookup_errors() {
        let index = ReferenceIndex::from_reader(MOCK_FAI.as_bytes()).unwrap();
        assert!(matches!(index.byte_offset("2", 0), Err(CoreError::ReferenceLookup { .. })));
        assert!(matches!(index.byte_offset("1", 150), Err(CoreError::ReferenceLookup { .. })));
    }

    #[test]
    fn test_bad_index() {
        assert!(ReferenceIndex::from_reader("1\t150\t3\t60\n".as_bytes()).is_err());
        assert!(ReferenceIndex::from_reader("1\t150\t3\t0\t1\n".as_bytes()).is_err());
        assert!(ReferenceIndex::from_reader("1\tabc\t3\t60\t61\n".as_bytes()).is_err());
    }

    #[test]
    fn test_fetch_bases() {
        let mut fasta = IndexedFasta::open_with_default_index(Path::new("test_data/reference/mock_wrapped.fa")).unwrap();

        // line 1 is ACGT repeated, line 2 is all T, line 3 is all G
        assert_eq!(fasta.fetch_base("1", 0).unwrap(), b'A');
        assert_eq!(fasta.fetch_base("1", 59).unwrap(), b'T');
        assert_eq!(fasta.fetch_base("1", 60).unwrap(), b'T');
        assert_eq!(fasta.fetch_base("1", 120).unwrap(), b'G');
        // lower-case (soft-masked) bases come back upper-cased
        assert_eq!(fasta.fetch_base("M", 0).unwrap(), b'C');

        let error = fasta.fetch_base("1", 1000).unwrap_err();
        assert!(matches!(error.downcast_ref::<CoreError>(), Some(CoreError::ReferenceLookup { .. })));
        let error = fasta.fetch_base("22", 0).unwrap_err();
        assert!(matches!(error.downcast_ref::<CoreError>(), Some(CoreError::ReferenceLookup { .. })));
    }

    #[test]
    fn test_fetch_order_independent() {
        let mut fasta = IndexedFasta::open_with_default_index(Path::new("test_data/reference/mock_wrapped.fa")).unwrap();

        // backwards, repeated, and across contigs
        let lookups = [("M", 3, b'T'), ("1", 120, b'G'), ("1", 2, b'G'), ("1", 2, b'G'), ("1", 1, b'C'), ("M", 0, b'C'), ("1", 0, b'A')];
        for (chrom, position, expected) in lookups.into_iter() {
            assert_eq!(fasta.fetch_base(chrom, position).unwrap(), expected, "{chrom}:{position}");
        }
    }

    #[test]
    fn test_stale_index() {
        let folder = tempfile::tempdir().unwrap();
        let fasta_fn = folder.path().join("short.fa");
        let fai_fn = folder.path().join("short.fa.fai");

        // the index claims 1000 bases but the file only holds 10
        std::fs::write(&fasta_fn, ">1\nACGTACGTAC\n").unwrap();
        std::fs::write(&fai_fn, "1\t1000\t3\t10\t11\n").unwrap();

        let mut fasta = IndexedFasta::open(&fasta_fn, &fai_fn).unwrap();
        assert_eq!(fasta.fetch_base("1", 9).unwrap(), b'C');
        let error = fasta.fetch_base("1", 500).unwrap_err();
        match error.downcast_ref::<CoreError>() {
            Some(CoreError::ReferenceLookup { chrom, position, reason }) => {
                assert_eq!(chrom, "1");
                assert_eq!(*position, 500);
                assert!(reason.contains("byte offset 553"));
            },
            other => panic!("unexpected error: {other:?}")
        }
    }
}
