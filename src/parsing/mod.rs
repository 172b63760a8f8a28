/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Parses vendor genotype lines into normalized records
pub mod genotype_parser;
/// Loads an uploaded genotype export and isolates the data lines
pub mod genotype_input;
/// Reader for imputed VCF files, with dosage and R2 extraction
pub mod imputed_vcf;
/// Per-build sets of valid `rsid:chrom:pos` loci
pub mod locus_whitelist;
/// Population reference tables used for calibration
pub mod population_model;
/// FASTA index parsing and random-access base lookup
pub mod reference_index;
/// Light-weight scans over VCF files (counts, chromosome checks)
pub mod vcf_summary;
/// SNP effect-size tables
pub mod weights;

use anyhow::{anyhow, Context};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Wrapper function that handles both gzip compressed and uncompressed text files.
/// BGZF files are multi-member gzip, so they open fine here as well.
/// # Arguments
/// * `filename` - path to the file to open
pub fn open_text_file(filename: &Path) -> anyhow::Result<BufReader<Box<dyn Read>>> {
    let mut file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;

    // sniff the gzip magic instead of trusting the extension
    let mut magic = [0_u8; 2];
    let num_read = file.read(&mut magic)
        .with_context(|| format!("Error while reading {filename:?}:"))?;
    let prefix = std::io::Cursor::new(magic[..num_read].to_vec());
    let chained = prefix.chain(file);

    let reader: Box<dyn Read> = if num_read == 2 && magic == [0x1f, 0x8b] {
        Box::new(flate2::read::MultiGzDecoder::new(chained))
    } else {
        Box::new(chained)
    };
    Ok(BufReader::new(reader))
}

/// Reads every line of a (possibly gzipped) text file into memory.
/// # Arguments
/// * `filename` - path to the file to read
pub fn read_lines(filename: &Path) -> anyhow::Result<Vec<String>> {
    open_text_file(filename)?
        .lines()
        .collect::<std::io::Result<Vec<String>>>()
        .with_context(|| format!("Error while reading lines from {filename:?}:"))
}

/// A small in-memory tab-delimited table with a header row.
/// Tables written by R may carry an unnamed row-name column, so data rows are allowed to have
/// one more field than the header; the columns are then aligned from the right.
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// Column labels from the header row
    headers: Vec<String>,
    /// Data rows, already aligned to `headers`
    rows: Vec<Vec<String>>
}

impl Table {
    /// Loads a tab-delimited table from disk.
    /// # Arguments
    /// * `filename` - path to the .tsv/.txt(.gz) file
    /// # Errors
    /// * if the file cannot be read
    /// * if a row has fewer fields than the header, or more than one extra
    pub fn from_path(filename: &Path) -> anyhow::Result<Self> {
        let reader = open_text_file(filename)?;
        Self::from_reader(reader)
            .with_context(|| format!("Error while parsing table {filename:?}:"))
    }

    /// Parses a tab-delimited table from any reader
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true) // row-name columns make rows wider than the header
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = vec![];
        for (row_index, result) in csv_reader.records().enumerate() {
            let row = result?;
            let extra = row.len().checked_sub(headers.len())
                .filter(|&e| e <= 1)
                .ok_or(anyhow!("Row {} has {} fields, expected {}", row_index + 1, row.len(), headers.len()))?;
            rows.push(row.iter().skip(extra).map(|v| v.to_string()).collect());
        }

        Ok(Self {
            headers,
            rows
        })
    }

    /// Returns all values in the named column
    pub fn column(&self, name: &str) -> anyhow::Result<Vec<&str>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[index].as_str()).collect())
    }

    /// Returns all values in the named column, parsed as floats
    pub fn float_column(&self, name: &str) -> anyhow::Result<Vec<f64>> {
        self.column(name)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.trim().parse::<f64>()
                    .with_context(|| format!("Non-numeric value {v:?} in column {name:?}, row {}", i + 1))
            })
            .collect()
    }

    fn column_index(&self, name: &str) -> anyhow::Result<usize> {
        self.headers.iter()
            .position(|h| h == name)
            .ok_or(anyhow!("Column {name:?} not found in header: {:?}", self.headers))
    }

    // getters
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}
