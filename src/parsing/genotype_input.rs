
use anyhow::Context;
use log::debug;
use std::io::Read;
use std::path::Path;

use crate::parsing::open_text_file;

/// Loads an uploaded genotype export from disk and returns only the data lines, tab-delimited.
/// The file may be gzip compressed.
/// # Arguments
/// * `filename` - path to the raw export
/// # Errors
/// * if the file cannot be opened or is not valid UTF-8
pub fn load_genotype_lines(filename: &Path) -> anyhow::Result<Vec<String>> {
    let mut text = String::new();
    open_text_file(filename)?
        .read_to_string(&mut text)
        .with_context(|| format!("Error while reading {filename:?}:"))?;

    let lines = filter_genotype_lines(&text);
    debug!("Extracted {} genotype lines from {filename:?}", lines.len());
    Ok(lines)
}

/// Splits an export into data lines and converts any CSV-style lines to tab-delimited.
/// Data lines are the ones starting with the record prefixes both vendors use ("rs" and "i");
/// comments, blank lines, and the Ancestry column header ("rsid ...") are dropped.
/// # Arguments
/// * `text` - the full text of the export
pub fn filter_genotype_lines(text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .filter(|line| line.starts_with("rs") || line.starts_with('i'))
        .filter(|line| !is_column_header(line))
        .map(|line| {
            if line.contains(',') {
                line.replace(',', "\t")
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// The Ancestry header shares the "rs" prefix with the data lines
fn is_column_header(line: &str) -> bool {
    line.split(['\t', ',']).next() == Some("rsid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_lines() {
        let text = "# This data file generated by 23andMe\r\n# rsid\tchromosome\tposition\tgenotype\r\nrs1\t1\t10\tAG\r\n\r\ni700\t1\t20\tCC\r\nrs3\tMT\t30\tA\r\n";
        let lines = filter_genotype_lines(text);
        assert_eq!(lines, vec![
            "rs1\t1\t10\tAG",
            "i700\t1\t20\tCC",
            "rs3\tMT\t30\tA"
        ]);
    }

    #[test]
    fn test_csv_conversion() {
        let text = "rsid,chromosome,position,allele1,allele2\nrs1,1,10,A,G\nrs2\t1\t11\tC\tC\n";
        let lines = filter_genotype_lines(text);
        assert_eq!(lines, vec![
            "rs1\t1\t10\tA\tG",
            "rs2\t1\t11\tC\tC"
        ]);
    }

    #[test]
    fn test_load_gzip_export() {
        let lines = load_genotype_lines(Path::new("test_data/genotypes/ancestry_chr1.txt.gz")).unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.split('\t').count() == 5));
    }
}
