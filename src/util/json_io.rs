
use anyhow::Context;
use std::io::{BufReader, BufWriter, Write};
use std::fs::File;
use std::path::Path;

/// Helper function that loads a file into some type, helpful generic
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let fp: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(flate2::read::MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let result: T = serde_json::from_reader(BufReader::new(fp))
        .with_context(|| format!("Error while deserializing {filename:?}:"))?;
    Ok(result)
}

/// This will save a generic serializable struct to JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let file: Box<dyn std::io::Write> = if out_filename.extension().unwrap_or_default() == "gz" {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best()))
    } else {
        Box::new(file)
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::score_result::ScoreResult;
    use crate::errors::ErrorReport;

    #[test]
    fn test_score_result_json() {
        let folder = tempfile::tempdir().unwrap();
        let result = ScoreResult {
            chromosome: "22".to_string(),
            raw_score: 0.5,
            loadings: vec![1.0, -1.0],
            r2mean: Some(0.75),
            r2median: None,
            variants_scored: 3,
            adjusted_score: None,
            percentile: None
        };

        for filename in ["score.json", "score.json.gz"] {
            let out_fn = folder.path().join(filename);
            save_json(&result, &out_fn).unwrap();
            let loaded: ScoreResult = load_json(&out_fn).unwrap();
            assert_eq!(loaded, result);
        }

        // the external field names and the skipped optional fields
        let text = std::fs::read_to_string(folder.path().join("score.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["chr"], "22");
        assert_eq!(value["prs"], 0.5);
        assert!(value["r2median"].is_null());
        assert!(value.get("percentile").is_none());
    }

    #[test]
    fn test_error_report_json() {
        let folder = tempfile::tempdir().unwrap();
        let out_fn = folder.path().join("error.json");
        let report = ErrorReport { error: "FormatError".to_string(), message: "bad input".to_string() };
        save_json(&report, &out_fn).unwrap();
        assert_eq!(load_json::<ErrorReport>(&out_fn).unwrap(), report);

        assert!(load_json::<ErrorReport>(&folder.path().join("missing.json")).is_err());
    }
}
