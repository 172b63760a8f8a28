
use anyhow::Context;
use log::debug;
use noodles::bgzf;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Appends an extension to a path, e.g. `a.vcf` + `gz` -> `a.vcf.gz`
pub fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut appended = path.to_owned().into_os_string();
    appended.push(".");
    appended.push(extension);
    PathBuf::from(appended)
}

/// Wrapper that indexes a VCF file using noodles indexer, generating a .tbi file.
/// The VCF must already be bgzip compressed and sorted.
/// # Arguments
/// * `vcf_fn` - the filename to index
pub fn index_vcf(vcf_fn: &Path) -> anyhow::Result<PathBuf> {
    // first, build the index
    let index = noodles::vcf::fs::index(vcf_fn)
        .with_context(|| format!("Error while indexing {vcf_fn:?}:"))?;

    // write the index out to file
    let tbi_fn = append_extension(vcf_fn, "tbi");
    noodles::tabix::fs::write(&tbi_fn, &index)
        .with_context(|| format!("Error while writing {tbi_fn:?}:"))?;

    debug!("Wrote index to {tbi_fn:?}");
    Ok(tbi_fn)
}

/// Block-compresses a plain VCF next to the original (`<vcf_fn>.gz`).
/// # Arguments
/// * `vcf_fn` - the plain-text VCF
pub fn bgzip_file(vcf_fn: &Path) -> anyhow::Result<PathBuf> {
    let gz_fn = append_extension(vcf_fn, "gz");
    let mut reader = BufReader::new(
        File::open(vcf_fn).with_context(|| format!("Error while opening {vcf_fn:?}:"))?
    );
    let out_file = File::create(&gz_fn)
        .with_context(|| format!("Error while creating {gz_fn:?}:"))?;

    let mut bgzf_writer = bgzf::io::Writer::new(out_file);
    std::io::copy(&mut reader, &mut bgzf_writer)
        .with_context(|| format!("Error while compressing {vcf_fn:?}:"))?;
    let mut out_file = bgzf_writer.finish()
        .with_context(|| format!("Error while finalizing {gz_fn:?}:"))?;
    out_file.flush()?;

    debug!("Compressed {vcf_fn:?} to {gz_fn:?}");
    Ok(gz_fn)
}

/// Makes sure a VCF is bgzipped and tabix indexed, returning the path of the compressed file.
/// Already compressed files (.gz) are indexed in place.
/// # Arguments
/// * `vcf_fn` - the VCF, plain or compressed
pub fn compress_and_index(vcf_fn: &Path) -> anyhow::Result<PathBuf> {
    let gz_fn = if vcf_fn.extension().unwrap_or_default() == "gz" {
        vcf_fn.to_path_buf()
    } else {
        bgzip_file(vcf_fn)?
    };
    index_vcf(&gz_fn)?;
    Ok(gz_fn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::variants::{GenotypeCode, VariantRecord};
    use crate::parsing::read_lines;
    use crate::writers::vcf_writer::write_variants;

    #[test]
    fn test_append_extension() {
        assert_eq!(append_extension(Path::new("/tmp/input.vcf"), "gz"), PathBuf::from("/tmp/input.vcf.gz"));
        assert_eq!(append_extension(Path::new("phased.vcf.gz"), "tbi"), PathBuf::from("phased.vcf.gz.tbi"));
    }

    #[test]
    fn test_compress_and_index() {
        let folder = tempfile::tempdir().unwrap();
        let vcf_fn = folder.path().join("input.vcf");
        let variants = (1..=5_u64)
            .map(|i| VariantRecord::new("22".to_string(), i * 10, format!("rs{i}"), b'A', vec![b'G'], GenotypeCode::Heterozygous));
        write_variants(&vcf_fn, "GRCh37", variants).unwrap();

        let gz_fn = compress_and_index(&vcf_fn).unwrap();
        assert_eq!(gz_fn, folder.path().join("input.vcf.gz"));
        assert!(folder.path().join("input.vcf.gz.tbi").exists());
        assert_eq!(read_lines(&gz_fn).unwrap(), read_lines(&vcf_fn).unwrap());

        // indexing an already compressed file leaves it where it is
        std::fs::remove_file(folder.path().join("input.vcf.gz.tbi")).unwrap();
        assert_eq!(compress_and_index(&gz_fn).unwrap(), gz_fn);
        assert!(folder.path().join("input.vcf.gz.tbi").exists());
    }
}
