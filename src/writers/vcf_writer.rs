
use anyhow::{anyhow, Context};
use log::{debug, trace};
use noodles::core::Position;
use noodles::vcf;
use noodles::vcf::header::record::value::{Map, map};
use noodles::vcf::variant::io::Write;
use noodles::vcf::variant::record::samples::keys::key as vcf_key;
use noodles::vcf::variant::record_buf;
use rustc_hash::FxHashSet as HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::data_types::variants::VariantRecord;

/// Value of the `##source` header line
pub const VCF_SOURCE: &str = "23andme_ancestryDNA_to_vcf";
/// The single sample column label
pub const SAMPLE_NAME: &str = "SAMPLE";

/// Writes resolved array calls to a minimal single-sample VCF.
/// Only the first record at each (chrom, pos) is written; the order of the input is kept.
pub struct VariantWriter {
    /// Where we are writing to
    out_fn: PathBuf,
    /// The static header, needed for every record write
    vcf_header: vcf::Header,
    /// The underlying writer, bgzip compressed for .gz outputs
    vcf_writer: vcf::io::Writer<Box<dyn std::io::Write>>,
    /// Sites that have already been written
    written_sites: HashSet<(String, u64)>,
    /// Number of records dropped as duplicates
    num_duplicates: usize
}

impl VariantWriter {
    /// Creates the output file and writes the header.
    /// # Arguments
    /// * `out_fn` - output path, compressed if it ends in .gz
    /// * `reference_label` - value for the `##reference` header line
    pub fn new(out_fn: &Path, reference_label: &str) -> anyhow::Result<Self> {
        let vcf_header = build_header(reference_label)?;

        let mut builder = vcf::io::writer::Builder::default();
        if out_fn.extension().unwrap_or_default() == "gz" {
            builder = builder.set_compression_method(vcf::io::CompressionMethod::Bgzf);
        }

        debug!("Opening {out_fn:?} for writing...");
        let mut vcf_writer = builder
            .build_from_path(out_fn)
            .with_context(|| format!("Error while creating {out_fn:?}:"))?;
        vcf_writer.write_header(&vcf_header)
            .with_context(|| format!("Error while writing header to {out_fn:?}:"))?;

        Ok(Self {
            out_fn: out_fn.to_path_buf(),
            vcf_header,
            vcf_writer,
            written_sites: Default::default(),
            num_duplicates: 0
        })
    }

    /// Writes a record unless its site was already written.
    /// Returns true if the record was written.
    pub fn write_variant(&mut self, variant: &VariantRecord) -> anyhow::Result<bool> {
        let (chrom, position) = variant.site_key();
        if !self.written_sites.insert((chrom.to_string(), position)) {
            trace!("Dropping duplicate site {chrom}:{position} for {}", variant.id());
            self.num_duplicates += 1;
            return Ok(false);
        }

        let ref_allele = (variant.ref_base() as char).to_string();
        let alternate_bases = record_buf::AlternateBases::from(
            variant.alt_bases().iter()
                .map(|&b| (b as char).to_string())
                .collect::<Vec<String>>()
        );
        let ids: record_buf::Ids = [variant.id().to_string()].into_iter().collect();

        let format_keys: record_buf::samples::Keys = [
            vcf_key::GENOTYPE.to_string()
        ].into_iter().collect();
        let values = vec![
            vec![
                Some(record_buf::samples::sample::Value::from(variant.genotype_code().as_ref()))
            ]
        ];
        let samples = record_buf::Samples::new(format_keys, values);

        let variant_start = Position::new(position as usize)
            .ok_or(anyhow!("VCF positions are 1-based, found 0 for {}", variant.id()))?;
        let record = vcf::variant::RecordBuf::builder()
            .set_reference_sequence_name(chrom)
            .set_variant_start(variant_start)
            .set_ids(ids)
            .set_reference_bases(ref_allele)
            .set_alternate_bases(alternate_bases)
            .set_samples(samples)
            .build();

        self.vcf_writer.write_variant_record(&self.vcf_header, &record)
            .with_context(|| format!("Error while writing to {:?}:", self.out_fn))?;
        Ok(true)
    }

    /// Flushes the output and returns (written, duplicates)
    pub fn finish(mut self) -> anyhow::Result<(usize, usize)> {
        self.vcf_writer.get_mut().flush()
            .with_context(|| format!("Error while flushing {:?}:", self.out_fn))?;
        let num_written = self.written_sites.len();
        debug!("Wrote {num_written} records to {:?}, skipped {} duplicates", self.out_fn, self.num_duplicates);
        Ok((num_written, self.num_duplicates))
    }
}

/// Builds the fixed header we put on converted array data
fn build_header(reference_label: &str) -> anyhow::Result<vcf::Header> {
    let mut vcf_header = vcf::Header::builder()
        .set_file_format(vcf::header::FileFormat::new(4, 2))
        .add_sample_name(SAMPLE_NAME)
        .build();

    vcf_header.formats_mut().insert(
        vcf_key::GENOTYPE.to_string(),
        Map::<map::Format>::new(map::format::Number::Count(1), map::format::Type::String, "Genotype")
    );
    vcf_header.insert("source".parse()?, vcf::header::record::Value::from(VCF_SOURCE.to_string()))?;
    vcf_header.insert("reference".parse()?, vcf::header::record::Value::from(reference_label.to_string()))?;
    Ok(vcf_header)
}

/// Convenience wrapper that writes a whole stream of variants and closes the file.
/// Returns the number of records written.
/// # Arguments
/// * `out_fn` - output path, compressed if it ends in .gz
/// * `reference_label` - value for the `##reference` header line
/// * `variants` - resolved records, in output order
pub fn write_variants<I>(out_fn: &Path, reference_label: &str, variants: I) -> anyhow::Result<usize>
where
    I: IntoIterator<Item = VariantRecord>
{
    let mut writer = VariantWriter::new(out_fn, reference_label)?;
    for variant in variants {
        writer.write_variant(&variant)?;
    }
    let (num_written, _num_duplicates) = writer.finish()?;
    Ok(num_written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::variants::GenotypeCode;
    use crate::parsing::read_lines;

    fn variant(chrom: &str, position: u64, id: &str, alts: &[u8], code: GenotypeCode) -> VariantRecord {
        VariantRecord::new(chrom.to_string(), position, id.to_string(), b'A', alts.to_vec(), code)
    }

    #[test]
    fn test_write_and_dedup() {
        let folder = tempfile::tempdir().unwrap();
        let out_fn = folder.path().join("converted.vcf");
        let variants = vec![
            variant("2", 10, "rs2", b"G", GenotypeCode::Heterozygous),
            variant("1", 5, "rs1", b"T", GenotypeCode::HomozygousAlternate),
            // same site, different allele
            variant("2", 10, "rs3", b"C", GenotypeCode::HomozygousAlternate),
            variant("X", 7, "rs4", b"C", GenotypeCode::Hemizygous)
        ];
        let num_written = write_variants(&out_fn, "GRCh37", variants).unwrap();
        assert_eq!(num_written, 3);

        let lines = read_lines(&out_fn).unwrap();
        assert_eq!(lines[0], "##fileformat=VCFv4.2");
        assert!(lines.contains(&"##source=23andme_ancestryDNA_to_vcf".to_string()));
        assert!(lines.contains(&"##reference=GRCh37".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("##FORMAT=<ID=GT")));

        let data_lines: Vec<&String> = lines.iter().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(data_lines, vec![
            "2\t10\trs2\tA\tG\t.\t.\t.\tGT\t0/1",
            "1\t5\trs1\tA\tT\t.\t.\t.\tGT\t1/1",
            "X\t7\trs4\tA\tC\t.\t.\t.\tGT\t1"
        ]);
        assert!(lines.contains(&"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE".to_string()));
    }

    #[test]
    fn test_compressed_output() {
        let folder = tempfile::tempdir().unwrap();
        let out_fn = folder.path().join("converted.vcf.gz");
        let variants = vec![variant("1", 5, "rs1", b"T", GenotypeCode::Heterozygous)];
        write_variants(&out_fn, "GRCh37", variants).unwrap();

        let raw_bytes = std::fs::read(&out_fn).unwrap();
        assert_eq!(&raw_bytes[..2], &[0x1f, 0x8b]);
        let lines = read_lines(&out_fn).unwrap();
        assert_eq!(lines.last().unwrap(), "1\t5\trs1\tA\tT\t.\t.\t.\tGT\t0/1");
    }
}
