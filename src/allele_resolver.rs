
/*!
Resolves array genotype calls into VCF-style ref/alt alleles and a GT code.
*/

use log::trace;

use crate::data_types::genotype::GenotypeRecord;
use crate::data_types::variants::{GenotypeCode, VariantRecord};
use crate::parsing::reference_index::IndexedFasta;

/// Outcome of resolving one genotype against its reference base
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The call is representable; alternate alleles and zygosity
    Resolved { alts: Vec<u8>, genotype_code: GenotypeCode },
    /// Two different non-reference alleles, which downstream tools cannot take
    MultiAllelic { alts: [u8; 2] }
}

/// Picks the candidate alternate alleles for a genotype given the reference base.
/// The candidate set always has 1 or 2 entries, each taken from the genotype.
/// # Arguments
/// * `ref_base` - the upper-case reference base at the site
/// * `genotype` - one or two called bases
pub fn candidate_alts(ref_base: u8, genotype: &[u8]) -> Vec<u8> {
    match *genotype {
        [allele] => vec![allele],
        [a0, a1] => {
            match (a0 == ref_base, a1 == ref_base) {
                // hom-ref still emits the reference base as the alt
                (true, true) => vec![a0],
                (true, false) => vec![a1],
                (false, true) => vec![a0],
                (false, false) => vec![a0, a1]
            }
        },
        _ => panic!("genotypes must have 1 or 2 bases, found {}", genotype.len())
    }
}

/// Resolves the alternate alleles and GT code for a genotype.
/// Hemizygous calls always resolve to GT "1", even if the call matches the reference.
/// # Arguments
/// * `ref_base` - the upper-case reference base at the site
/// * `genotype` - one or two called bases
pub fn resolve_alts(ref_base: u8, genotype: &[u8]) -> Resolution {
    let candidates = candidate_alts(ref_base, genotype);
    if genotype.len() == 1 {
        return Resolution::Resolved { alts: candidates, genotype_code: GenotypeCode::Hemizygous };
    }

    match candidates[..] {
        [alt] => Resolution::Resolved { alts: vec![alt], genotype_code: GenotypeCode::Heterozygous },
        [a0, a1] if a0 == a1 => Resolution::Resolved { alts: vec![a0], genotype_code: GenotypeCode::HomozygousAlternate },
        [a0, a1] => Resolution::MultiAllelic { alts: [a0, a1] },
        _ => unreachable!("candidate sets have 1 or 2 entries")
    }
}

/// Looks up the reference base for a record and converts it into a variant.
/// Returns `Ok(None)` when the site is multi-allelic and gets dropped.
/// # Arguments
/// * `record` - the parsed genotype call
/// * `reference` - the FASTA for the build the record is in
/// # Errors
/// * `CoreError::ReferenceLookup` if the site is not in the reference
/// * if the FASTA cannot be read
pub fn resolve_record(record: &GenotypeRecord, reference: &mut IndexedFasta) -> anyhow::Result<Option<VariantRecord>> {
    let ref_base = reference.fetch_base(record.chrom(), record.position())?;
    match resolve_alts(ref_base, record.genotype()) {
        Resolution::Resolved { alts, genotype_code } => {
            Ok(Some(VariantRecord::new(
                record.chrom().to_string(),
                // back to 1-based for the VCF
                record.position() + 1,
                record.rsid().to_string(),
                ref_base,
                alts,
                genotype_code
            )))
        },
        Resolution::MultiAllelic { alts } => {
            trace!(
                "Dropping multi-allelic site {} at {}:{} (ref {}, alts {}{})",
                record.rsid(), record.chrom(), record.position() + 1,
                ref_base as char, alts[0] as char, alts[1] as char
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::data_types::genotype::is_acgt;
    use crate::errors::CoreError;

    const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

    #[test]
    fn test_candidates_stay_in_alphabet() {
        for &ref_base in BASES.iter() {
            for &a0 in BASES.iter() {
                let single = candidate_alts(ref_base, &[a0]);
                assert_eq!(single, vec![a0]);
                for &a1 in BASES.iter() {
                    let candidates = candidate_alts(ref_base, &[a0, a1]);
                    assert!(!candidates.is_empty() && candidates.len() <= 2);
                    assert!(candidates.iter().all(|&b| is_acgt(b)));
                }
            }
        }
    }

    #[test]
    fn test_diploid_resolution() {
        // one side is ref
        assert_eq!(resolve_alts(b'A', b"AG"), Resolution::Resolved { alts: vec![b'G'], genotype_code: GenotypeCode::Heterozygous });
        assert_eq!(resolve_alts(b'A', b"GA"), Resolution::Resolved { alts: vec![b'G'], genotype_code: GenotypeCode::Heterozygous });
        // hom-alt
        assert_eq!(resolve_alts(b'A', b"GG"), Resolution::Resolved { alts: vec![b'G'], genotype_code: GenotypeCode::HomozygousAlternate });
        // two different alts
        assert_eq!(resolve_alts(b'A', b"CG"), Resolution::MultiAllelic { alts: [b'C', b'G'] });
        // hom-ref comes out as a het with alt == ref
        assert_eq!(resolve_alts(b'A', b"AA"), Resolution::Resolved { alts: vec![b'A'], genotype_code: GenotypeCode::Heterozygous });
    }

    #[test]
    fn test_hemizygous_resolution() {
        assert_eq!(resolve_alts(b'A', b"G"), Resolution::Resolved { alts: vec![b'G'], genotype_code: GenotypeCode::Hemizygous });
        assert_eq!(resolve_alts(b'A', b"A"), Resolution::Resolved { alts: vec![b'A'], genotype_code: GenotypeCode::Hemizygous });
    }

    #[test]
    fn test_resolve_record() {
        let mut fasta = IndexedFasta::open_with_default_index(Path::new("test_data/reference/mock_wrapped.fa")).unwrap();

        // position 0 of chr1 is A
        let record = GenotypeRecord::new("rs1".to_string(), "1", 0, "AC".to_string()).unwrap();
        let variant = resolve_record(&record, &mut fasta).unwrap().unwrap();
        assert_eq!(variant, VariantRecord::new("1".to_string(), 1, "rs1".to_string(), b'A', vec![b'C'], GenotypeCode::Heterozygous));

        let record = GenotypeRecord::new("rs2".to_string(), "1", 0, "CG".to_string()).unwrap();
        assert!(resolve_record(&record, &mut fasta).unwrap().is_none());

        // MT is normalized and the soft-masked base is upper-cased
        let record = GenotypeRecord::new("rs3".to_string(), "MT", 0, "T".to_string()).unwrap();
        let variant = resolve_record(&record, &mut fasta).unwrap().unwrap();
        assert_eq!(variant.chrom(), "M");
        assert_eq!(variant.ref_base(), b'C');
        assert_eq!(variant.genotype_code(), GenotypeCode::Hemizygous);

        let record = GenotypeRecord::new("rs4".to_string(), "7", 0, "AA".to_string()).unwrap();
        let error = resolve_record(&record, &mut fasta).unwrap_err();
        assert!(matches!(error.downcast_ref::<CoreError>(), Some(CoreError::ReferenceLookup { .. })));
    }
}
