
/// Zygosity encodings we can emit for a resolved array call
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::AsRefStr)]
pub enum GenotypeCode {
    /// One reference and one alternate allele
    #[strum(serialize = "0/1")]
    Heterozygous,
    /// Two copies of the same alternate allele
    #[strum(serialize = "1/1")]
    HomozygousAlternate,
    /// A single allele; sex chromosomes and mitochondria
    #[strum(serialize = "1")]
    Hemizygous
}

/// A resolved variant call, ready to go into a VCF.
/// QUAL, FILTER, and INFO are always missing and FORMAT is always GT, so they are not stored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantRecord {
    /// Chromosome label
    chrom: String,
    /// The coordinate of the event in the VCF file, 1-based
    position: u64,
    /// The record identifier, usually an rsID
    id: String,
    /// The single reference base
    ref_base: u8,
    /// Ordered alternate alleles, each a single base
    alt_bases: Vec<u8>,
    /// The GT value for the sample column
    genotype_code: GenotypeCode
}

impl VariantRecord {
    /// Constructor
    /// # Arguments
    /// * `chrom` - the chromosome label
    /// * `position` - 1-based coordinate
    /// * `id` - record identifier
    /// * `ref_base` - the reference base at `position`
    /// * `alt_bases` - the alternate alleles, 1 or 2 entries
    /// * `genotype_code` - zygosity encoding
    pub fn new(chrom: String, position: u64, id: String, ref_base: u8, alt_bases: Vec<u8>, genotype_code: GenotypeCode) -> Self {
        assert!(!alt_bases.is_empty() && alt_bases.len() <= 2);
        Self {
            chrom, position, id, ref_base, alt_bases, genotype_code
        }
    }

    /// The (chrom, pos) pair we deduplicate on
    pub fn site_key(&self) -> (&str, u64) {
        (&self.chrom, self.position)
    }

    /// Renders the ALT column, comma-separated if there are multiple
    pub fn alt_string(&self) -> String {
        self.alt_bases.iter()
            .map(|&b| (b as char).to_string())
            .collect::<Vec<String>>()
            .join(",")
    }

    // getters
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ref_base(&self) -> u8 {
        self.ref_base
    }

    pub fn alt_bases(&self) -> &[u8] {
        &self.alt_bases
    }

    pub fn genotype_code(&self) -> GenotypeCode {
        self.genotype_code
    }
}
