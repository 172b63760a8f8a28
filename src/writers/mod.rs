/*!
# Writers module
Contains the logic for writing and finalizing the VCF outputs of the conversion step.
*/
/// Helper functions for compressing and indexing VCF files
pub mod noodles_idx;
/// Re-sorts VCF records after a liftover
pub mod vcf_sorter;
/// Writes resolved array calls as a single-sample VCF
pub mod vcf_writer;
