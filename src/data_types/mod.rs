/// Reference builds and the candidates used to detect them
pub mod build;
/// Normalized genotype calls from an array export
pub mod genotype;
/// Final PRS result that gets reported
pub mod score_result;
/// Resolved variant records and zygosity codes
pub mod variants;
