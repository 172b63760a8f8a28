
/// Converts array genotype calls into VCF alleles and GT codes
pub mod allele_resolver;
/// Detects the reference build of an array export
pub mod build_detector;
/// Standardizes dosages against the population model and projects them onto its eigenvectors
pub mod calibrator;
/// Command line interface functionality
pub mod cli;
/// Wrappers for the external phasing, imputation, and liftover tools
pub mod collaborators;
/// Contains various shared data types
pub mod data_types;
/// Joins imputed dosages to SNP weights and computes the raw score
pub mod dosage_scorer;
/// Domain errors and the structured failure report
pub mod errors;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Orchestration of the convert, score, and run flows
pub mod pipeline;
/// File layout of the reference bundle
pub mod reference_layout;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
