
/// Contains the per-model summary of a run
pub mod call_summary;
/// Contains the writer for genotype calls, kept in input order
pub mod ordered_call_writer;
