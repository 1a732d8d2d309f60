
/// Contains the model result types and the genotype model labels
pub mod model_result;
/// Contains the per-group and per-site read quality evidence
pub mod read_evidence;
