
/// CLI functionality and checks
pub mod cli;
/// Contains the read evidence and model result types
pub mod data_types;
/// The homozygous and heterozygous genotype models with their BIC scoring
pub mod genotype_models;
/// Greedy and exhaustive searches for the most likely top1 read count
pub mod greedy_search;
/// Base quality error model and the core log likelihood
pub mod likelihood;
/// Converts model likelihoods into Phred-scaled confidence values
pub mod quality_scores;
/// Scores a single site against every model and picks the winner
pub mod site_caller;
/// Loads site evidence from a delimited table
pub mod site_reader;
/// Contains all the various output writer functionality
pub mod writers;
