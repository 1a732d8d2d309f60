
use crate::data_types::model_result::GenotypeModel;
use crate::site_caller::SiteCall;

use log::debug;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use strum::{EnumCount, IntoEnumIterator};

/// Running totals for one category of site
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct CategoryTotals {
    /// number of sites
    count: usize,
    /// sum of GQ values
    gq_sum: u64,
    /// sum of AS significance values
    as_sig_sum: u64
}

impl CategoryTotals {
    fn add(&mut self, call: &SiteCall) {
        self.count += 1;
        self.gq_sum += call.gq as u64;
        self.as_sig_sum += call.as_sig as u64;
    }

    fn mean_gq(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.gq_sum as f64 / self.count as f64)
        }
    }

    fn mean_as_sig(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.as_sig_sum as f64 / self.count as f64)
        }
    }
}

/// Contains all the data written to each row of our summary file
#[derive(Serialize)]
struct SummaryRow {
    /// the genotype model, "skipped", or "all"
    category: String,
    /// the number of sites in the category
    num_sites: usize,
    /// fraction of all input sites, skipped included
    fraction: Option<f64>,
    /// mean genotype quality
    mean_gq: Option<f64>,
    /// mean allele-specific significance
    mean_as_sig: Option<f64>
}

/// Tallies calls by selected model so a short summary can be written at the end of a run
#[derive(Debug, Default)]
pub struct CallSummary {
    /// totals indexed by `GenotypeModel as usize`
    by_model: [CategoryTotals; GenotypeModel::COUNT],
    /// sites that had no treatment reads
    num_skipped: usize
}

impl CallSummary {
    pub fn new() -> CallSummary {
        Self::default()
    }

    /// Adds a call to our totals
    /// # Arguments
    /// * `call` - the completed site call
    pub fn add_call(&mut self, call: &SiteCall) {
        self.by_model[call.model as usize].add(call);
    }

    /// Records a site that could not be called
    pub fn add_skipped(&mut self) {
        self.num_skipped += 1;
    }

    /// Number of sites selecting a given model
    pub fn model_count(&self, model: GenotypeModel) -> usize {
        self.by_model[model as usize].count
    }

    pub fn num_skipped(&self) -> usize {
        self.num_skipped
    }

    /// Number of sites with a call
    pub fn num_called(&self) -> usize {
        self.by_model.iter().map(|t| t.count).sum()
    }

    /// Number of sites seen, called or skipped
    pub fn num_sites(&self) -> usize {
        self.num_called() + self.num_skipped
    }

    /// Builds the rows in output order: each model, then skipped, then all
    fn summary_rows(&self) -> Vec<SummaryRow> {
        let num_sites: usize = self.num_sites();
        let fraction = |count: usize| -> Option<f64> {
            if num_sites == 0 {
                None
            } else {
                Some(count as f64 / num_sites as f64)
            }
        };

        let mut rows: Vec<SummaryRow> = GenotypeModel::iter()
            .map(|model| {
                let totals: &CategoryTotals = &self.by_model[model as usize];
                SummaryRow {
                    category: model.to_string(),
                    num_sites: totals.count,
                    fraction: fraction(totals.count),
                    mean_gq: totals.mean_gq(),
                    mean_as_sig: totals.mean_as_sig()
                }
            })
            .collect();

        rows.push(SummaryRow {
            category: "skipped".to_string(),
            num_sites: self.num_skipped,
            fraction: fraction(self.num_skipped),
            mean_gq: None,
            mean_as_sig: None
        });

        let all_called: CategoryTotals = self.by_model.iter().fold(CategoryTotals::default(), |acc, t| CategoryTotals {
            count: acc.count + t.count,
            gq_sum: acc.gq_sum + t.gq_sum,
            as_sig_sum: acc.as_sig_sum + t.as_sig_sum
        });
        rows.push(SummaryRow {
            category: "all".to_string(),
            num_sites,
            fraction: fraction(num_sites),
            mean_gq: all_called.mean_gq(),
            mean_as_sig: all_called.mean_as_sig()
        });
        rows
    }

    /// Writes the summary rows to an existing CSV writer
    pub fn write_rows<W: std::io::Write>(&self, csv_writer: &mut csv::Writer<W>) -> csv::Result<()> {
        for row in self.summary_rows().iter() {
            debug!("{} => {}", row.category, row.num_sites);
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Will write out the per-model summary
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        self.write_rows(&mut csv_writer)
    }
}
