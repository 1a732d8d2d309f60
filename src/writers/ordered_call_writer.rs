
use crate::site_caller::SiteCall;

use log::trace;
use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;
use simple_error::bail;
use std::fs::File;
use std::io;
use std::path::Path;

/// Contains all the data written to each row of our call file
#[derive(Serialize)]
struct CallRow {
    /// the site label from the input
    site: String,
    /// the selected genotype model, or "." if the site could not be fitted
    model: String,
    /// genotype quality of the selected model
    gq: Option<u8>,
    /// allele-specific significance
    as_sig: Option<u8>,
    /// fitted treatment top1 ratio
    allele_ratio: Option<f64>,
    /// fitted treatment top1 count under the allele-specific model
    treatment_k: Option<usize>,
    lnl_homo_major: Option<f64>,
    bic_homo_major: Option<f64>,
    lnl_homo_minor: Option<f64>,
    bic_homo_minor: Option<f64>,
    lnl_heter_noas: Option<f64>,
    bic_heter_noas: Option<f64>,
    lnl_heter_as: Option<f64>,
    bic_heter_as: Option<f64>
}

impl CallRow {
    fn new(site: String, opt_call: Option<&SiteCall>) -> CallRow {
        match opt_call {
            Some(call) => CallRow {
                site,
                model: call.model.to_string(),
                gq: Some(call.gq),
                as_sig: Some(call.as_sig),
                allele_ratio: Some(call.allele_ratio()),
                treatment_k: Some(call.heter_as.treatment_k),
                lnl_homo_major: Some(call.homo_major.log_likelihood),
                bic_homo_major: Some(call.homo_major.bic),
                lnl_homo_minor: Some(call.homo_minor.log_likelihood),
                bic_homo_minor: Some(call.homo_minor.bic),
                lnl_heter_noas: Some(call.heter_no_as.log_likelihood),
                bic_heter_noas: Some(call.heter_no_as.bic),
                lnl_heter_as: Some(call.heter_as.model.log_likelihood),
                bic_heter_as: Some(call.heter_as.model.bic)
            },
            None => CallRow {
                site,
                model: ".".to_string(),
                gq: None,
                as_sig: None,
                allele_ratio: None,
                treatment_k: None,
                lnl_homo_major: None,
                bic_homo_major: None,
                lnl_homo_minor: None,
                bic_homo_minor: None,
                lnl_heter_noas: None,
                bic_heter_noas: None,
                lnl_heter_as: None,
                bic_heter_as: None
            }
        }
    }
}

/// Structure that maintains input order of sites while writing calls that may finish out of order.
pub struct OrderedCallWriter<W: io::Write> {
    /// Handle for the CSV writer
    csv_writer: csv::Writer<W>,
    /// the data that may be cached because we are waiting on earlier results
    map_store: HashMap<usize, (String, Option<SiteCall>)>,
    /// the index of data we are waiting for
    current_index: usize
}

impl OrderedCallWriter<File> {
    /// Creates a new writer for a given filename
    /// # Arguments
    /// * `filename` - the path to write all calls to; ".csv" selects comma delimiters, anything else is tab-delimited
    pub fn new(filename: &Path) -> csv::Result<OrderedCallWriter<File>> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        Ok(OrderedCallWriter::from_csv_writer(csv_writer))
    }
}

impl<W: io::Write> OrderedCallWriter<W> {
    /// Wraps an existing CSV writer
    pub fn from_csv_writer(csv_writer: csv::Writer<W>) -> OrderedCallWriter<W> {
        OrderedCallWriter {
            csv_writer,
            map_store: Default::default(),
            current_index: 0
        }
    }

    /// Returns the site index that the writer is currently waiting to receive.
    pub fn get_wait_index(&self) -> usize {
        self.current_index
    }

    /// Adds a site result to our queue for writing.
    /// # Arguments
    /// * `index` - the 0-based input order of the site
    /// * `site` - the site label
    /// * `opt_call` - the call, or None if the site was skipped
    /// # Errors
    /// * if the index was already written or is already queued
    /// * if the csv_writer has any errors
    pub fn write_call(&mut self, index: usize, site: String, opt_call: Option<SiteCall>) -> Result<(), Box<dyn std::error::Error>> {
        if index < self.current_index {
            bail!("Site index is smaller than next expected index");
        }
        if self.map_store.insert(index, (site, opt_call)).is_some() {
            bail!("Site index was already present in the map_store");
        }
        self.drain_map_store()
    }

    /// This will write site calls in the correct order if they have been received.
    /// It drains as far as it can given the current results and then stops to wait for more data.
    fn drain_map_store(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        while let Some((site, opt_call)) = self.map_store.remove(&self.current_index) {
            trace!("Writing site {} ({})", self.current_index, site);
            let row: CallRow = CallRow::new(site, opt_call.as_ref());
            self.csv_writer.serialize(&row)?;
            self.current_index += 1;
        }
        Ok(())
    }

    /// Flushes everything and verifies no sites are still waiting on an earlier one.
    /// # Errors
    /// * if any site is still queued
    /// * if the final flush fails
    pub fn finalize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.map_store.is_empty() {
            bail!("Finished writing at site {}, but {} later sites are still queued", self.current_index, self.map_store.len());
        }
        self.csv_writer.flush()?;
        Ok(())
    }

    /// Finalizes and returns the underlying writer
    pub fn into_inner(mut self) -> Result<W, Box<dyn std::error::Error>> {
        self.finalize()?;
        match self.csv_writer.into_inner() {
            Ok(w) => Ok(w),
            Err(e) => bail!("Error while closing call writer: {}", e.error())
        }
    }
}
