
use crate::data_types::read_evidence::SiteEvidence;

use log::trace;
use serde::Deserialize;
use simple_error::bail;
use std::fs::File;
use std::io;
use std::path::Path;

/// One raw row of the evidence table, quality lists are still comma-separated strings
#[derive(Debug, Deserialize)]
struct SiteRow {
    /// site label, carried through to the output unchanged
    site: String,
    /// treatment reads supporting top1
    treat_top1: String,
    /// treatment reads supporting top2
    treat_top2: String,
    /// control reads supporting top1
    ctrl_top1: String,
    /// control reads supporting top2
    ctrl_top2: String
}

/// A parsed site ready for model fitting
#[derive(Clone, Debug, PartialEq)]
pub struct SiteRecord {
    /// 0-based order of the site in the input, used to keep the output ordered
    pub index: usize,
    /// the site label
    pub site: String,
    /// the read evidence
    pub evidence: SiteEvidence
}

/// Parses a comma-separated list of Phred scores; an empty field or "." means no reads.
/// # Arguments
/// * `field` - the raw field value
/// # Errors
/// * if any value is not an integer in [0, 255]
pub fn parse_quality_list(field: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let trimmed: &str = field.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Ok(vec![]);
    }

    let mut quals: Vec<u8> = Vec::with_capacity(trimmed.len() / 2 + 1);
    for value in trimmed.split(',') {
        match value.trim().parse::<u8>() {
            Ok(q) => quals.push(q),
            Err(e) => {
                bail!("Invalid base quality {:?} in {:?}: {}", value, field, e);
            }
        };
    }
    Ok(quals)
}

/// Streams sites out of a delimited evidence table with a header row.
/// Lines starting with '#' are skipped.
pub struct SiteReader<R: io::Read> {
    /// Handle for the CSV reader
    csv_reader: csv::Reader<R>,
    /// the header, needed to deserialize by column name
    headers: csv::StringRecord,
    /// re-used record buffer
    record: csv::StringRecord,
    /// index assigned to the next site
    next_index: usize
}

impl SiteReader<File> {
    /// Opens an evidence table, the delimiter is "," for .csv files and tab otherwise
    /// # Arguments
    /// * `filename` - the table to read
    pub fn from_path(filename: &Path) -> Result<SiteReader<File>, Box<dyn std::error::Error>> {
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let file: File = File::open(filename)?;
        SiteReader::from_reader(file, delimiter)
    }
}

impl<R: io::Read> SiteReader<R> {
    /// Wraps any reader.
    /// # Arguments
    /// * `reader` - the source of the table
    /// * `delimiter` - the field delimiter; use tab when quality lists are comma-separated
    /// # Errors
    /// * if the header cannot be read or is missing a required column
    pub fn from_reader(reader: R, delimiter: u8) -> Result<SiteReader<R>, Box<dyn std::error::Error>> {
        let mut csv_reader: csv::Reader<R> = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .flexible(false)
            .from_reader(reader);
        let headers: csv::StringRecord = csv_reader.headers()?.clone();
        for required in ["site", "treat_top1", "treat_top2", "ctrl_top1", "ctrl_top2"] {
            if !headers.iter().any(|h| h == required) {
                bail!("Evidence table is missing required column {:?}", required);
            }
        }
        Ok(SiteReader {
            csv_reader,
            headers,
            record: csv::StringRecord::new(),
            next_index: 0
        })
    }

    /// Converts the record currently in the buffer into a site
    fn parse_record(&mut self) -> Result<SiteRecord, Box<dyn std::error::Error>> {
        let row: SiteRow = self.record.deserialize(Some(&self.headers))?;
        let evidence: SiteEvidence = SiteEvidence::from_quals(
            parse_quality_list(&row.treat_top1)?,
            parse_quality_list(&row.treat_top2)?,
            parse_quality_list(&row.ctrl_top1)?,
            parse_quality_list(&row.ctrl_top2)?
        );
        let index: usize = self.next_index;
        self.next_index += 1;
        trace!("site {index} {:?}: {evidence:?}", row.site);
        Ok(SiteRecord {
            index,
            site: row.site,
            evidence
        })
    }
}

impl<R: io::Read> Iterator for SiteReader<R> {
    type Item = Result<SiteRecord, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.csv_reader.read_record(&mut self.record) {
            Ok(true) => Some(self.parse_record()),
            Ok(false) => None,
            Err(e) => Some(Err(Box::new(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quality_list() {
        assert_eq!(parse_quality_list("30,20, 10").unwrap(), vec![30, 20, 10]);
        assert_eq!(parse_quality_list("7").unwrap(), vec![7]);
        assert!(parse_quality_list("").unwrap().is_empty());
        assert!(parse_quality_list(" . ").unwrap().is_empty());
        assert!(parse_quality_list("30,,20").is_err());
        assert!(parse_quality_list("30,256").is_err());
        assert!(parse_quality_list("-1").is_err());
        assert!(parse_quality_list("Q30").is_err());
    }

    #[test]
    fn test_read_sites() {
        let table = "\
site\ttreat_top1\ttreat_top2\tctrl_top1\tctrl_top2
# comment lines are skipped
chr1:100\t30,30,30\t20\t.\t.
chr1:200\t.\t30,25\t30\t
";
        let reader = SiteReader::from_reader(table.as_bytes(), b'\t').unwrap();
        let sites: Vec<SiteRecord> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(sites.len(), 2);

        assert_eq!(sites[0].index, 0);
        assert_eq!(sites[0].site, "chr1:100");
        assert_eq!(sites[0].evidence, SiteEvidence::from_quals(vec![30, 30, 30], vec![20], vec![], vec![]));

        assert_eq!(sites[1].index, 1);
        assert_eq!(sites[1].site, "chr1:200");
        assert_eq!(sites[1].evidence, SiteEvidence::from_quals(vec![], vec![30, 25], vec![30], vec![]));
    }

    #[test]
    fn test_column_order_is_free() {
        let table = "ctrl_top2,ctrl_top1,treat_top2,treat_top1,site\n.,.,5,40,siteA\n";
        let reader = SiteReader::from_reader(table.as_bytes(), b',').unwrap();
        let sites: Vec<SiteRecord> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(sites[0].evidence, SiteEvidence::from_quals(vec![40], vec![5], vec![], vec![]));
    }

    #[test]
    fn test_missing_column() {
        let table = "site\ttreat_top1\ttreat_top2\tctrl_top1\nx\t30\t.\t.\n";
        assert!(SiteReader::from_reader(table.as_bytes(), b'\t').is_err());
    }

    #[test]
    fn test_bad_quality() {
        let table = "site\ttreat_top1\ttreat_top2\tctrl_top1\tctrl_top2\nx\t30,abc\t.\t.\t.\n";
        let mut reader = SiteReader::from_reader(table.as_bytes(), b'\t').unwrap();
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
