//! Streaming filter over BioGRID tab3 interaction files
//!
//! Reads one record at a time and yields the accession pairs of human-human
//! interactions. The header row is resolved by column name; nothing but the
//! current record is held in memory.

use csv::{Position, ReaderBuilder, StringRecord};
use std::io::Read;
use thiserror::Error;
use tracing::{debug, info};

/// Column holding the accession of the first interactor
pub const ACCESSION_A: &str = "SWISS-PROT Accessions Interactor A";
/// Column holding the accession of the second interactor
pub const ACCESSION_B: &str = "SWISS-PROT Accessions Interactor B";
/// Column holding the organism of the first interactor
pub const ORGANISM_A: &str = "Organism Name Interactor A";
/// Column holding the organism of the second interactor
pub const ORGANISM_B: &str = "Organism Name Interactor B";

/// Organism name both interactors must carry
pub const HUMAN: &str = "Homo sapiens";
/// Placeholder BioGRID writes for a missing accession
pub const MISSING_ACCESSION: &str = "-";

const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Source filter errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Required column absent from the header
    #[error("Missing column in header: {0:?}")]
    MissingColumn(&'static str),

    /// Input had no header row
    #[error("Input is empty, expected a header row")]
    EmptyInput,

    /// Malformed record (wrong field count, invalid UTF-8) or I/O failure
    #[error("Malformed interaction record: {0}")]
    Csv(#[from] csv::Error),

    /// Empty line between records; it has one field where the header has more
    #[error("Blank line {line} among interaction records")]
    BlankLine { line: u64 },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// One parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionRecord<'a> {
    pub organism_a: &'a str,
    pub organism_b: &'a str,
    pub accession_a: &'a str,
    pub accession_b: &'a str,
}

impl InteractionRecord<'_> {
    /// Both interactors are human and both accessions are present
    pub fn is_human_pair(&self) -> bool {
        self.organism_a == HUMAN
            && self.organism_b == HUMAN
            && is_present(self.accession_a)
            && is_present(self.accession_b)
    }
}

fn is_present(accession: &str) -> bool {
    !accession.is_empty() && accession != MISSING_ACCESSION
}

/// Resolved positions of the four columns the filter reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub accession_a: usize,
    pub accession_b: usize,
    pub organism_a: usize,
    pub organism_b: usize,
}

impl ColumnIndex {
    /// Look up the required columns by name
    pub fn from_header(header: &StringRecord) -> SourceResult<Self> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|column| column == name)
                .ok_or(SourceError::MissingColumn(name))
        };

        Ok(Self {
            accession_a: find(ACCESSION_A)?,
            accession_b: find(ACCESSION_B)?,
            organism_a: find(ORGANISM_A)?,
            organism_b: find(ORGANISM_B)?,
        })
    }

    fn project<'a>(&self, record: &'a StringRecord) -> InteractionRecord<'a> {
        // The reader rejects records whose width differs from the header,
        // so every resolved index is in bounds.
        InteractionRecord {
            organism_a: &record[self.organism_a],
            organism_b: &record[self.organism_b],
            accession_a: &record[self.accession_a],
            accession_b: &record[self.accession_b],
        }
    }
}

/// Counters kept while streaming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Data lines read, header excluded
    pub lines_read: u64,
    /// Pairs yielded
    pub pairs_kept: u64,
}

/// Lazy iterator of human-human accession pairs
///
/// Restartable only by re-reading the input.
pub struct HumanInteractions<R: Read> {
    reader: csv::Reader<R>,
    columns: ColumnIndex,
    record: StringRecord,
    stats: FilterStats,
    /// Reader line count after the previous record
    line: u64,
    done: bool,
}

impl<R: Read> HumanInteractions<R> {
    /// Read the header and resolve the required columns
    pub fn new(input: R) -> SourceResult<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let header = reader.headers()?.clone();
        if header.is_empty() || (header.len() == 1 && header[0].is_empty()) {
            return Err(SourceError::EmptyInput);
        }
        let columns = ColumnIndex::from_header(&header)?;
        let line = reader.position().line();
        debug!(?columns, width = header.len(), "Resolved interaction columns");

        Ok(Self {
            reader,
            columns,
            record: StringRecord::new(),
            stats: FilterStats::default(),
            line,
            done: false,
        })
    }

    /// Counters so far
    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// Position of the last record read
    pub fn position(&self) -> &Position {
        self.reader.position()
    }
}

impl<R: Read> Iterator for HumanInteractions<R> {
    type Item = SourceResult<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(true) => {
                    // A record spans one newline; the reader skips empty lines
                    // silently, so any extra newline is a blank line.
                    let line = self.reader.position().line();
                    if line > self.line + 1 {
                        self.done = true;
                        return Some(Err(SourceError::BlankLine { line: self.line }));
                    }
                    self.line = line;
                }
                Ok(false) => {
                    self.done = true;
                    info!(
                        lines = self.stats.lines_read,
                        pairs = self.stats.pairs_kept,
                        "Finished reading interactions"
                    );
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }

            self.stats.lines_read += 1;
            if self.stats.lines_read % PROGRESS_INTERVAL == 0 {
                debug!(
                    lines = self.stats.lines_read,
                    pairs = self.stats.pairs_kept,
                    "Preparing graph"
                );
            }

            let record = self.columns.project(&self.record);
            if record.is_human_pair() {
                self.stats.pairs_kept += 1;
                return Some(Ok((
                    record.accession_a.to_string(),
                    record.accession_b.to_string(),
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "SWISS-PROT Accessions Interactor A\tSWISS-PROT Accessions Interactor B\tOrganism Name Interactor A\tOrganism Name Interactor B";

    fn collect(input: &str) -> SourceResult<Vec<(String, String)>> {
        HumanInteractions::new(input.as_bytes())?.collect()
    }

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn test_keeps_only_complete_human_pairs() {
        let input = format!(
            "{HEADER}\nP1\tP2\tHomo sapiens\tHomo sapiens\nP3\t-\tHomo sapiens\tHomo sapiens\nP4\tP5\tMus musculus\tHomo sapiens\n"
        );

        let pairs = collect(&input).unwrap();

        assert_eq!(pairs, vec![pair("P1", "P2")]);
    }

    #[test]
    fn test_preserves_input_order() {
        let input = format!(
            "{HEADER}\nQ9\tQ1\tHomo sapiens\tHomo sapiens\nP1\tP2\tHomo sapiens\tMus musculus\nA1\tB1\tHomo sapiens\tHomo sapiens\n"
        );

        let pairs = collect(&input).unwrap();

        assert_eq!(pairs, vec![pair("Q9", "Q1"), pair("A1", "B1")]);
    }

    #[test]
    fn test_rejects_empty_and_placeholder_accessions() {
        let input = format!(
            "{HEADER}\n\tP2\tHomo sapiens\tHomo sapiens\nP1\t\tHomo sapiens\tHomo sapiens\n-\tP2\tHomo sapiens\tHomo sapiens\n"
        );

        assert!(collect(&input).unwrap().is_empty());
    }

    #[test]
    fn test_organism_match_is_exact() {
        let input = format!(
            "{HEADER}\nP1\tP2\thomo sapiens\tHomo sapiens\nP1\tP2\tHomo sapiens \tHomo sapiens\n"
        );

        assert!(collect(&input).unwrap().is_empty());
    }

    #[test]
    fn test_columns_found_by_name_in_any_order() {
        let input = "#BioGRID Interaction ID\tOrganism Name Interactor B\tSWISS-PROT Accessions Interactor B\tOrganism Name Interactor A\tSWISS-PROT Accessions Interactor A\n\
                     1\tHomo sapiens\tP2\tHomo sapiens\tP1\n";

        let pairs = collect(input).unwrap();

        assert_eq!(pairs, vec![pair("P1", "P2")]);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let input = "SWISS-PROT Accessions Interactor A\tSWISS-PROT Accessions Interactor B\tOrganism Name Interactor A\n";

        let err = HumanInteractions::new(input.as_bytes()).err().unwrap();

        assert!(matches!(err, SourceError::MissingColumn(ORGANISM_B)));
    }

    #[test]
    fn test_wrong_field_count_is_fatal() {
        let input = format!(
            "{HEADER}\nP1\tP2\tHomo sapiens\tHomo sapiens\nP3\tP4\tHomo sapiens\nP5\tP6\tHomo sapiens\tHomo sapiens\n"
        );

        let mut iter = HumanInteractions::new(input.as_bytes()).unwrap();

        assert_eq!(iter.next().unwrap().unwrap(), pair("P1", "P2"));
        assert!(matches!(iter.next(), Some(Err(SourceError::Csv(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_blank_line_is_fatal() {
        let input = format!(
            "{HEADER}\nP1\tP2\tHomo sapiens\tHomo sapiens\n\nP3\tP4\tHomo sapiens\tHomo sapiens\n"
        );

        let mut iter = HumanInteractions::new(input.as_bytes()).unwrap();

        assert_eq!(iter.next().unwrap().unwrap(), pair("P1", "P2"));
        assert!(matches!(iter.next(), Some(Err(SourceError::BlankLine { line: 3 }))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_blank_line_after_skipped_record_is_fatal() {
        let input = format!(
            "{HEADER}\nP1\tP2\tMus musculus\tHomo sapiens\n\n\nP3\tP4\tHomo sapiens\tHomo sapiens\n"
        );

        assert!(matches!(collect(&input), Err(SourceError::BlankLine { line: 3 })));
    }

    #[test]
    fn test_crlf_lines_are_contiguous() {
        let input = format!(
            "{HEADER}\r\nP1\tP2\tHomo sapiens\tHomo sapiens\r\nP3\tP4\tHomo sapiens\tHomo sapiens\r\n"
        );

        let pairs = collect(&input).unwrap();

        assert_eq!(pairs, vec![pair("P1", "P2"), pair("P3", "P4")]);
    }

    #[test]
    fn test_empty_input() {
        let err = HumanInteractions::new("".as_bytes()).err().unwrap();
        assert!(matches!(err, SourceError::EmptyInput));
    }

    #[test]
    fn test_quotes_are_literal() {
        let input = format!("{HEADER}\n\"P1\tP2\tHomo sapiens\tHomo sapiens\n");

        let pairs = collect(&input).unwrap();

        assert_eq!(pairs, vec![pair("\"P1", "P2")]);
    }

    #[test]
    fn test_stats() {
        let input = format!(
            "{HEADER}\nP1\tP2\tHomo sapiens\tHomo sapiens\nP4\tP5\tMus musculus\tHomo sapiens\n"
        );
        let mut iter = HumanInteractions::new(input.as_bytes()).unwrap();
        while iter.next().is_some() {}

        assert_eq!(
            iter.stats(),
            FilterStats {
                lines_read: 2,
                pairs_kept: 1
            }
        );
    }
}
