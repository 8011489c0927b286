//! Tab-delimited vectors + vocabulary files
//!
//! Vectors file: a `size\tdimensions` header row, then `accession\tc1\t...\tcd`.
//! Vocabulary file: `accession\tcount`. Both are sorted by descending count and
//! aligned row for row. Paths ending in `.gz` are gzip-compressed.

use super::{KeyedVectors, VectorsError, VectorsResult, VocabEntry};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use ndarray::Array2;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Output file, optionally gzip-compressed
pub enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    /// Flush buffers and write the gzip trailer
    pub fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

/// Create `path`, compressing when it ends in `.gz`
pub fn open_writer(path: impl AsRef<Path>) -> io::Result<Sink> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    Ok(if is_gzip(path) {
        Sink::Gzip(GzEncoder::new(file, Compression::default()))
    } else {
        Sink::Plain(file)
    })
}

/// Open `path`, decompressing when it ends in `.gz`
pub fn open_reader(path: impl AsRef<Path>) -> io::Result<Box<dyn Read>> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    Ok(if is_gzip(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    })
}

/// Tab-delimited writer, quoting only fields that need it
pub(crate) fn tab_writer<W: Write>(sink: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Necessary)
        .flexible(true)
        .from_writer(sink)
}

fn tab_reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

/// Flush a writer opened with [`open_writer`] and finish its file
pub(crate) fn close(writer: csv::Writer<Sink>) -> VectorsResult<()> {
    let sink = writer.into_inner().map_err(|e| e.into_error())?;
    sink.finish()?;
    Ok(())
}

/// Write vectors and vocabulary sorted by descending count.
///
/// Fails with [`VectorsError::CountMismatch`] before touching the filesystem
/// when the vocabulary size differs from the number of vector rows.
pub fn save_tabbed(
    kv: &KeyedVectors,
    vectors_path: impl AsRef<Path>,
    vocab_path: impl AsRef<Path>,
) -> VectorsResult<()> {
    kv.validate()?;

    let total = kv.len();
    let dimensions = kv.dimensions();
    let mut vectors_writer = tab_writer(open_writer(vectors_path.as_ref())?);
    let mut vocab_writer = tab_writer(open_writer(vocab_path.as_ref())?);

    vectors_writer.write_record([total.to_string(), dimensions.to_string()])?;

    let mut row: Vec<String> = Vec::with_capacity(dimensions + 1);
    for (accession, entry) in kv.sorted_by_count() {
        vocab_writer.write_record([accession, entry.count.to_string().as_str()])?;

        row.clear();
        row.push(accession.to_string());
        row.extend(kv.vectors().row(entry.index).iter().map(f32::to_string));
        vectors_writer.write_record(&row)?;
    }

    close(vectors_writer)?;
    close(vocab_writer)?;
    debug!(
        total,
        dimensions,
        vectors = %vectors_path.as_ref().display(),
        vocab = %vocab_path.as_ref().display(),
        "Wrote tabbed vectors"
    );
    Ok(())
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_field<T: std::str::FromStr>(record: &StringRecord, idx: usize) -> VectorsResult<T>
where
    T::Err: std::fmt::Display,
{
    let field = record.get(idx).ok_or_else(|| VectorsError::Parse {
        line: line_of(record),
        message: format!("missing field {}", idx + 1),
    })?;
    field.parse().map_err(|e: T::Err| VectorsError::Parse {
        line: line_of(record),
        message: format!("{field:?}: {e}"),
    })
}

/// Read back files written by [`save_tabbed`]
pub fn load_tabbed(
    vectors_path: impl AsRef<Path>,
    vocab_path: impl AsRef<Path>,
) -> VectorsResult<KeyedVectors> {
    let mut vectors_records = tab_reader(open_reader(vectors_path)?).into_records();
    let mut vocab_records = tab_reader(open_reader(vocab_path)?).into_records();

    let header = vectors_records.next().ok_or(VectorsError::MissingHeader)??;
    let total: usize = parse_field(&header, 0)?;
    let dimensions: usize = parse_field(&header, 1)?;

    let mut vocab = IndexMap::with_capacity(total);
    let mut data = Vec::with_capacity(total.saturating_mul(dimensions));

    for record in vectors_records {
        let record = record?;
        let accession = record.get(0).unwrap_or_default().to_string();
        if record.len() != dimensions + 1 {
            return Err(VectorsError::DimensionMismatch {
                accession,
                expected: dimensions,
                got: record.len().saturating_sub(1),
            });
        }

        let vocab_record = vocab_records.next().ok_or(VectorsError::VocabMismatch {
            line: line_of(&record),
        })??;
        if vocab_record.get(0) != Some(accession.as_str()) {
            return Err(VectorsError::VocabMismatch {
                line: line_of(&vocab_record),
            });
        }
        let count: u64 = parse_field(&vocab_record, 1)?;

        for idx in 1..=dimensions {
            data.push(parse_field::<f32>(&record, idx)?);
        }

        if vocab.contains_key(&accession) {
            return Err(VectorsError::DuplicateAccession(accession));
        }
        let index = vocab.len();
        vocab.insert(accession, VocabEntry { index, count });
    }

    if let Some(extra) = vocab_records.next() {
        return Err(VectorsError::VocabMismatch {
            line: line_of(&extra?),
        });
    }
    if vocab.len() != total {
        return Err(VectorsError::CountMismatch {
            vocab: total,
            vectors: vocab.len(),
        });
    }

    let vectors = Array2::from_shape_vec((vocab.len(), dimensions), data).map_err(|e| {
        VectorsError::Parse {
            line: 0,
            message: e.to_string(),
        }
    })?;
    Ok(KeyedVectors::new(vocab, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> KeyedVectors {
        KeyedVectors::from_rows(
            3,
            vec![
                ("P1".to_string(), 2, vec![0.1, -0.2, 3.5]),
                ("P2".to_string(), 9, vec![1.0e-7, 123456.78, -0.0]),
                ("P3".to_string(), 4, vec![f32::MIN_POSITIVE, 1.0, 2.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_layout_sorted_by_count() {
        let dir = TempDir::new().unwrap();
        let vectors = dir.path().join("vectors.tsv");
        let vocab = dir.path().join("vocab.tsv");

        save_tabbed(&sample(), &vectors, &vocab).unwrap();

        let vocab_text = fs::read_to_string(&vocab).unwrap();
        assert_eq!(vocab_text, "P2\t9\nP3\t4\nP1\t2\n");

        let vectors_text = fs::read_to_string(&vectors).unwrap();
        let lines: Vec<_> = vectors_text.lines().collect();
        assert_eq!(lines[0], "3\t3");
        assert_eq!(lines[3], "P1\t0.1\t-0.2\t3.5");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_reload_reproduces_values() {
        let dir = TempDir::new().unwrap();
        let vectors = dir.path().join("vectors.tsv");
        let vocab = dir.path().join("vocab.tsv");
        let original = sample();

        save_tabbed(&original, &vectors, &vocab).unwrap();
        let loaded = load_tabbed(&vectors, &vocab).unwrap();

        assert_eq!(loaded.len(), original.len());
        assert_eq!(loaded.dimensions(), 3);
        for (accession, count, vector) in original.rows() {
            assert_eq!(loaded.count(accession), Some(count));
            assert_eq!(loaded.get(accession).unwrap(), vector);
        }
        // File order is count order
        let order: Vec<_> = loaded.vocab().keys().map(String::as_str).collect();
        assert_eq!(order, vec!["P2", "P3", "P1"]);
    }

    #[test]
    fn test_gzip_by_extension() {
        let dir = TempDir::new().unwrap();
        let vectors = dir.path().join("vectors.tsv.gz");
        let vocab = dir.path().join("vocab.tsv");

        save_tabbed(&sample(), &vectors, &vocab).unwrap();

        let raw = fs::read(&vectors).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        assert_eq!(fs::read_to_string(&vocab).unwrap().lines().count(), 3);

        let loaded = load_tabbed(&vectors, &vocab).unwrap();
        assert_eq!(loaded.count("P2"), Some(9));
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let vectors = dir.path().join("vectors.tsv");
        let vocab = dir.path().join("vocab.tsv");
        let mut entries = IndexMap::new();
        entries.insert("P1".to_string(), VocabEntry { index: 0, count: 1 });
        let kv = KeyedVectors::new(entries, array![[1.0f32], [2.0]]);

        let err = save_tabbed(&kv, &vectors, &vocab).unwrap_err();

        assert!(matches!(err, VectorsError::CountMismatch { vocab: 1, vectors: 2 }));
        assert!(!vectors.exists());
        assert!(!vocab.exists());
    }

    #[test]
    fn test_load_detects_declared_size_mismatch() {
        let dir = TempDir::new().unwrap();
        let vectors = dir.path().join("vectors.tsv");
        let vocab = dir.path().join("vocab.tsv");
        fs::write(&vectors, "2\t1\nP1\t0.5\n").unwrap();
        fs::write(&vocab, "P1\t3\n").unwrap();

        let err = load_tabbed(&vectors, &vocab).unwrap_err();

        assert!(matches!(err, VectorsError::CountMismatch { vocab: 2, vectors: 1 }));
    }

    #[test]
    fn test_load_detects_misaligned_vocab() {
        let dir = TempDir::new().unwrap();
        let vectors = dir.path().join("vectors.tsv");
        let vocab = dir.path().join("vocab.tsv");
        fs::write(&vectors, "1\t1\nP1\t0.5\n").unwrap();
        fs::write(&vocab, "P2\t3\n").unwrap();

        let err = load_tabbed(&vectors, &vocab).unwrap_err();

        assert!(matches!(err, VectorsError::VocabMismatch { .. }));
    }

    #[test]
    fn test_load_detects_short_row() {
        let dir = TempDir::new().unwrap();
        let vectors = dir.path().join("vectors.tsv");
        let vocab = dir.path().join("vocab.tsv");
        fs::write(&vectors, "1\t2\nP1\t0.5\n").unwrap();
        fs::write(&vocab, "P1\t3\n").unwrap();

        let err = load_tabbed(&vectors, &vocab).unwrap_err();

        assert!(matches!(err, VectorsError::DimensionMismatch { expected: 2, got: 1, .. }));
    }
}
