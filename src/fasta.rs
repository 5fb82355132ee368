//src/fasta.rs

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::SequenceRecord;

lazy_static! {
    /// `>d1abca_ a.1.1.1 (A:) ...` => captures `a.1.1.1`
    static ref SCCS_PATTERN: Regex =
        Regex::new(r">\w+\s+([A-Za-z]\.\d+\.\d+\.\d+)").expect("valid sccs pattern");
}

/// Extract the dotted classification code from a header line.
pub fn extract_classification(header: &str) -> Option<&str> {
    SCCS_PATTERN
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Turn a finished header/sequence block into a record, if the header carries a code.
fn finish_record(header: Option<&str>, fragments: &[String]) -> Option<SequenceRecord> {
    let header = header?;
    if fragments.is_empty() {
        return None;
    }
    let full_label = extract_classification(header)?;
    let coarse_class = full_label.chars().next()?;
    Some(SequenceRecord {
        full_label: full_label.to_string(),
        coarse_class,
        sequence: fragments.concat(),
    })
}

/// Parse FASTA text from any buffered reader.
///
/// Headers whose text lacks a classification code are dropped together with
/// their sequence lines; blank lines are ignored everywhere. The pending record
/// is flushed at end of stream.
pub fn parse_fasta_reader<R: BufRead>(mut reader: R) -> io::Result<Vec<SequenceRecord>> {
    let mut records = Vec::new();
    let mut current_header: Option<String> = None;
    let mut fragments: Vec<String> = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let trimmed = line.trim();
        if trimmed.starts_with('>') {
            if let Some(record) = finish_record(current_header.as_deref(), &fragments) {
                records.push(record);
            }
            current_header = Some(trimmed.to_string());
            fragments.clear();
        } else if !trimmed.is_empty() {
            fragments.push(trimmed.to_uppercase().replace(' ', ""));
        }
    }

    if let Some(record) = finish_record(current_header.as_deref(), &fragments) {
        records.push(record);
    }

    Ok(records)
}

/// Read a FASTA file (plain, or gzip when the name ends in `.gz`).
pub fn read_fasta_records<P: AsRef<Path>>(path: P) -> io::Result<Vec<SequenceRecord>> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    parse_fasta_reader(reader)
}

/// Load a dataset, reporting (not raising) any read failure.
/// A missing or unreadable file yields an empty record set.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Vec<SequenceRecord> {
    let path = path.as_ref();
    match read_fasta_records(path) {
        Ok(records) => {
            log::info!("Parsed {} records from {}", records.len(), path.display());
            records
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::error!("File '{}' not found", path.display());
            eprintln!("ERROR: file '{}' not found. Check the path.", path.display());
            Vec::new()
        }
        Err(e) => {
            log::error!("Failed to read FASTA {}: {}", path.display(), e);
            eprintln!("ERROR: failed while processing FASTA '{}': {}", path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn parse(text: &str) -> Vec<SequenceRecord> {
        parse_fasta_reader(Cursor::new(text)).unwrap()
    }

    #[test]
    fn parses_two_records() {
        let records = parse(">d1abc a.1.1.1\nABCDE\n>d1xyz b.2.3.4\nABCFED\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].coarse_class, 'a');
        assert_eq!(records[0].full_label, "a.1.1.1");
        assert_eq!(records[0].sequence, "ABCDE");
        assert_eq!(records[1].coarse_class, 'b');
        assert_eq!(records[1].sequence, "ABCFED");
    }

    #[test]
    fn flushes_last_record_without_trailing_newline() {
        let records = parse(">d1abc a.1.1.1\nAC\n>d2abc c.3.1.2\nGG");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].full_label, "c.3.1.2");
        assert_eq!(records[1].sequence, "GG");
    }

    #[test]
    fn drops_headers_without_code_but_keeps_neighbours() {
        let text = ">d1abc a.1.1.1\nAAA\n>nolabel here\nCCC\n>d3abc g.4.1.1\nDDD\n";
        let records = parse(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, "AAA");
        assert_eq!(records[1].coarse_class, 'g');
        assert_eq!(records[1].sequence, "DDD");
    }

    #[test]
    fn joins_fragments_and_normalises_case_and_spaces() {
        let text = ">d1abc a.1.1.1 (A:) protein\n  acd ef \n\nGHI K\n\n";
        let records = parse(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, "ACDEFGHIK");
    }

    #[test]
    fn header_without_sequence_is_dropped() {
        let records = parse(">d1abc a.1.1.1\n>d2abc b.1.1.1\nMK\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].full_label, "b.1.1.1");
    }

    #[test]
    fn sequence_before_first_header_is_ignored() {
        let records = parse("MKV\n>d1abc a.1.1.1\nAA\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, "AA");
    }

    #[test]
    fn classification_requires_four_segments() {
        assert_eq!(extract_classification(">d1abc a.1.1.1 x"), Some("a.1.1.1"));
        assert_eq!(extract_classification(">d1abc a.1.1"), None);
        assert_eq!(extract_classification(">d1abc 1.1.1.1"), None);
        assert_eq!(extract_classification("> a.1.1.1"), None);
    }

    #[test]
    fn missing_file_yields_empty_dataset() {
        let records = load_dataset("/definitely/not/here.fa");
        assert!(records.is_empty());
    }

    #[test]
    fn reads_gzip_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.fa.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b">d1abc a.1.1.1\nMKV\n>d2abc b.1.1.1\nLLA\n").unwrap();
        std::fs::write(&path, enc.finish().unwrap()).unwrap();

        let records = read_fasta_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence, "LLA");
    }
}
