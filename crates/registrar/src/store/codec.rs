//! Row format for the data file.
//!
//! One record per line, fields separated by `;`, the record tag first:
//!
//! ```text
//! estudiante;<id>;<name>;<contact>;<program>;<year>
//! docente;<id>;<name>;<contact>;<department>;<title>
//! ```
//!
//! Fields containing the separator, a double quote or a line break are
//! double-quoted with inner quotes doubled.

use std::io;

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};

use crate::record::{Record, RecordId, RecordKind};

/// Field separator.
pub const DELIMITER: u8 = b';';

/// Number of fields in every valid row.
pub const FIELD_COUNT: usize = 6;

/// Why a row was rejected while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// The row did not have exactly [`FIELD_COUNT`] fields.
    FieldCount {
        /// Number of fields found.
        found: usize,
    },
    /// The first field was not a known record tag.
    UnknownTag(String),
    /// The identifier was not a positive integer.
    InvalidId(String),
    /// The enrollment year was not an integer.
    InvalidYear(String),
    /// Another row already used this identifier.
    DuplicateId(RecordId),
    /// The row could not be decoded at all (e.g. invalid UTF-8).
    Malformed(String),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldCount { found } => {
                write!(f, "expected {FIELD_COUNT} fields, found {found}")
            }
            Self::UnknownTag(tag) => write!(f, "unknown record tag '{tag}'"),
            Self::InvalidId(value) => write!(f, "invalid id '{value}'"),
            Self::InvalidYear(value) => write!(f, "invalid year '{value}'"),
            Self::DuplicateId(id) => write!(f, "duplicate id {id}"),
            Self::Malformed(message) => write!(f, "malformed row: {message}"),
        }
    }
}

/// Build a row reader over `rdr`.
///
/// Rows may have any number of fields; empty lines are skipped by the
/// underlying reader.
pub fn reader<R: io::Read>(rdr: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr)
}

/// Build a row writer over `wtr`, terminating every row with `\n`.
pub fn writer<W: io::Write>(wtr: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(wtr)
}

/// Fields of the row representing `record`.
#[must_use]
pub fn encode(record: &Record) -> [String; FIELD_COUNT] {
    let identity = record.identity();
    let (extra_a, extra_b) = match record {
        Record::Student(s) => (s.program.clone(), s.year.to_string()),
        Record::Faculty(f) => (f.department.clone(), f.title.clone()),
    };
    [
        record.kind().tag().to_string(),
        identity.id.to_string(),
        identity.name.clone(),
        identity.contact.clone(),
        extra_a,
        extra_b,
    ]
}

/// Decode one row into a record.
///
/// # Errors
///
/// Returns the reason the row is unusable. Callers skip such rows.
pub fn decode(row: &StringRecord) -> Result<Record, RowError> {
    let tag = row.get(0).unwrap_or_default();
    let kind = RecordKind::from_tag(tag).ok_or_else(|| RowError::UnknownTag(tag.to_string()))?;

    if row.len() != FIELD_COUNT {
        return Err(RowError::FieldCount { found: row.len() });
    }

    let id = parse_id(&row[1])?;
    let (name, contact) = (&row[2], &row[3]);

    match kind {
        RecordKind::Student => {
            let year = row[5]
                .trim()
                .parse::<i32>()
                .map_err(|_| RowError::InvalidYear(row[5].to_string()))?;
            Ok(Record::student(id, name, contact, &row[4], year))
        }
        RecordKind::Faculty => Ok(Record::faculty(id, name, contact, &row[4], &row[5])),
    }
}

fn parse_id(value: &str) -> Result<RecordId, RowError> {
    match value.trim().parse::<RecordId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(RowError::InvalidId(value.to_string())),
    }
}
