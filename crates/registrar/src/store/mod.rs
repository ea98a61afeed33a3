//! Record store for registrar.
//!
//! This module owns the in-memory catalog and its flat-file persistence:
//! a `;`-delimited data file (see [`codec`]) plus a counter file holding the
//! last identifier handed out.

pub mod codec;

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::{Record, RecordId, RecordKind};

pub use codec::RowError;

/// Default name of the data file.
pub const DEFAULT_DATA_FILE: &str = "registros.csv";

/// Default name of the counter file.
pub const DEFAULT_COUNTER_FILE: &str = "ultimo_id.txt";

/// Locations of the two files backing a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorePaths {
    /// Delimited data file, one record per line.
    pub data_file: PathBuf,
    /// File holding the last assigned identifier.
    pub counter_file: PathBuf,
}

impl StorePaths {
    /// Create paths from explicit file locations.
    #[must_use]
    pub fn new(data_file: impl Into<PathBuf>, counter_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            counter_file: counter_file.into(),
        }
    }

    /// Default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_DATA_FILE), dir.join(DEFAULT_COUNTER_FILE))
    }
}

/// A row that was dropped while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the data file.
    pub line: u64,
    /// Why the row was dropped.
    pub reason: RowError,
}

/// What happened to the counter file during load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterStatus {
    /// No counter file was present.
    #[default]
    Missing,
    /// The counter file was read and held this value.
    Read(RecordId),
    /// The counter file could not be parsed and was ignored.
    Ignored,
}

/// Outcome of the load performed when a store is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of records loaded.
    pub loaded: usize,
    /// Rows that were skipped, in file order.
    pub skipped: Vec<SkippedRow>,
    /// Counter file status.
    pub counter: CounterStatus,
    /// I/O failure that cut the load short, if any.
    pub failure: Option<String>,
}

impl LoadReport {
    /// Check if the load ran to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Field values for [`Store::update`].
///
/// `None` or an empty (or whitespace-only) value keeps the current value.
/// Fields that do not belong to the target record's kind are left alone
/// and reported as [`FieldWarning::NotApplicable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New contact address.
    pub contact: Option<String>,
    /// New program (students).
    pub program: Option<String>,
    /// New enrollment year as text (students).
    pub year: Option<String>,
    /// New department (faculty).
    pub department: Option<String>,
    /// New academic title (faculty).
    pub title: Option<String>,
}

/// A field-level problem that did not stop an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldWarning {
    /// The year was not an integer; the current year was kept.
    InvalidYear {
        /// The rejected text.
        value: String,
    },
    /// The field does not exist on this kind of record.
    NotApplicable {
        /// Field name.
        field: &'static str,
        /// Kind of the target record.
        kind: RecordKind,
    },
}

impl std::fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidYear { value } => write!(
                f,
                "year must be a number, got '{value}'; keeping the current value"
            ),
            Self::NotApplicable { field, kind } => {
                write!(f, "field '{field}' does not apply to a {kind} record")
            }
        }
    }
}

/// Result of [`Store::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record was updated, possibly with field warnings.
    Updated {
        /// Identifier of the updated record.
        id: RecordId,
        /// Fields that were left unchanged because of bad input.
        warnings: Vec<FieldWarning>,
    },
    /// No record has the requested identifier.
    NotFound,
}

/// Result of [`Store::delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record was removed.
    Deleted(Record),
    /// The caller did not confirm; nothing changed.
    Cancelled,
    /// No record has the requested identifier.
    NotFound,
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Total number of records.
    pub total: usize,
    /// Number of student records.
    pub students: usize,
    /// Number of faculty records.
    pub faculty: usize,
    /// Last identifier handed out.
    pub last_id: RecordId,
    /// Size of the data file in bytes (0 if it does not exist).
    pub data_file_bytes: u64,
}

/// In-memory record catalog backed by a data file and a counter file.
///
/// The catalog is loaded once in [`Store::open`] and only written back by
/// [`Store::save`].
#[derive(Debug)]
pub struct Store {
    paths: StorePaths,
    records: Vec<Record>,
    last_id: RecordId,
    load_report: LoadReport,
}

impl Store {
    /// Open a store, loading whatever the backing files contain.
    ///
    /// Never fails: missing files give an empty store, malformed rows are
    /// skipped, and I/O failures are recorded in [`Store::load_report`].
    #[must_use]
    pub fn open(paths: StorePaths) -> Self {
        let mut store = Self {
            paths,
            records: Vec::new(),
            last_id: 0,
            load_report: LoadReport::default(),
        };
        store.load_report = store.load();
        store
    }

    /// Open a store using the default file names inside `dir`.
    #[must_use]
    pub fn open_in_dir(dir: impl AsRef<Path>) -> Self {
        Self::open(StorePaths::in_dir(dir))
    }

    /// The files backing this store.
    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// The report produced when the store was opened.
    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last identifier handed out (0 if none).
    #[must_use]
    pub fn last_id(&self) -> RecordId {
        self.last_id
    }

    /// Hand out a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdExhausted`] once the counter has reached
    /// [`RecordId::MAX`]. The counter is left unchanged.
    pub fn generate_id(&mut self) -> Result<RecordId> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or(Error::IdExhausted { last: self.last_id })?;
        Ok(self.last_id)
    }

    /// Add a student.
    ///
    /// The year is parsed before an identifier is assigned, so a rejected
    /// call does not consume one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidYear`] if `year_text` is not an integer, or
    /// [`Error::IdExhausted`] if no identifier is left.
    pub fn add_student(
        &mut self,
        name: &str,
        contact: &str,
        program: &str,
        year_text: &str,
    ) -> Result<RecordId> {
        let year = parse_year(year_text)?;
        let id = self.generate_id()?;
        self.records
            .push(Record::student(id, name, contact, program, year));
        info!(id, "Added student {}", name);
        Ok(id)
    }

    /// Add a faculty member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdExhausted`] if no identifier is left.
    pub fn add_faculty(
        &mut self,
        name: &str,
        contact: &str,
        department: &str,
        title: &str,
    ) -> Result<RecordId> {
        let id = self.generate_id()?;
        self.records
            .push(Record::faculty(id, name, contact, department, title));
        info!(id, "Added faculty member {}", name);
        Ok(id)
    }

    /// Summaries of every record, in order.
    #[must_use]
    pub fn list_all(&self) -> Vec<String> {
        if self.records.is_empty() {
            info!("No records in the store");
        }
        self.records.iter().map(Record::summary).collect()
    }

    /// Find the record with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if `id_text` is not an integer.
    pub fn find_by_id(&self, id_text: &str) -> Result<Option<&Record>> {
        Ok(self.position_of(id_text)?.map(|index| &self.records[index]))
    }

    /// Find records whose name contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQuery`] if `query` is empty or whitespace.
    pub fn find_by_name(&self, query: &str) -> Result<Vec<&Record>> {
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        let needle = query.to_lowercase();
        let matches: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| r.name().to_lowercase().contains(&needle))
            .collect();

        debug!("Name search '{}' matched {} records", query, matches.len());
        Ok(matches)
    }

    /// Update a record in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if `id_text` is not an integer.
    pub fn update(&mut self, id_text: &str, changes: &RecordUpdate) -> Result<UpdateOutcome> {
        let Some(index) = self.position_of(id_text)? else {
            return Ok(UpdateOutcome::NotFound);
        };

        let record = &mut self.records[index];
        let kind = record.kind();
        let mut warnings = Vec::new();

        match record {
            Record::Student(student) => {
                if let Some(program) = provided(changes.program.as_ref()) {
                    student.program = program.to_string();
                }
                if let Some(year_text) = provided(changes.year.as_ref()) {
                    match parse_year(year_text) {
                        Ok(year) => student.year = year,
                        Err(_) => warnings.push(FieldWarning::InvalidYear {
                            value: year_text.to_string(),
                        }),
                    }
                }
                for (field, value) in [("department", &changes.department), ("title", &changes.title)] {
                    if provided(value.as_ref()).is_some() {
                        warnings.push(FieldWarning::NotApplicable { field, kind });
                    }
                }
            }
            Record::Faculty(faculty) => {
                if let Some(department) = provided(changes.department.as_ref()) {
                    faculty.department = department.to_string();
                }
                if let Some(title) = provided(changes.title.as_ref()) {
                    faculty.title = title.to_string();
                }
                for (field, value) in [("program", &changes.program), ("year", &changes.year)] {
                    if provided(value.as_ref()).is_some() {
                        warnings.push(FieldWarning::NotApplicable { field, kind });
                    }
                }
            }
        }

        let identity = record.identity_mut();
        if let Some(name) = provided(changes.name.as_ref()) {
            identity.name = name.to_string();
        }
        if let Some(contact) = provided(changes.contact.as_ref()) {
            identity.contact = contact.to_string();
        }

        let id = identity.id;
        for warning in &warnings {
            warn!(id, "{}", warning);
        }
        info!(id, "Updated {} record", kind);
        Ok(UpdateOutcome::Updated { id, warnings })
    }

    /// Delete a record once the caller has confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if `id_text` is not an integer.
    pub fn delete(&mut self, id_text: &str, confirmed: bool) -> Result<DeleteOutcome> {
        let Some(index) = self.position_of(id_text)? else {
            return Ok(DeleteOutcome::NotFound);
        };

        if !confirmed {
            debug!(id = self.records[index].id(), "Deletion cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let removed = self.records.remove(index);
        info!(id = removed.id(), "Deleted {} record", removed.kind());
        Ok(DeleteOutcome::Deleted(removed))
    }

    /// Write every record and the counter to disk.
    ///
    /// Each file is written to a temporary sibling and renamed into place,
    /// so a failed save leaves the previous contents untouched.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or a file cannot be
    /// written. In-memory state is never affected.
    pub fn save(&self) -> Result<usize> {
        for path in [&self.paths.data_file, &self.paths.counter_file] {
            create_parent_dirs(path)?;
        }

        replace_file(&self.paths.data_file, |file| {
            let mut wtr = codec::writer(file);
            for record in &self.records {
                wtr.write_record(codec::encode(record))?;
            }
            wtr.flush()
        })
        .map_err(|source| Error::DataWrite {
            path: self.paths.data_file.clone(),
            source,
        })?;

        replace_file(&self.paths.counter_file, |file| {
            write!(file, "{}", self.last_id)
        })
        .map_err(|source| Error::CounterWrite {
            path: self.paths.counter_file.clone(),
            source,
        })?;

        info!(
            "Saved {} records to {}",
            self.records.len(),
            self.paths.data_file.display()
        );
        Ok(self.records.len())
    }

    /// Get store statistics.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let students = self
            .records
            .iter()
            .filter(|r| r.kind() == RecordKind::Student)
            .count();

        let data_file_bytes = fs::metadata(&self.paths.data_file).map_or(0, |m| m.len());

        StoreStats {
            total: self.records.len(),
            students,
            faculty: self.records.len() - students,
            last_id: self.last_id,
            data_file_bytes,
        }
    }

    /// Index of the record matching `id_text`, if any.
    fn position_of(&self, id_text: &str) -> Result<Option<usize>> {
        let id = parse_id(id_text)?;
        Ok(id.and_then(|id| self.records.iter().position(|r| r.id() == id)))
    }

    fn load(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        if let Err(err) = self.load_rows(&mut report) {
            warn!("Load stopped early: {}", err);
            report.failure = Some(err.to_string());
            return report;
        }

        if let Err(err) = self.load_counter(&mut report) {
            warn!("Load stopped early: {}", err);
            report.failure = Some(err.to_string());
            return report;
        }

        info!(
            "Loaded {} records ({} skipped), last id {}",
            report.loaded,
            report.skipped.len(),
            self.last_id
        );
        report
    }

    fn load_rows(&mut self, report: &mut LoadReport) -> Result<()> {
        let path = &self.paths.data_file;
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No data file at {}, starting empty", path.display());
                return Ok(());
            }
            Err(source) => {
                return Err(Error::DataRead {
                    path: path.clone(),
                    source,
                })
            }
        };

        let mut rdr = codec::reader(BufReader::new(file));
        let mut row = csv::StringRecord::new();
        let mut seen = HashSet::new();

        loop {
            let (line, decoded) = match rdr.read_record(&mut row) {
                Ok(false) => break,
                Ok(true) => {
                    let decoded = codec::decode(&row).and_then(|record| {
                        if seen.contains(&record.id()) {
                            Err(RowError::DuplicateId(record.id()))
                        } else {
                            Ok(record)
                        }
                    });
                    (row.position().map_or(0, csv::Position::line), decoded)
                }
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => (
                    err.position().map_or(0, csv::Position::line),
                    Err(RowError::Malformed(err.to_string())),
                ),
            };

            match decoded {
                Ok(record) => {
                    seen.insert(record.id());
                    self.last_id = self.last_id.max(record.id());
                    self.records.push(record);
                    report.loaded += 1;
                }
                Err(reason) => {
                    warn!("Skipping line {} of {}: {}", line, path.display(), reason);
                    report.skipped.push(SkippedRow { line, reason });
                }
            }
        }

        Ok(())
    }

    fn load_counter(&mut self, report: &mut LoadReport) -> Result<()> {
        let path = &self.paths.counter_file;
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No counter file at {}", path.display());
                return Ok(());
            }
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                warn!("Ignoring unreadable counter file {}", path.display());
                report.counter = CounterStatus::Ignored;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        match text.trim().parse::<RecordId>() {
            Ok(value) => {
                self.last_id = self.last_id.max(value);
                report.counter = CounterStatus::Read(value);
            }
            Err(_) => {
                warn!(
                    "Ignoring corrupt counter file {}: {:?}",
                    path.display(),
                    text.trim()
                );
                report.counter = CounterStatus::Ignored;
            }
        }
        Ok(())
    }
}

/// The value of an update field, unless it means "keep".
fn provided(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn parse_year(text: &str) -> Result<i32> {
    text.trim()
        .parse()
        .map_err(|_| Error::invalid_year(text))
}

/// Parse a lookup id. Zero and negative integers match nothing.
fn parse_id(text: &str) -> Result<Option<RecordId>> {
    let trimmed = text.trim();
    let (digits, negative) = match trimmed.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (trimmed.strip_prefix('+').unwrap_or(trimmed), false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_id(text));
    }
    if negative {
        return Ok(None);
    }
    // All digits, so the only parse failure left is overflow.
    Ok(digits.parse::<RecordId>().ok().filter(|id| *id > 0))
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Write `path` through a temporary sibling file and rename it into place.
fn replace_file(
    path: &Path,
    write: impl FnOnce(&mut File) -> io::Result<()>,
) -> io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = File::create(&tmp_path).and_then(|mut file| {
        write(&mut file)?;
        file.sync_all()
    });
    let result = result.and_then(|()| fs::rename(&tmp_path, path));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
