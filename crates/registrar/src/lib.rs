//! `registrar` - A catalog of student and faculty records
//!
//! This library provides the record model, the in-memory store with its
//! flat-file persistence, and the command-line front end used by the
//! `registrar` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Faculty, Identity, Record, RecordId, RecordKind, Student};
pub use store::{
    DeleteOutcome, FieldWarning, LoadReport, RecordUpdate, Store, StorePaths, StoreStats,
    UpdateOutcome,
};
