//! Command-line interface for registrar.
//!
//! This module provides the CLI structure, the interactive menu, and the
//! output helpers shared by the `registrar` binary.

mod commands;
mod menu;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::{Error, Result};
use crate::record::Record;

pub use commands::{
    AddFacultyCommand, AddStudentCommand, ConfigCommand, DeleteCommand, ListCommand,
    OutputFormat, SearchCommand, ShowCommand, StatsCommand, UpdateCommand,
};
pub use menu::{Menu, MenuExit};

/// registrar - Keep a catalog of students and faculty
///
/// Records live in a `;`-delimited data file next to a counter file holding
/// the last identifier handed out.
#[derive(Debug, Parser)]
#[command(name = "registrar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a student
    AddStudent(AddStudentCommand),

    /// Add a faculty member
    AddFaculty(AddFacultyCommand),

    /// List all records
    List(ListCommand),

    /// Show the record with the given id
    Show(ShowCommand),

    /// Search records by name
    Search(SearchCommand),

    /// Update a record
    Update(UpdateCommand),

    /// Delete a record
    Delete(DeleteCommand),

    /// Show record counts and storage details
    Stats(StatsCommand),

    /// Run the interactive menu
    Menu,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

/// Reject empty values for fields the front end treats as required.
///
/// # Errors
///
/// Returns [`Error::MissingField`] naming the first empty field.
pub fn require_fields(fields: &[(&'static str, &str)]) -> Result<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some(&(field, _)) => Err(Error::MissingField { field }),
        None => Ok(()),
    }
}

/// Write `records` to `out` in the requested format.
///
/// Plain output prints `empty_message` when there is nothing to show; JSON
/// output always prints an array.
///
/// # Errors
///
/// Returns an error if writing or JSON serialization fails.
pub fn write_records(
    out: &mut impl Write,
    records: &[&Record],
    format: OutputFormat,
    empty_message: &str,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(records)?)?;
        }
        OutputFormat::Plain if records.is_empty() => writeln!(out, "{empty_message}")?,
        OutputFormat::Plain => {
            for record in records {
                writeln!(out, "{record}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "registrar");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::try_parse_from(["registrar", "-q", "list"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);

        let cli = Cli::try_parse_from(["registrar", "list"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Normal);

        let cli = Cli::try_parse_from(["registrar", "-v", "list"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);

        let cli = Cli::try_parse_from(["registrar", "-vv", "list"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_add_student() {
        let cli = Cli::try_parse_from([
            "registrar",
            "add-student",
            "--name",
            "Ana",
            "--contact",
            "a@x",
            "--program",
            "CS",
            "--year",
            "2024",
        ])
        .unwrap();
        let Command::AddStudent(cmd) = cli.command else {
            panic!("expected add-student");
        };
        assert_eq!(cmd.name, "Ana");
        assert_eq!(cmd.year, "2024");
    }

    #[test]
    fn test_parse_add_faculty_requires_title() {
        let result = Cli::try_parse_from([
            "registrar",
            "add-faculty",
            "--name",
            "Bob",
            "--contact",
            "b@x",
            "--department",
            "Math",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_update() {
        let cli =
            Cli::try_parse_from(["registrar", "update", "4", "--year", "2030", "--name", "Ana"])
                .unwrap();
        let Command::Update(cmd) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(cmd.id, "4");
        assert_eq!(cmd.changes().year.as_deref(), Some("2030"));
    }

    #[test]
    fn test_parse_delete_with_yes() {
        let cli = Cli::try_parse_from(["registrar", "delete", "2", "--yes"]).unwrap();
        assert!(matches!(cli.command, Command::Delete(DeleteCommand { yes: true, .. })));
    }

    #[test]
    fn test_parse_list_json() {
        let cli = Cli::try_parse_from(["registrar", "list", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::List(ListCommand {
                format: OutputFormat::Json
            })
        ));
    }

    #[test]
    fn test_parse_menu_with_config() {
        let cli = Cli::try_parse_from(["registrar", "-c", "/custom/config.toml", "menu"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Menu));
    }

    #[test]
    fn test_require_fields() {
        assert!(require_fields(&[("name", "Ana"), ("contact", "a@x")]).is_ok());

        let err = require_fields(&[("name", "Ana"), ("contact", "  ")]).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "contact" }));
    }

    #[test]
    fn test_write_records_plain() {
        let record = Record::student(1, "Ana", "a@x", "CS", 2024);
        let mut out = Vec::new();
        write_records(&mut out, &[&record], OutputFormat::Plain, "none").unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "ID: 1 | Student: Ana | Contact: a@x | Program: CS | Year: 2024\n"
        );
    }

    #[test]
    fn test_write_records_empty() {
        let mut out = Vec::new();
        write_records(&mut out, &[], OutputFormat::Plain, "No records.").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No records.\n");

        let mut out = Vec::new();
        write_records(&mut out, &[], OutputFormat::Json, "No records.").unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
    }

    #[test]
    fn test_write_records_json() {
        let record = Record::faculty(2, "Bob", "b@x", "Math", "PhD");
        let mut out = Vec::new();
        write_records(&mut out, &[&record], OutputFormat::Json, "").unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["kind"], "faculty");
        assert_eq!(value[0]["title"], "PhD");
    }
}
