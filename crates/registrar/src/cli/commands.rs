//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::store::RecordUpdate;

/// Arguments for adding a student.
#[derive(Debug, Args)]
pub struct AddStudentCommand {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Contact address
    #[arg(long)]
    pub contact: String,

    /// Program or major
    #[arg(long)]
    pub program: String,

    /// Enrollment year
    #[arg(long, allow_hyphen_values = true)]
    pub year: String,
}

/// Arguments for adding a faculty member.
#[derive(Debug, Args)]
pub struct AddFacultyCommand {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Contact address
    #[arg(long)]
    pub contact: String,

    /// Department
    #[arg(long)]
    pub department: String,

    /// Academic title
    #[arg(long)]
    pub title: String,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record id
    #[arg(allow_hyphen_values = true)]
    pub id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Name or part of a name (case-insensitive)
    pub name: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Update command arguments.
///
/// Omitted or empty options keep the current value.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Record id
    #[arg(allow_hyphen_values = true)]
    pub id: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New contact address
    #[arg(long)]
    pub contact: Option<String>,

    /// New program (students only)
    #[arg(long)]
    pub program: Option<String>,

    /// New enrollment year (students only)
    #[arg(long, allow_hyphen_values = true)]
    pub year: Option<String>,

    /// New department (faculty only)
    #[arg(long)]
    pub department: Option<String>,

    /// New academic title (faculty only)
    #[arg(long)]
    pub title: Option<String>,
}

impl UpdateCommand {
    /// The field changes requested on the command line.
    #[must_use]
    pub fn changes(&self) -> RecordUpdate {
        RecordUpdate {
            name: self.name.clone(),
            contact: self.contact.clone(),
            program: self.program.clone(),
            year: self.year.clone(),
            department: self.department.clone(),
            title: self.title.clone(),
        }
    }
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Record id
    #[arg(allow_hyphen_values = true)]
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One summary line per record
    #[default]
    Plain,
    /// JSON output
    Json,
}
