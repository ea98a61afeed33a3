//! `registrar` - CLI for the academic record catalog
//!
//! Each invocation opens the store once, runs one command, and saves before
//! exiting if the command changed anything. Bad input exits with status 2.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;

use registrar::cli::{
    require_fields, write_records, AddFacultyCommand, AddStudentCommand, Cli, Command,
    ConfigCommand, DeleteCommand, ListCommand, Menu, MenuExit, OutputFormat, UpdateCommand,
};
use registrar::{init_logging, Config, DeleteOutcome, Store, UpdateOutcome};

/// Exit status for errors caused by bad input rather than I/O.
const EXIT_INPUT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if is_input_error(&err) {
                ExitCode::from(EXIT_INPUT_ERROR)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load_from(cli.config).context("loading configuration")?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::AddStudent(cmd) => {
            with_store(&config, |store, out| handle_add_student(store, &cmd, out))
        }
        Command::AddFaculty(cmd) => {
            with_store(&config, |store, out| handle_add_faculty(store, &cmd, out))
        }
        Command::List(cmd) => with_store(&config, |store, out| {
            handle_list(store, &cmd, out)?;
            Ok(false)
        }),
        Command::Show(cmd) => with_store(&config, |store, out| {
            let records: Vec<_> = store.find_by_id(&cmd.id)?.into_iter().collect();
            let empty = format!("No record has id {}.", cmd.id);
            write_records(out, &records, cmd.format, &empty)?;
            Ok(false)
        }),
        Command::Search(cmd) => with_store(&config, |store, out| {
            let records = store.find_by_name(&cmd.name)?;
            write_records(out, &records, cmd.format, "No records match that name.")?;
            Ok(false)
        }),
        Command::Update(cmd) => with_store(&config, |store, out| handle_update(store, &cmd, out)),
        Command::Delete(cmd) => with_store(&config, |store, out| handle_delete(store, &cmd, out)),
        Command::Stats(cmd) => with_store(&config, |store, out| {
            handle_stats(store, cmd.json, out)?;
            Ok(false)
        }),
        Command::Menu => {
            let mut store = open_store(&config);
            let exit = Menu::new(&mut store, io::stdin().lock(), io::stdout()).run()?;
            if exit == MenuExit::EndOfInput {
                println!();
                println!("Input closed; exiting without saving.");
            }
            Ok(())
        }
    }
}

fn open_store(config: &Config) -> Store {
    let store = Store::open(config.store_paths());
    if let Some(failure) = &store.load_report().failure {
        eprintln!("Warning: data could not be fully loaded: {failure}");
    }
    store
}

/// Open the store, run `command` against it, and save if it reports a change.
fn with_store<F>(config: &Config, command: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut Store, &mut io::StdoutLock<'static>) -> anyhow::Result<bool>,
{
    let mut store = open_store(config);
    let changed = command(&mut store, &mut io::stdout().lock())?;

    if changed {
        let count = store.save().context("saving records")?;
        tracing::debug!("Saved {} records after command", count);
    }
    Ok(())
}

fn is_input_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<registrar::Error>()
        .is_some_and(registrar::Error::is_input_error)
}

fn handle_list(store: &Store, cmd: &ListCommand, out: &mut impl Write) -> anyhow::Result<()> {
    if cmd.format == OutputFormat::Json {
        let records: Vec<_> = store.records().iter().collect();
        write_records(out, &records, cmd.format, "")?;
        return Ok(());
    }

    let lines = store.list_all();
    if lines.is_empty() {
        writeln!(out, "No records in the system.")?;
    }
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn handle_add_student(
    store: &mut Store,
    cmd: &AddStudentCommand,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    require_fields(&[
        ("name", cmd.name.as_str()),
        ("contact", cmd.contact.as_str()),
        ("program", cmd.program.as_str()),
        ("year", cmd.year.as_str()),
    ])?;
    let id = store.add_student(&cmd.name, &cmd.contact, &cmd.program, &cmd.year)?;
    writeln!(out, "Student added with id {id}.")?;
    Ok(true)
}

fn handle_add_faculty(
    store: &mut Store,
    cmd: &AddFacultyCommand,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    require_fields(&[
        ("name", cmd.name.as_str()),
        ("contact", cmd.contact.as_str()),
        ("department", cmd.department.as_str()),
        ("title", cmd.title.as_str()),
    ])?;
    let id = store.add_faculty(&cmd.name, &cmd.contact, &cmd.department, &cmd.title)?;
    writeln!(out, "Faculty member added with id {id}.")?;
    Ok(true)
}

fn handle_update(
    store: &mut Store,
    cmd: &UpdateCommand,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    match store.update(&cmd.id, &cmd.changes())? {
        UpdateOutcome::Updated { id, warnings } => {
            for warning in warnings {
                writeln!(out, "Warning: {warning}")?;
            }
            writeln!(out, "Record {id} updated.")?;
            Ok(true)
        }
        UpdateOutcome::NotFound => bail!("no record has id {}", cmd.id),
    }
}

fn handle_delete(
    store: &mut Store,
    cmd: &DeleteCommand,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let Some(record) = store.find_by_id(&cmd.id)? else {
        bail!("no record has id {}", cmd.id);
    };

    let confirmed = if cmd.yes {
        true
    } else {
        writeln!(out, "{record}")?;
        write!(out, "Delete this record? (y/n): ")?;
        out.flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    };

    match store.delete(&cmd.id, confirmed)? {
        DeleteOutcome::Deleted(record) => {
            writeln!(out, "Deleted record {}.", record.id())?;
            Ok(true)
        }
        DeleteOutcome::Cancelled => {
            writeln!(out, "Deletion cancelled.")?;
            Ok(false)
        }
        DeleteOutcome::NotFound => bail!("no record has id {}", cmd.id),
    }
}

fn handle_stats(store: &Store, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let stats = store.stats();
    let report = store.load_report();

    if json {
        let status = serde_json::json!({
            "stats": stats,
            "paths": store.paths(),
            "skipped_rows": report.skipped.len(),
            "load_failure": report.failure,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
    } else {
        writeln!(out, "registrar stats")?;
        writeln!(out, "---------------")?;
        writeln!(out, "Records:       {}", stats.total)?;
        writeln!(out, "  Students:    {}", stats.students)?;
        writeln!(out, "  Faculty:     {}", stats.faculty)?;
        writeln!(out, "Last id:       {}", stats.last_id)?;
        writeln!(out, "Data file:     {}", store.paths().data_file.display())?;
        writeln!(out, "Counter file:  {}", store.paths().counter_file.display())?;
        writeln!(out, "Data size:     {} bytes", stats.data_file_bytes)?;
        writeln!(out, "Skipped rows:  {}", report.skipped.len())?;
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let paths = config.store_paths();
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Data file:          {}", paths.data_file.display());
                println!("  Counter file:       {}", paths.counter_file.display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn test_handle_add_student_rejects_empty_field() {
        let (_dir, mut store) = create_test_store();
        let cmd = AddStudentCommand {
            name: "Ana".to_string(),
            contact: String::new(),
            program: "CS".to_string(),
            year: "2024".to_string(),
        };
        let mut out = Vec::new();

        assert!(handle_add_student(&mut store, &cmd, &mut out).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_handle_add_faculty() {
        let (_dir, mut store) = create_test_store();
        let cmd = AddFacultyCommand {
            name: "Bob".to_string(),
            contact: "b@x".to_string(),
            department: "Math".to_string(),
            title: "PhD".to_string(),
        };
        let mut out = Vec::new();

        assert!(handle_add_faculty(&mut store, &cmd, &mut out).unwrap());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Faculty member added with id 1.\n"
        );
    }

    #[test]
    fn test_handle_delete_with_yes() {
        let (_dir, mut store) = create_test_store();
        store.add_faculty("Bob", "b@x", "Math", "PhD").unwrap();
        let cmd = DeleteCommand {
            id: "1".to_string(),
            yes: true,
        };
        let mut out = Vec::new();

        assert!(handle_delete(&mut store, &cmd, &mut out).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_handle_update_not_found() {
        let (_dir, mut store) = create_test_store();
        let cmd = UpdateCommand {
            id: "3".to_string(),
            name: Some("X".to_string()),
            contact: None,
            program: None,
            year: None,
            department: None,
            title: None,
        };
        let mut out = Vec::new();

        let err = handle_update(&mut store, &cmd, &mut out).unwrap_err();
        assert!(err.to_string().contains("no record has id 3"));
    }

    #[test]
    fn test_handle_stats_json() {
        let (_dir, mut store) = create_test_store();
        store.add_student("Ana", "a@x", "CS", "2024").unwrap();
        let mut out = Vec::new();

        handle_stats(&store, true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["stats"]["students"], 1);
        assert_eq!(value["stats"]["last_id"], 1);
    }

    #[test]
    fn test_handle_list_plain() {
        let (_dir, mut store) = create_test_store();
        let cmd = ListCommand {
            format: OutputFormat::Plain,
        };

        let mut out = Vec::new();
        handle_list(&store, &cmd, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No records in the system.\n");

        store.add_faculty("Bob", "b@x", "Math", "PhD").unwrap();
        let mut out = Vec::new();
        handle_list(&store, &cmd, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ID: 1 | Faculty: Bob | Contact: b@x | Department: Math | Title: PhD\n"
        );
    }

    #[test]
    fn test_handle_list_json() {
        let (_dir, mut store) = create_test_store();
        store.add_student("Ana", "a@x", "CS", "2024").unwrap();
        let cmd = ListCommand {
            format: OutputFormat::Json,
        };
        let mut out = Vec::new();

        handle_list(&store, &cmd, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["name"], "Ana");
    }

    #[test]
    fn test_handle_add_faculty_when_ids_exhausted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ultimo_id.txt"), u64::MAX.to_string()).unwrap();
        let mut store = Store::open_in_dir(dir.path());
        let cmd = AddFacultyCommand {
            name: "Bob".to_string(),
            contact: "b@x".to_string(),
            department: "Math".to_string(),
            title: "PhD".to_string(),
        };
        let mut out = Vec::new();

        let err = handle_add_faculty(&mut store, &cmd, &mut out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<registrar::Error>(),
            Some(registrar::Error::IdExhausted { .. })
        ));
        assert!(!is_input_error(&err));
        assert!(store.is_empty());
    }

    #[test]
    fn test_is_input_error() {
        let (_dir, store) = create_test_store();

        let err = anyhow::Error::from(store.find_by_id("abc").unwrap_err());
        assert!(is_input_error(&err));

        let err = anyhow::Error::from(store.find_by_name(" ").unwrap_err()).context("searching");
        assert!(is_input_error(&err));

        assert!(!is_input_error(&anyhow::anyhow!("no record has id 3")));
    }
}
