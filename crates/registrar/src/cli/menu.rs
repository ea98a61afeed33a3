//! Interactive numbered menu.
//!
//! The menu reads one answer per line and writes prompts and results to its
//! output, so it can be driven by a terminal or by a test buffer alike.

use std::io::{self, BufRead, Write};

use tracing::debug;

use super::require_fields;
use crate::error::Error;
use crate::record::Record;
use crate::store::{DeleteOutcome, RecordUpdate, Store, UpdateOutcome};

const MENU: &str = "\
========================================
      ACADEMIC RECORDS
========================================
1. Add student
2. Add faculty member
3. List all records
4. Find by id
5. Find by name
6. Update record
7. Delete record
8. Save
9. Exit";

/// How the menu session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuExit {
    /// The user chose to save and exit, and the save succeeded.
    Saved,
    /// The user chose to exit without saving.
    Discarded,
    /// Input ran out before the user chose to exit.
    EndOfInput,
}

/// Interactive menu bound to a store.
#[derive(Debug)]
pub struct Menu<'a, R, W> {
    store: &'a mut Store,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    /// Create a menu reading answers from `input` and writing to `output`.
    pub fn new(store: &'a mut Store, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Run until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub fn run(&mut self) -> io::Result<MenuExit> {
        loop {
            match self.step() {
                Ok(Some(exit)) => return Ok(exit),
                Ok(None) => {}
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(MenuExit::EndOfInput)
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn step(&mut self) -> io::Result<Option<MenuExit>> {
        writeln!(self.output, "\n{MENU}")?;
        let choice = self.prompt("\nSelect an option (1-9): ")?;
        debug!("Menu option '{}'", choice);

        match choice.as_str() {
            "1" => self.add_student()?,
            "2" => self.add_faculty()?,
            "3" => self.list()?,
            "4" => {
                let id = self.prompt("Id to find: ")?;
                self.find_by_id(&id)?;
            }
            "5" => self.find_by_name()?,
            "6" => self.update()?,
            "7" => self.delete()?,
            "8" => {
                self.save()?;
            }
            "9" => return self.exit(),
            _ => writeln!(self.output, "Invalid option. Try again.")?,
        }
        Ok(None)
    }

    fn add_student(&mut self) -> io::Result<()> {
        let name = self.prompt("Name: ")?;
        let contact = self.prompt("Contact: ")?;
        let program = self.prompt("Program: ")?;
        let year = self.prompt("Year: ")?;

        let result = require_fields(&[
            ("name", name.as_str()),
            ("contact", contact.as_str()),
            ("program", program.as_str()),
            ("year", year.as_str()),
        ])
        .and_then(|()| self.store.add_student(&name, &contact, &program, &year));

        match result {
            Ok(id) => writeln!(self.output, "Student added with id {id}."),
            Err(err) => self.report(&err),
        }
    }

    fn add_faculty(&mut self) -> io::Result<()> {
        let name = self.prompt("Name: ")?;
        let contact = self.prompt("Contact: ")?;
        let department = self.prompt("Department: ")?;
        let title = self.prompt("Title: ")?;

        let result = require_fields(&[
            ("name", name.as_str()),
            ("contact", contact.as_str()),
            ("department", department.as_str()),
            ("title", title.as_str()),
        ])
        .and_then(|()| self.store.add_faculty(&name, &contact, &department, &title));

        match result {
            Ok(id) => writeln!(self.output, "Faculty member added with id {id}."),
            Err(err) => self.report(&err),
        }
    }

    fn list(&mut self) -> io::Result<()> {
        let lines = self.store.list_all();
        if lines.is_empty() {
            return writeln!(self.output, "No records in the system.");
        }
        writeln!(self.output, "All records:")?;
        for line in lines {
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }

    /// Show the record with `id`, returning whether it exists.
    fn find_by_id(&mut self, id: &str) -> io::Result<bool> {
        match self.store.find_by_id(id) {
            Ok(Some(record)) => {
                writeln!(self.output, "Record found:\n{record}")?;
                Ok(true)
            }
            Ok(None) => {
                writeln!(self.output, "No record has id {id}.")?;
                Ok(false)
            }
            Err(err) => {
                self.report(&err)?;
                Ok(false)
            }
        }
    }

    fn find_by_name(&mut self) -> io::Result<()> {
        let query = self.prompt("Name to find: ")?;
        match self.store.find_by_name(&query) {
            Ok(records) if records.is_empty() => {
                writeln!(self.output, "No records match that name.")
            }
            Ok(records) => {
                writeln!(self.output, "Found {} records:", records.len())?;
                for record in records {
                    writeln!(self.output, "{record}")?;
                }
                Ok(())
            }
            Err(err) => self.report(&err),
        }
    }

    fn update(&mut self) -> io::Result<()> {
        let id = self.prompt("Id of the record to update: ")?;
        if !self.find_by_id(&id)? {
            return Ok(());
        }
        let Some(current) = self.store.find_by_id(&id).ok().flatten().cloned() else {
            return Ok(());
        };

        writeln!(self.output, "Enter new values (leave blank to keep the current one):")?;
        let mut changes = RecordUpdate::default();
        match &current {
            Record::Student(s) => {
                changes.program = Some(self.prompt(&format!("Program [{}]: ", s.program))?);
                changes.year = Some(self.prompt(&format!("Year [{}]: ", s.year))?);
            }
            Record::Faculty(f) => {
                changes.department =
                    Some(self.prompt(&format!("Department [{}]: ", f.department))?);
                changes.title = Some(self.prompt(&format!("Title [{}]: ", f.title))?);
            }
        }
        changes.name = Some(self.prompt(&format!("Name [{}]: ", current.name()))?);
        changes.contact = Some(self.prompt(&format!("Contact [{}]: ", current.contact()))?);

        match self.store.update(&id, &changes) {
            Ok(UpdateOutcome::Updated { warnings, .. }) => {
                for warning in warnings {
                    writeln!(self.output, "Warning: {warning}")?;
                }
                writeln!(self.output, "Record updated.")
            }
            Ok(UpdateOutcome::NotFound) => writeln!(self.output, "No record has id {id}."),
            Err(err) => self.report(&err),
        }
    }

    fn delete(&mut self) -> io::Result<()> {
        let id = self.prompt("Id of the record to delete: ")?;
        if !self.find_by_id(&id)? {
            return Ok(());
        }

        let answer = self.prompt("Delete this record? (y/n): ")?;
        let confirmed = matches!(answer.to_lowercase().as_str(), "y" | "yes");

        match self.store.delete(&id, confirmed) {
            Ok(DeleteOutcome::Deleted(_)) => writeln!(self.output, "Record deleted."),
            Ok(DeleteOutcome::Cancelled) => writeln!(self.output, "Deletion cancelled."),
            Ok(DeleteOutcome::NotFound) => writeln!(self.output, "No record has id {id}."),
            Err(err) => self.report(&err),
        }
    }

    fn save(&mut self) -> io::Result<bool> {
        match self.store.save() {
            Ok(count) => {
                writeln!(self.output, "Saved {count} records.")?;
                Ok(true)
            }
            Err(err) => {
                writeln!(self.output, "Error saving data: {err}")?;
                Ok(false)
            }
        }
    }

    fn exit(&mut self) -> io::Result<Option<MenuExit>> {
        writeln!(
            self.output,
            "1. Save and exit\n2. Exit without saving\n3. Back to the menu"
        )?;
        match self.prompt("Select an option (1-3): ")?.as_str() {
            "1" => {
                if self.save()? {
                    return Ok(Some(MenuExit::Saved));
                }
                writeln!(self.output, "Staying in the menu so no changes are lost.")?;
            }
            "2" => {
                writeln!(self.output, "Exiting without saving.")?;
                return Ok(Some(MenuExit::Discarded));
            }
            "3" => {}
            _ => writeln!(self.output, "Invalid option. Back to the menu.")?,
        }
        Ok(None)
    }

    fn report(&mut self, err: &Error) -> io::Result<()> {
        writeln!(self.output, "Error: {err}")
    }

    /// Print `label` and read one trimmed line.
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        Ok(line.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_menu(store: &mut Store, script: &str) -> (MenuExit, String) {
        let mut output = Vec::new();
        let exit = Menu::new(store, Cursor::new(script.as_bytes()), &mut output)
            .run()
            .unwrap();
        (exit, String::from_utf8(output).unwrap())
    }

    fn create_test_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open_in_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn test_add_and_list() {
        let (_dir, mut store) = create_test_store();
        let script = "1\nAna\na@x\nCS\n2024\n2\nBob\nb@x\nMath\nPhD\n3\n";

        let (exit, output) = run_menu(&mut store, script);
        assert_eq!(exit, MenuExit::EndOfInput);
        assert!(output.contains("Student added with id 1."));
        assert!(output.contains("Faculty member added with id 2."));
        assert!(output.contains("All records:\nID: 1 | Student: Ana"));
        assert!(output.contains("ID: 2 | Faculty: Bob"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_student_bad_year() {
        let (_dir, mut store) = create_test_store();
        let (_, output) = run_menu(&mut store, "1\nAna\na@x\nCS\nsoon\n");

        assert!(output.contains("Error: enrollment year must be an integer"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_requires_all_fields() {
        let (_dir, mut store) = create_test_store();
        let (_, output) = run_menu(&mut store, "2\nBob\n\nMath\nPhD\n");

        assert!(output.contains("field 'contact' is required"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_reports_exhausted_ids() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ultimo_id.txt"), u64::MAX.to_string()).unwrap();
        let mut store = Store::open_in_dir(dir.path());

        let (exit, output) = run_menu(&mut store, "2\nBob\nb@x\nMath\nPhD\n");
        assert_eq!(exit, MenuExit::EndOfInput);
        assert!(output.contains("Error: no identifiers left"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_empty() {
        let (_dir, mut store) = create_test_store();
        let (_, output) = run_menu(&mut store, "3\n");
        assert!(output.contains("No records in the system."));
    }

    #[test]
    fn test_find_by_id_and_name() {
        let (_dir, mut store) = create_test_store();
        store.add_student("Ana", "a@x", "CS", "2024").unwrap();

        let (_, output) = run_menu(&mut store, "4\n1\n4\n7\n4\nabc\n5\nan\n5\n\n");
        assert!(output.contains("Record found:\nID: 1 | Student: Ana"));
        assert!(output.contains("No record has id 7."));
        assert!(output.contains("Error: record id must be a number"));
        assert!(output.contains("Found 1 records:"));
        assert!(output.contains("Error: a name is required to search"));
    }

    #[test]
    fn test_update_keeps_blank_fields() {
        let (_dir, mut store) = create_test_store();
        store.add_student("Ana", "a@x", "CS", "2024").unwrap();

        // program, year, name, contact
        let (_, output) = run_menu(&mut store, "6\n1\nMath\nabc\n\nana@new\n");
        assert!(output.contains("Warning: year must be a number"));
        assert!(output.contains("Record updated."));
        assert_eq!(
            store.records()[0],
            Record::student(1, "Ana", "ana@new", "Math", 2024)
        );
    }

    #[test]
    fn test_delete_cancelled_and_confirmed() {
        let (_dir, mut store) = create_test_store();
        store.add_faculty("Bob", "b@x", "Math", "PhD").unwrap();

        let (_, output) = run_menu(&mut store, "7\n1\nn\n");
        assert!(output.contains("Deletion cancelled."));
        assert_eq!(store.len(), 1);

        let (_, output) = run_menu(&mut store, "7\n1\ny\n");
        assert!(output.contains("Record deleted."));
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_exit() {
        let (dir, mut store) = create_test_store();
        store.add_faculty("Bob", "b@x", "Math", "PhD").unwrap();

        let (exit, output) = run_menu(&mut store, "9\n1\n");
        assert_eq!(exit, MenuExit::Saved);
        assert!(output.contains("Saved 1 records."));
        assert!(dir.path().join("registros.csv").exists());
    }

    #[test]
    fn test_exit_without_saving() {
        let (dir, mut store) = create_test_store();
        store.add_faculty("Bob", "b@x", "Math", "PhD").unwrap();

        let (exit, _) = run_menu(&mut store, "9\n3\n9\n2\n");
        assert_eq!(exit, MenuExit::Discarded);
        assert!(!dir.path().join("registros.csv").exists());
    }

    #[test]
    fn test_invalid_option() {
        let (_dir, mut store) = create_test_store();
        let (_, output) = run_menu(&mut store, "42\n");
        assert!(output.contains("Invalid option. Try again."));
    }
}
