//! Core record types for registrar.
//!
//! A [`Record`] is either a [`Student`] or a [`Faculty`] member. Both carry
//! the same [`Identity`] block; the variant decides the two extra fields and
//! the tag used when the record is persisted.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a record by the store.
pub type RecordId = u64;

/// The kind of record, independent of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A student.
    Student,
    /// A faculty member.
    Faculty,
}

impl RecordKind {
    /// The tag written as the first field of a persisted row.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Student => "estudiante",
            Self::Faculty => "docente",
        }
    }

    /// Resolve a persisted row tag back to a kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "estudiante" => Some(Self::Student),
            "docente" => Some(Self::Faculty),
            _ => None,
        }
    }

    /// Human-readable label used in summaries.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Faculty => "Faculty",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Faculty => write!(f, "faculty"),
        }
    }
}

/// Fields shared by every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier (assigned by the store).
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Contact address. Not validated.
    pub contact: String,
}

/// A student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Identity block.
    #[serde(flatten)]
    pub identity: Identity,
    /// Program or major.
    pub program: String,
    /// Enrollment year.
    pub year: i32,
}

/// A faculty record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    /// Identity block.
    #[serde(flatten)]
    pub identity: Identity,
    /// Department.
    pub department: String,
    /// Academic title.
    pub title: String,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// A student.
    Student(Student),
    /// A faculty member.
    Faculty(Faculty),
}

impl Record {
    /// Build a new student record.
    #[must_use]
    pub fn student(
        id: RecordId,
        name: impl Into<String>,
        contact: impl Into<String>,
        program: impl Into<String>,
        year: i32,
    ) -> Self {
        Self::Student(Student {
            identity: Identity {
                id,
                name: name.into(),
                contact: contact.into(),
            },
            program: program.into(),
            year,
        })
    }

    /// Build a new faculty record.
    #[must_use]
    pub fn faculty(
        id: RecordId,
        name: impl Into<String>,
        contact: impl Into<String>,
        department: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self::Faculty(Faculty {
            identity: Identity {
                id,
                name: name.into(),
                contact: contact.into(),
            },
            department: department.into(),
            title: title.into(),
        })
    }

    /// The kind of this record.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Student(_) => RecordKind::Student,
            Self::Faculty(_) => RecordKind::Faculty,
        }
    }

    /// Shared identity fields.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        match self {
            Self::Student(s) => &s.identity,
            Self::Faculty(f) => &f.identity,
        }
    }

    /// Mutable access to the shared identity fields.
    ///
    /// The id is public on [`Identity`]; callers inside the store never
    /// change it.
    pub(crate) fn identity_mut(&mut self) -> &mut Identity {
        match self {
            Self::Student(s) => &mut s.identity,
            Self::Faculty(f) => &mut f.identity,
        }
    }

    /// The record identifier.
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.identity().id
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity().name
    }

    /// The contact address.
    #[must_use]
    pub fn contact(&self) -> &str {
        &self.identity().contact
    }

    /// Single-line, human-readable summary of the record.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let identity = self.identity();
        write!(
            f,
            "ID: {} | {}: {} | Contact: {} | ",
            identity.id,
            self.kind().label(),
            identity.name,
            identity.contact
        )?;
        match self {
            Self::Student(s) => write!(f, "Program: {} | Year: {}", s.program, s.year),
            Self::Faculty(fa) => write!(f, "Department: {} | Title: {}", fa.department, fa.title),
        }
    }
}
