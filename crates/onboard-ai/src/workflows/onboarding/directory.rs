use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::StudentId;

/// Read-only lookup of canonical profile names by student id.
pub trait StudentDirectory: Send + Sync {
    fn name_for(&self, student_id: &StudentId) -> Result<Option<String>, DirectoryError>;
}

/// Error enumeration for directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read student roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid student roster data: {0}")]
    Csv(#[from] csv::Error),
    #[error("student directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Roster loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct RosterDirectory {
    names: HashMap<StudentId, String>,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    student_id: String,
    #[serde(default)]
    name: String,
}

impl RosterDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a `student_id,name` CSV roster; rows with a blank id are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DirectoryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut names = HashMap::new();
        for row in csv_reader.deserialize::<RosterRow>() {
            let row = row?;
            if let Some(student_id) = StudentId::parse(&row.student_id) {
                names.insert(student_id, row.name);
            }
        }

        Ok(Self { names })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let names = entries
            .into_iter()
            .filter_map(|(id, name)| {
                let id: String = id.into();
                StudentId::parse(&id).map(|id| (id, name.into()))
            })
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl StudentDirectory for RosterDirectory {
    fn name_for(&self, student_id: &StudentId) -> Result<Option<String>, DirectoryError> {
        Ok(self
            .names
            .get(student_id)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string))
    }
}
