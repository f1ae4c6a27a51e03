//! Name path → handle table rebuilt on every render

use formloom_core::{FormError, Path, Result};
use indexmap::IndexMap;

use crate::handles::{ChildFormsHandle, FieldHandle, ManyHandle};

/// An addressable node
#[derive(Clone, Debug)]
pub enum MappingEntry {
    Field(FieldHandle),
    Many(ManyHandle),
    ManyChildForms(ChildFormsHandle),
}

impl MappingEntry {
    pub fn path(&self) -> &Path {
        match self {
            MappingEntry::Field(handle) => handle.path(),
            MappingEntry::Many(handle) => handle.path(),
            MappingEntry::ManyChildForms(handle) => handle.path(),
        }
    }
}

/// Entries in render order
#[derive(Clone, Debug, Default)]
pub struct PathMapping {
    entries: IndexMap<String, MappingEntry>,
}

impl PathMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry. A later node with the same name path wins.
    pub(crate) fn insert(&mut self, name_path: String, entry: MappingEntry) {
        self.entries.insert(name_path, entry);
    }

    pub fn get(&self, name_path: &str) -> Option<&MappingEntry> {
        self.entries.get(name_path)
    }

    pub fn entry(&self, name_path: &str) -> Result<&MappingEntry> {
        self.get(name_path)
            .ok_or_else(|| FormError::UnknownName(name_path.to_string()))
    }

    pub fn field(&self, name_path: &str) -> Result<&FieldHandle> {
        match self.entry(name_path)? {
            MappingEntry::Field(handle) => Ok(handle),
            _ => Err(wrong(name_path, "field")),
        }
    }

    pub fn many(&self, name_path: &str) -> Result<&ManyHandle> {
        match self.entry(name_path)? {
            MappingEntry::Many(handle) => Ok(handle),
            _ => Err(wrong(name_path, "many container")),
        }
    }

    pub fn child_forms(&self, name_path: &str) -> Result<&ChildFormsHandle> {
        match self.entry(name_path)? {
            MappingEntry::ManyChildForms(handle) => Ok(handle),
            _ => Err(wrong(name_path, "child forms container")),
        }
    }

    pub fn contains(&self, name_path: &str) -> bool {
        self.entries.contains_key(name_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}

fn wrong(name_path: &str, expected: &'static str) -> FormError {
    FormError::WrongEntry {
        name: name_path.to_string(),
        expected,
    }
}
