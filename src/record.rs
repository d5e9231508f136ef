//! Citation record data structures.
//!
//! A [`Record`] is one bibliography entry: an [`EntryType`] tag, the citation key,
//! and a case-insensitive mapping from field name to raw field text.

use crate::bibtex::parse_names;
use crate::{Author, BibbleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name under which the citation key is exposed to templates.
pub(crate) const KEY_FIELD: &str = "key";

/// Entry type tag of a citation record.
///
/// Formatting rules dispatch on this tag; types without a dedicated rule are kept
/// as [`EntryType::Other`] with their lowercased name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Article,
    Book,
    Booklet,
    InBook,
    InCollection,
    InProceedings,
    Manual,
    MastersThesis,
    Misc,
    PhdThesis,
    Proceedings,
    TechReport,
    Unpublished,
    Other(String),
}

impl EntryType {
    /// Maps a (case-insensitive) type name to an entry type.
    ///
    /// `conference` is the BibTeX alias of `inproceedings`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "article" => EntryType::Article,
            "book" => EntryType::Book,
            "booklet" => EntryType::Booklet,
            "inbook" => EntryType::InBook,
            "incollection" => EntryType::InCollection,
            "inproceedings" | "conference" => EntryType::InProceedings,
            "manual" => EntryType::Manual,
            "mastersthesis" => EntryType::MastersThesis,
            "misc" => EntryType::Misc,
            "phdthesis" => EntryType::PhdThesis,
            "proceedings" => EntryType::Proceedings,
            "techreport" => EntryType::TechReport,
            "unpublished" => EntryType::Unpublished,
            other => EntryType::Other(other.to_string()),
        }
    }

    /// The lowercase type name as written in a `.bib` file.
    pub fn as_str(&self) -> &str {
        match self {
            EntryType::Article => "article",
            EntryType::Book => "book",
            EntryType::Booklet => "booklet",
            EntryType::InBook => "inbook",
            EntryType::InCollection => "incollection",
            EntryType::InProceedings => "inproceedings",
            EntryType::Manual => "manual",
            EntryType::MastersThesis => "mastersthesis",
            EntryType::Misc => "misc",
            EntryType::PhdThesis => "phdthesis",
            EntryType::Proceedings => "proceedings",
            EntryType::TechReport => "techreport",
            EntryType::Unpublished => "unpublished",
            EntryType::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single citation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    key: String,
    entry_type: EntryType,
    /// Field names are stored lowercased.
    fields: BTreeMap<String, String>,
    /// Name lists parsed by the bibliography parser, keyed by field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    names: BTreeMap<String, Vec<Author>>,
}

impl Record {
    /// Creates a record with no fields.
    #[must_use]
    pub fn new(key: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            key: key.into(),
            entry_type,
            fields: BTreeMap::new(),
            names: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion, mostly useful in tests and custom parsers.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    /// The citation key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entry_type(&self) -> &EntryType {
        &self.entry_type
    }

    /// All fields, keyed by lowercased name.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Looks up a field by case-insensitive name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(value) => Some(value.as_str()),
            None => self
                .fields
                .get(&name.to_ascii_lowercase())
                .map(String::as_str),
        }
    }

    /// Looks up a field, failing with [`BibbleError::MissingField`] when absent.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.field(name).ok_or_else(|| BibbleError::MissingField {
            key: self.key.clone(),
            field: name.to_string(),
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Inserts or replaces a field. The name is lowercased.
    ///
    /// Replacing a name field discards any names parsed for it earlier.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        self.names.remove(&name);
        self.fields.insert(name, value.into());
    }

    /// Attaches an already-parsed name list to a name field such as `author`.
    pub(crate) fn set_names(&mut self, name: &str, names: Vec<Author>) {
        self.names.insert(name.to_ascii_lowercase(), names);
    }

    /// Copies the citation key into the field map under `key`.
    pub fn inject_key(&mut self) {
        let key = self.key.clone();
        self.set_field(KEY_FIELD, key);
    }

    /// Names parsed from the `author` field, in source order.
    pub fn authors(&self) -> Vec<Author> {
        self.persons("author")
    }

    /// Names parsed from the `editor` field, in source order.
    pub fn editors(&self) -> Vec<Author> {
        self.persons("editor")
    }

    fn persons(&self, role: &str) -> Vec<Author> {
        match self.names.get(role) {
            Some(names) => names.clone(),
            None => self.field(role).map(parse_names).unwrap_or_default(),
        }
    }
}
