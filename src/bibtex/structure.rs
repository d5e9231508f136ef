//! Conversion from parsed `biblatex` entries.
//!
//! Field values arrive as chunk lists; they are flattened into plain text with
//! whitespace collapsed. Name fields are additionally kept as parsed people so
//! that brace-protected names survive the flattening.

use super::names::people;
use crate::utils::collapse_whitespace;
use crate::{BibbleError, EntryType, Record};
use biblatex::{Chunk, Entry, Person, Spanned};

/// Fields whose values are name lists.
const NAME_FIELDS: [&str; 2] = ["author", "editor"];

impl TryFrom<&Entry> for Record {
    type Error = BibbleError;

    fn try_from(entry: &Entry) -> Result<Self, Self::Error> {
        if entry.key.trim().is_empty() {
            return Err(BibbleError::MalformedInput {
                message: format!("@{} entry without a citation key", entry.entry_type),
                line: 0,
            });
        }

        let mut record = Record::new(
            entry.key.clone(),
            EntryType::from_name(&entry.entry_type.to_string()),
        );
        for (name, chunks) in &entry.fields {
            record.set_field(name, chunk_text(chunks));
        }
        for role in NAME_FIELDS {
            if let Ok(names) = entry.get_as::<Vec<Person>>(role) {
                record.set_names(role, people(names));
            }
        }
        Ok(record)
    }
}

/// Flatten a field value into plain text.
pub(crate) fn chunk_text(chunks: &[Spanned<Chunk>]) -> String {
    let text: String = chunks
        .iter()
        .map(|chunk| match &chunk.v {
            Chunk::Normal(s) | Chunk::Verbatim(s) | Chunk::Math(s) => s.as_str(),
        })
        .collect();
    collapse_whitespace(&text)
}

/// Byte offset of the earliest field value of an entry.
pub(crate) fn entry_offset(entry: &Entry) -> Option<usize> {
    entry
        .fields
        .values()
        .filter_map(|chunks| chunks.first())
        .map(|chunk| chunk.span.start)
        .min()
}
