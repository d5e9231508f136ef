//! BibTeX/BibLaTeX parser implementation.
//!
//! Syntax, `@string` abbreviations, `#` concatenation, LaTeX escapes and name
//! lists are handled by the [`biblatex`] crate; this module turns its entries
//! into [`Record`]s and its errors into [`BibbleError`]s. Brace grouping is
//! dropped from field values, and entry types and field names are
//! case-insensitive.
//!
//! # Example
//!
//! ```
//! use bibble::{BibParser, BibtexParser};
//!
//! let input = r#"@article{doe2023,
//!   title = {Example {Title}},
//!   author = {Doe, Jane},
//!   year = 2023,
//! }"#;
//!
//! let records = BibtexParser::new().parse(input).unwrap();
//! assert_eq!(records[0].key(), "doe2023");
//! assert_eq!(records[0].field("title"), Some("Example Title"));
//! ```

mod names;
mod structure;

use crate::{BibParser, BibbleError, Record, Result};
use biblatex::{Bibliography, ParseError, ParseErrorKind};
use std::collections::HashMap;
use structure::entry_offset;

pub use names::parse_names;

/// Parser for BibTeX and BibLaTeX databases.
#[derive(Debug, Clone, Default)]
pub struct BibtexParser;

impl BibtexParser {
    /// Creates a new BibTeX parser instance.
    ///
    /// # Examples
    ///
    /// ```
    /// use bibble::BibtexParser;
    /// let parser = BibtexParser::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BibParser for BibtexParser {
    /// Parses every entry in a `.bib` file.
    ///
    /// # Errors
    ///
    /// Returns [`BibbleError::MalformedInput`] on syntax errors and
    /// [`BibbleError::DuplicateKey`] when a citation key appears twice, compared
    /// case-insensitively.
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        let bibliography = Bibliography::parse(input).map_err(|err| parse_error(input, err))?;

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut records = Vec::new();
        for entry in bibliography.iter() {
            let line = entry_offset(entry).map_or(0, |offset| line_at(input, offset));
            if seen.insert(entry.key.to_lowercase(), line).is_some() {
                return Err(BibbleError::DuplicateKey {
                    key: entry.key.clone(),
                    line,
                });
            }
            let record = Record::try_from(entry).map_err(|err| match err {
                BibbleError::MalformedInput { message, .. } => {
                    BibbleError::MalformedInput { message, line }
                }
                other => other,
            })?;
            records.push(record);
        }

        tracing::debug!(entries = records.len(), "parsed bibliography");
        Ok(records)
    }
}

fn parse_error(input: &str, err: ParseError) -> BibbleError {
    let line = line_at(input, err.span.start);
    let message = err.to_string();
    match err.kind {
        ParseErrorKind::DuplicateKey(key) => BibbleError::DuplicateKey { key, line },
        _ => BibbleError::MalformedInput { message, line },
    }
}

/// 1-based line number of a byte offset.
fn line_at(input: &str, offset: usize) -> usize {
    let offset = offset.min(input.len());
    input.as_bytes()[..offset]
        .iter()
        .filter(|&&byte| byte == b'\n')
        .count()
        + 1
}
