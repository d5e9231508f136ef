//! Render a BibTeX/BibLaTeX bibliography to HTML through a user-supplied template.
//!
//! `bibble` turns loosely-typed citation records into a small set of render-ready
//! values (title, venue, venue label, author list, DOI link, extra links) and hands
//! the records, newest first, to a sandboxed template.
//!
//! # Key Features
//!
//! - **Dialect reconciliation**: BibTeX `year`/`month`/`journal` and BibLaTeX
//!   `date`/`journaltitle` records are normalized into the same shape.
//! - **Field extractors**: pure functions over a [`Record`], exposed to templates
//!   as filters.
//! - **Chronological ordering**: a comparable sort key built from the normalized
//!   year and month.
//!
//! # Basic Usage
//!
//! ```rust
//! use bibble::Renderer;
//!
//! let bib = r#"
//! @article{knuth84,
//!   author = {Donald E. Knuth},
//!   title = {Literate {Programming}},
//!   journal = {The Computer Journal},
//!   year = 1984,
//! }
//! "#;
//! let template = "{% for entry in entries %}{{ entry|title }} ({{ entry|venue }}){% endfor %}";
//!
//! let html = Renderer::new().render(bib, template).unwrap();
//! assert_eq!(html, "Literate Programming (The Computer Journal)");
//! ```
//!
//! # Error Handling
//!
//! Every fallible operation returns [`Result`], wrapping [`BibbleError`]. A single
//! bad record aborts the whole render; the error names the offending entry key:
//!
//! ```rust
//! use bibble::{BibbleError, Renderer};
//!
//! let bib = "@misc{undated, title = {No date here}}";
//! match Renderer::new().render(bib, "") {
//!     Err(BibbleError::MissingDate { key }) => assert_eq!(key, "undated"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! # Thread Safety
//!
//! Extractors never mutate shared state. With [`RenderConfig::run_in_parallel`]
//! normalization and sort-key computation run on the rayon thread pool.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bibtex;
pub mod extract;
pub mod normalize;
mod record;
mod regex;
pub mod render;
pub mod sort;
pub mod utils;

// Reexports
pub use bibtex::BibtexParser;
pub use record::{EntryType, Record};
pub use render::{RenderConfig, Renderer};

/// A specialized Result type for bibliography operations.
pub type Result<T> = std::result::Result<T, BibbleError>;

/// Errors raised while parsing, normalizing, or rendering a bibliography.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BibbleError {
    #[error("No valid date for {key}: neither `year` nor a usable `date` field")]
    MissingDate { key: String },

    #[error("Missing required field `{field}` for {key}")]
    MissingField { key: String, field: String },

    #[error("No venue rule for entry type `{entry_type}` ({key})")]
    UnsupportedVenue { key: String, entry_type: String },

    #[error("Unrecognized month `{month}` for {key}")]
    InvalidMonth { key: String, month: String },

    #[error("Invalid year `{year}` for {key}")]
    InvalidYear { key: String, year: String },

    #[error("Malformed input: {message} at line {line}")]
    MalformedInput { message: String, line: usize },

    #[error("Duplicate citation key `{key}` at line {line}")]
    DuplicateKey { key: String, line: usize },

    #[error("Template error: {0}")]
    Template(String),
}

/// Represents one name from an `author` or `editor` list.
///
/// Components are whitespace-separated words as written in the source, split
/// according to the BibTeX name forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// The first given name
    pub first: Vec<String>,
    /// Remaining given names
    pub middle: Vec<String>,
    /// Lowercase particles such as "von" or "de la"
    pub prelast: Vec<String>,
    /// The family name
    pub last: Vec<String>,
    /// Suffixes such as "Jr."
    pub lineage: Vec<String>,
}

impl Author {
    /// Formats the name as `first middle last`, skipping empty components and
    /// dropping brace grouping. Particles (`prelast`) and lineage are not shown.
    ///
    /// # Examples
    ///
    /// ```
    /// use bibble::bibtex::parse_names;
    ///
    /// let authors = parse_names("Ludwig van Beethoven and de la Fontaine, Jean");
    /// assert_eq!(authors[0].full_name(), "Ludwig Beethoven");
    /// assert_eq!(authors[1].full_name(), "Jean Fontaine");
    /// ```
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = self
            .first
            .iter()
            .chain(&self.middle)
            .chain(&self.last)
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        utils::unlatex(&name)
    }
}

/// Trait for implementing bibliography parsers.
pub trait BibParser {
    /// Parse a string containing one or more bibliography entries.
    ///
    /// # Errors
    ///
    /// Returns `BibbleError` if the input is malformed
    fn parse(&self, input: &str) -> Result<Vec<Record>>;
}
