//! Field extractors.
//!
//! Each extractor derives one render-ready value from a normalized [`Record`].
//! They are pure and read-only, so they can run in any order and on any thread.
//! All of them are exposed to templates as filters of the same name.
//!
//! Required fields that are missing raise [`BibbleError::MissingField`]. The
//! only soft failures are [`main_url`], which returns `None`, and [`month_name`],
//! which returns an empty string: both feed display-only output.

use crate::regex::Regex;
use crate::utils::{MONTH_NAMES, english_list, unlatex};
use crate::{Author, BibbleError, EntryType, Record, Result};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Base URL prepended to bare DOIs.
pub const DOI_RESOLVER: &str = "https://dx.doi.org/";

const URL_FIELD_SUFFIX: &str = "_url";

static URL_SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap());

/// The entry title with brace grouping removed. Chapters of books (`inbook`)
/// prefer their `chapter` field.
pub fn title(record: &Record) -> Result<String> {
    let title = match record.entry_type() {
        EntryType::InBook => match record.field("chapter") {
            Some(chapter) => chapter,
            None => record.require("title")?,
        },
        _ => record.require("title")?,
    };
    Ok(unlatex(title))
}

/// Human label that precedes the venue, e.g. `"Technical Report "`.
pub fn venue_type(record: &Record) -> Result<String> {
    let label = match record.entry_type() {
        EntryType::InBook => "Chapter in ".to_string(),
        EntryType::TechReport => "Technical Report ".to_string(),
        EntryType::PhdThesis => format!("Ph.D. thesis, {}", record.require("school")?),
        EntryType::MastersThesis => format!("Master's thesis, {}", record.require("school")?),
        _ => String::new(),
    };
    Ok(label)
}

/// Where the work appeared.
///
/// Entry types without a venue rule fail with
/// [`BibbleError::UnsupportedVenue`] unless `lenient` is set, in which case a
/// placeholder naming the type is returned.
///
/// # Examples
///
/// ```
/// use bibble::{EntryType, Record};
/// use bibble::extract::venue;
///
/// let record = Record::new("k", EntryType::Article)
///     .with_field("journal", "ACM Comm.")
///     .with_field("volume", "5")
///     .with_field("number", "2");
/// assert_eq!(venue(&record, false).unwrap(), "ACM Comm. 5(2)");
///
/// let record = Record::new("k", EntryType::from_name("foo"));
/// assert!(venue(&record, false).is_err());
/// assert_eq!(venue(&record, true).unwrap(), "Unknown venue (type=foo)");
/// ```
pub fn venue(record: &Record, lenient: bool) -> Result<String> {
    let venue = match record.entry_type() {
        EntryType::Article => {
            let mut venue = record.require("journal")?.to_string();
            if let (Some(volume), Some(number)) =
                (non_empty(record, "volume"), non_empty(record, "number"))
            {
                venue.push_str(&format!(" {volume}({number})"));
            }
            venue
        }
        EntryType::InProceedings | EntryType::InCollection => {
            let event = ["booktitle", "eventtitle", "conference"]
                .iter()
                .find_map(|name| record.field(name))
                .ok_or_else(|| BibbleError::MissingField {
                    key: record.key().to_string(),
                    field: "booktitle".to_string(),
                })?;
            let mut venue = unlatex(event);
            if let Some(series) = non_empty(record, "series") {
                venue.push_str(&format!(" ({series})"));
            }
            venue
        }
        EntryType::InBook => unlatex(record.require("title")?),
        EntryType::TechReport => {
            let publisher =
                non_empty(record, "institution").or_else(|| non_empty(record, "publisher"));
            [non_empty(record, "number"), publisher]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(", ")
        }
        EntryType::PhdThesis | EntryType::MastersThesis => String::new(),
        EntryType::Unpublished | EntryType::Misc => match non_empty(record, "eventtitle") {
            Some(event) => format!("In {}", unlatex(event)),
            None => "Unpublished".to_string(),
        },
        EntryType::Book
        | EntryType::Booklet
        | EntryType::Manual
        | EntryType::Proceedings
        | EntryType::Other(_) => {
            if !lenient {
                return Err(BibbleError::UnsupportedVenue {
                    key: record.key().to_string(),
                    entry_type: record.entry_type().to_string(),
                });
            }
            format!("Unknown venue (type={})", record.entry_type())
        }
    };
    Ok(venue)
}

/// The record's authors as an English list, e.g. `"Ada Lovelace and Alan Turing"`.
/// A record without an `author` field yields an empty string.
pub fn author_list(record: &Record) -> String {
    format_authors(&record.authors())
}

/// Formats a list of names under English list punctuation.
pub fn format_authors(authors: &[Author]) -> String {
    let names: Vec<String> = authors.iter().map(Author::full_name).collect();
    english_list(&names)
}

/// The primary link: `url`, falling back to `ee`.
pub fn main_url(record: &Record) -> Option<&str> {
    ["url", "ee"].iter().find_map(|name| record.field(name))
}

/// Every `*_url` field, keyed by a label made from the field name with the
/// suffix stripped and underscores turned into spaces.
///
/// # Examples
///
/// ```
/// use bibble::{EntryType, Record};
/// use bibble::extract::extra_urls;
///
/// let record = Record::new("k", EntryType::Misc)
///     .with_field("NY_Times_url", "http://nytimes.com/story");
/// let urls = extra_urls(&record);
/// assert_eq!(urls["ny times"], "http://nytimes.com/story");
/// ```
pub fn extra_urls(record: &Record) -> BTreeMap<String, String> {
    record
        .fields()
        .iter()
        .filter_map(|(name, url)| {
            let label = name.to_lowercase();
            let label = label.strip_suffix(URL_FIELD_SUFFIX)?;
            Some((label.replace('_', " "), url.clone()))
        })
        .collect()
}

/// A resolvable DOI link. Empty when the record has no `doi`; values that are
/// already URLs are returned unchanged.
pub fn doi(record: &Record) -> String {
    match record.field("doi") {
        None => String::new(),
        Some(doi) if URL_SCHEME_REGEX.is_match(doi) => doi.to_string(),
        Some(doi) => format!("{DOI_RESOLVER}{doi}"),
    }
}

/// Full English name of a month number (`"1"`..`"12"`).
///
/// Out-of-range or non-numeric input yields an empty string instead of an
/// error: month names are display-only and templates degrade gracefully.
pub fn month_name(month: &str) -> String {
    month
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| MONTH_NAMES.get(idx))
        .map(|name| name.to_string())
        .unwrap_or_default()
}

fn non_empty<'r>(record: &'r Record, name: &str) -> Option<&'r str> {
    record.field(name).filter(|value| !value.trim().is_empty())
}
