//! Dialect normalization.
//!
//! BibTeX records carry `year`, `month` and `journal`; BibLaTeX exports (Zotero,
//! Better BibTeX) carry a combined `date` of the form `YYYY[-MM[-DD]]` and
//! `journaltitle`. [`normalize`] materializes the BibTeX names from the BibLaTeX
//! ones so that every later stage reads a single convention. Original fields are
//! never removed.

use crate::{BibbleError, Record, Result};

/// Normalizes one record in place.
///
/// - `year` is kept if present, otherwise taken from the first four characters
///   of `date`, which must be digits.
/// - `month` is taken from characters 6–7 of `date` when the year came from
///   `date`, the date is at least seven characters long and no `month` field
///   exists. A record that already has a `year` keeps its month as written.
/// - `journaltitle` is mirrored into `journal` when `journal` is absent.
///
/// # Errors
///
/// [`BibbleError::MissingDate`] when neither `year` nor a usable `date` exists.
///
/// # Examples
///
/// ```
/// use bibble::{EntryType, Record};
/// use bibble::normalize::normalize;
///
/// let mut record = Record::new("doe19", EntryType::Article).with_field("date", "2019-05-12");
/// normalize(&mut record).unwrap();
/// assert_eq!(record.field("year"), Some("2019"));
/// assert_eq!(record.field("month"), Some("05"));
/// ```
pub fn normalize(record: &mut Record) -> Result<()> {
    let date = record.field("date").map(str::to_string);

    if !record.has_field("year") {
        let year = date
            .as_deref()
            .and_then(|date| date.get(0..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| BibbleError::MissingDate {
                key: record.key().to_string(),
            })?
            .to_string();
        record.set_field("year", year);

        if !record.has_field("month") {
            if let Some(month) = date.as_deref().and_then(date_month) {
                record.set_field("month", month);
            }
        }
    }

    if !record.has_field("journal") {
        if let Some(journal) = record.field("journaltitle").map(str::to_string) {
            record.set_field("journal", journal);
        }
    }

    Ok(())
}

/// Characters 6–7 of a `YYYY-MM[-DD]` date.
fn date_month(date: &str) -> Option<&str> {
    if date.chars().count() < 7 {
        return None;
    }
    date.get(5..7)
}

/// Normalizes every record, stopping at the first failure.
pub fn normalize_all(records: &mut [Record]) -> Result<()> {
    records.iter_mut().try_for_each(normalize)
}

#[cfg(feature = "parallel")]
/// Parallel variant of [`normalize_all`]. Records share no state, so each one is
/// normalized on its own rayon task.
pub fn par_normalize_all(records: &mut [Record]) -> Result<()> {
    use rayon::prelude::*;

    records.par_iter_mut().try_for_each(normalize)
}
