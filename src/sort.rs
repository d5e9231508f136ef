//! Chronological sort keys.
//!
//! A sort key is the zero-padded four-digit year followed by the zero-padded
//! two-digit month, or `00` when the record has no month. Comparing keys as
//! strings therefore orders records by (year, month), with month-less records
//! first within their year.

use crate::utils::month_number;
use crate::{BibbleError, Record, Result};
use std::cmp::Reverse;

/// Builds the sort key of a normalized record.
///
/// # Errors
///
/// - [`BibbleError::MissingDate`] if the record has no `year` (it was not normalized).
/// - [`BibbleError::InvalidYear`] if `year` is not a number of at most four digits.
/// - [`BibbleError::InvalidMonth`] if `month` is neither a number in `1..=12` nor a
///   recognizable month name.
///
/// # Examples
///
/// ```
/// use bibble::{EntryType, Record};
/// use bibble::sort::sort_key;
///
/// let record = Record::new("k", EntryType::Misc)
///     .with_field("year", "1984")
///     .with_field("month", "Sep");
/// assert_eq!(sort_key(&record).unwrap(), "198409");
/// ```
pub fn sort_key(record: &Record) -> Result<String> {
    let raw_year = record.field("year").ok_or_else(|| BibbleError::MissingDate {
        key: record.key().to_string(),
    })?;
    let year: u16 = raw_year
        .trim()
        .parse()
        .ok()
        .filter(|year| *year <= 9999)
        .ok_or_else(|| BibbleError::InvalidYear {
            key: record.key().to_string(),
            year: raw_year.to_string(),
        })?;

    let month = match record.field("month") {
        Some(raw_month) => month_number(raw_month).ok_or_else(|| BibbleError::InvalidMonth {
            key: record.key().to_string(),
            month: raw_month.to_string(),
        })?,
        None => 0,
    };

    Ok(format!("{year:04}{month:02}"))
}

/// Sorts records most recent first.
///
/// Every key is computed before any reordering, so an invalid record fails the
/// whole sort and leaves the slice untouched. Records with equal keys keep their
/// relative order.
pub fn sort_newest_first(records: &mut Vec<Record>) -> Result<()> {
    let keys = records.iter().map(sort_key).collect::<Result<Vec<_>>>()?;
    reorder_by_keys(records, keys);
    Ok(())
}

#[cfg(feature = "parallel")]
/// Parallel variant of [`sort_newest_first`]: keys are computed on the rayon pool.
pub fn par_sort_newest_first(records: &mut Vec<Record>) -> Result<()> {
    use rayon::prelude::*;

    let keys = records
        .par_iter()
        .map(sort_key)
        .collect::<Result<Vec<_>>>()?;
    reorder_by_keys(records, keys);
    Ok(())
}

fn reorder_by_keys(records: &mut Vec<Record>, keys: Vec<String>) {
    let mut keyed: Vec<(String, Record)> = keys.into_iter().zip(records.drain(..)).collect();
    // `sort_by_key` is stable, so ties stay in input order.
    keyed.sort_by_key(|(key, _)| Reverse(key.clone()));
    records.extend(keyed.into_iter().map(|(_, record)| record));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryType;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn dated(key: &str, year: &str, month: Option<&str>) -> Record {
        let record = Record::new(key, EntryType::Misc).with_field("year", year);
        match month {
            Some(month) => record.with_field("month", month),
            None => record,
        }
    }

    #[rstest]
    #[case("2019", None, "201900")]
    #[case("2019", Some("5"), "201905")]
    #[case("2019", Some("05"), "201905")]
    #[case("2019", Some("December"), "201912")]
    #[case("2019", Some("oct"), "201910")]
    #[case("812", Some("1"), "081201")]
    fn test_sort_key(#[case] year: &str, #[case] month: Option<&str>, #[case] expected: &str) {
        assert_eq!(sort_key(&dated("k", year, month)).unwrap(), expected);
    }

    #[rstest]
    #[case(Some("spring"))]
    #[case(Some("13"))]
    #[case(Some("ja"))]
    fn test_invalid_month(#[case] month: Option<&str>) {
        let result = sort_key(&dated("k", "2019", month));
        assert_eq!(
            result,
            Err(BibbleError::InvalidMonth {
                key: "k".to_string(),
                month: month.unwrap().to_string(),
            })
        );
    }

    #[rstest]
    #[case("19xx")]
    #[case("")]
    #[case("20190")]
    fn test_invalid_year(#[case] year: &str) {
        assert!(matches!(
            sort_key(&dated("k", year, None)),
            Err(BibbleError::InvalidYear { .. })
        ));
    }

    #[test]
    fn test_missing_year() {
        let record = Record::new("k", EntryType::Misc);
        assert_eq!(
            sort_key(&record),
            Err(BibbleError::MissingDate {
                key: "k".to_string()
            })
        );
    }

    #[test]
    fn test_keys_are_chronological() {
        for year in 1990..2000 {
            let no_month = sort_key(&dated("k", &year.to_string(), None)).unwrap();
            let next_year = sort_key(&dated("k", &(year + 1).to_string(), None)).unwrap();
            let mut previous = no_month;
            for month in 1..=12 {
                let month = month.to_string();
                let key = sort_key(&dated("k", &year.to_string(), Some(month.as_str()))).unwrap();
                assert!(key > previous, "{key} should follow {previous}");
                assert!(next_year > key);
                previous = key;
            }
        }
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut records = vec![
            dated("old", "2018", None),
            dated("tie-a", "2020", Some("mar")),
            dated("new", "2021", Some("1")),
            dated("tie-b", "2020", Some("03")),
            dated("year-only", "2020", None),
        ];
        sort_newest_first(&mut records).unwrap();
        let keys: Vec<&str> = records.iter().map(Record::key).collect();
        assert_eq!(keys, vec!["new", "tie-a", "tie-b", "year-only", "old"]);
    }

    #[test]
    fn test_sort_failure_leaves_records_untouched() {
        let mut records = vec![dated("a", "2018", None), dated("b", "2020", Some("???"))];
        assert!(sort_newest_first(&mut records).is_err());
        assert_eq!(records[0].key(), "a");
        assert_eq!(records.len(), 2);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_par_sort_matches_sequential() {
        let build = || {
            (0..40)
                .map(|i| dated(&format!("k{i}"), &(2000 + i % 7).to_string(), None))
                .collect::<Vec<_>>()
        };
        let mut sequential = build();
        let mut parallel = build();
        sort_newest_first(&mut sequential).unwrap();
        par_sort_newest_first(&mut parallel).unwrap();
        assert_eq!(sequential, parallel);
    }
}
