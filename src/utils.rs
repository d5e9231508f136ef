//! Small text helpers shared by the parser, the extractors and the sort-key generator.

use itertools::Itertools;

/// Full English month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const LATEX_REPLACEMENTS: [(&str, &str); 3] = [("{", ""), ("}", ""), ("\\&", "&")];

/// Joins items under English list punctuation.
///
/// Two items are joined with `" and "`; three or more get commas and an Oxford
/// comma before the final `"and "`.
///
/// # Examples
///
/// ```
/// use bibble::utils::english_list;
///
/// assert_eq!(english_list::<&str>(&[]), "");
/// assert_eq!(english_list(&["A", "B"]), "A and B");
/// assert_eq!(english_list(&["A", "B", "C"]), "A, B, and C");
/// ```
pub fn english_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => format!(
            "{}, and {}",
            init.iter().map(AsRef::<str>::as_ref).join(", "),
            last.as_ref()
        ),
    }
}

/// Removes brace grouping and the escaped ampersand, neither of which means
/// anything in HTML.
pub fn unlatex(text: &str) -> String {
    LATEX_REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Resolves a month specifier to its number.
///
/// Accepts a decimal number in `1..=12` or any month name or abbreviation of at
/// least three letters (case-insensitive, only the first three are compared).
pub fn month_number(month: &str) -> Option<u32> {
    let month = month.trim();
    if !month.is_empty() && month.chars().all(|c| c.is_ascii_digit()) {
        return month.parse().ok().filter(|n| (1..=12).contains(n));
    }
    if month.chars().count() < 3 {
        return None;
    }
    let prefix = month.chars().take(3).collect::<String>().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| name[..3].eq_ignore_ascii_case(&prefix))
        .map(|idx| idx as u32 + 1)
}

/// Collapses every run of whitespace into a single space.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[test]
    fn test_english_list() {
        assert_eq!(english_list::<&str>(&[]), "");
        assert_eq!(english_list(&["A"]), "A");
        assert_eq!(english_list(&["A", "B"]), "A and B");
        assert_eq!(english_list(&["A", "B", "C"]), "A, B, and C");
        assert_eq!(english_list(&["A", "B", "C", "D"]), "A, B, C, and D");
    }

    #[test]
    fn test_english_list_owned_strings() {
        let items = vec!["Ada".to_string(), "Grace".to_string()];
        assert_eq!(english_list(&items), "Ada and Grace");
    }

    #[rstest]
    #[case("{Deep} Learning", "Deep Learning")]
    #[case("{{NP}}-hard", "NP-hard")]
    #[case("Rock \\& Roll", "Rock & Roll")]
    #[case("plain", "plain")]
    fn test_unlatex(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(unlatex(input), expected);
    }

    #[rstest]
    #[case("1", Some(1))]
    #[case("05", Some(5))]
    #[case("12", Some(12))]
    #[case("13", None)]
    #[case("0", None)]
    #[case("jan", Some(1))]
    #[case("Feb", Some(2))]
    #[case("SEPTEMBER", Some(9))]
    #[case("Sept.", Some(9))]
    #[case("ma", None)]
    #[case("spring", None)]
    #[case("", None)]
    fn test_month_number(#[case] input: &str, #[case] expected: Option<u32>) {
        assert_eq!(month_number(input), expected);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n   b\tc "), "a b c");
    }
}
