//! Name lists.
//!
//! Splitting an `author`/`editor` value into people, and each person into the
//! BibTeX `First von Last, Jr` components, is done by [`biblatex::Person`]. This
//! module maps those people onto [`Author`].

use crate::Author;
use biblatex::{Chunk, Person, Spanned, Type};

/// Parse a name list such as the value of an `author` field.
///
/// # Examples
///
/// ```
/// use bibble::bibtex::parse_names;
///
/// let authors = parse_names("Ludwig van Beethoven and de la Fontaine, Jean");
/// assert_eq!(authors[1].prelast, vec!["de", "la"]);
/// assert_eq!(authors[1].last, vec!["Fontaine"]);
/// ```
pub fn parse_names(text: &str) -> Vec<Author> {
    let chunks = [Spanned {
        v: Chunk::Normal(text.to_string()),
        span: 0..text.len(),
    }];
    Vec::<Person>::from_chunks(&chunks)
        .map(people)
        .unwrap_or_default()
}

/// Maps parsed people onto authors, dropping entries with no name at all.
pub(crate) fn people(persons: Vec<Person>) -> Vec<Author> {
    persons
        .iter()
        .filter(|person| !person.name.is_empty() || !person.given_name.is_empty())
        .map(Author::from)
        .collect()
}

impl From<&Person> for Author {
    fn from(person: &Person) -> Self {
        let mut given = words(&person.given_name).into_iter();
        Self {
            first: given.next().into_iter().collect(),
            middle: given.collect(),
            prelast: words(&person.prefix),
            last: words(&person.name),
            lineage: words(&person.suffix),
        }
    }
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
