//! Rendering pipeline.
//!
//! Parses a bibliography, normalizes every record, injects citation keys, sorts
//! newest first and renders the result through a `minijinja` template. Templates
//! see the records as `entries` and every extractor as a filter:
//!
//! | filter | value |
//! |---|---|
//! | `title` | [`extract::title`] |
//! | `venue_type` | [`extract::venue_type`] |
//! | `venue` | [`extract::venue`] |
//! | `author_list` | [`extract::author_list`], or a list of authors/strings |
//! | `author_fmt` | [`Author::full_name`] of one author |
//! | `main_url` | [`extract::main_url`], `none` when absent |
//! | `extra_urls` | [`extract::extra_urls`] as a map |
//! | `doi` | [`extract::doi`] |
//! | `month_name` / `monthname` | [`extract::month_name`] |
//! | `english_list` | [`english_list`] over a list of strings |
//! | `sort_key` | [`sort::sort_key`] |
//!
//! Each entry exposes `key`, `type`, `fields`, `authors` and `editors`.
//!
//! # Example
//!
//! ```
//! use bibble::{RenderConfig, Renderer};
//!
//! let bib = "@book{b, title = {A Book}, year = 2001}";
//! let template = "{% for e in entries %}{{ e|title }}: {{ e|venue }}{% endfor %}";
//!
//! // Books have no venue rule; lenient mode substitutes a placeholder.
//! assert!(Renderer::new().render(bib, template).is_err());
//!
//! let renderer = Renderer::new().with_config(RenderConfig {
//!     lenient_venues: true,
//!     ..Default::default()
//! });
//! assert_eq!(
//!     renderer.render(bib, template).unwrap(),
//!     "A Book: Unknown venue (type=book)"
//! );
//! ```

use crate::utils::english_list;
use crate::{
    Author, BibParser, BibbleError, BibtexParser, Record, Result, extract, normalize, sort,
};
use minijinja::value::{Enumerator, Object, ObjectRepr, Value};
use minijinja::{Environment, Error, ErrorKind, context};
use std::sync::Arc;

/// Configuration options for the rendering pipeline.
///
/// # Examples
///
/// ```
/// use bibble::RenderConfig;
///
/// let config = RenderConfig {
///     lenient_venues: true,   // placeholder venue for unsupported entry types
///     run_in_parallel: false, // normalize and sort on the calling thread
/// };
/// ```
#[derive(Debug, Default, Clone)]
pub struct RenderConfig {
    /// Substitute `"Unknown venue (type=...)"` instead of failing on entry types
    /// without a venue rule.
    pub lenient_venues: bool,
    /// Normalize records and compute sort keys on the rayon thread pool.
    /// Ignored without the `parallel` feature.
    pub run_in_parallel: bool,
}

/// Renders bibliographies through templates.
#[derive(Debug, Default, Clone)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    /// Creates a renderer with strict venues and sequential processing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, mut config: RenderConfig) -> Self {
        if !cfg!(feature = "parallel") {
            config.run_in_parallel = false;
        }
        self.config = config;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Parses `bib` as BibTeX/BibLaTeX and renders it through `template`.
    ///
    /// # Errors
    ///
    /// Any parse, normalization, sort-key or extractor error aborts the render
    /// and is returned as raised.
    pub fn render(&self, bib: &str, template: &str) -> Result<String> {
        self.render_with(&BibtexParser::new(), bib, template)
    }

    /// Like [`Renderer::render`], with a caller-supplied parser.
    pub fn render_with<P: BibParser + ?Sized>(
        &self,
        parser: &P,
        bib: &str,
        template: &str,
    ) -> Result<String> {
        let records = parser.parse(bib)?;
        self.render_records(records, template)
    }

    /// Renders already-parsed records.
    pub fn render_records(&self, records: Vec<Record>, template: &str) -> Result<String> {
        let env = self.environment();
        let tmpl = env.template_from_str(template).map_err(template_error)?;

        let records = self.prepare(records)?;
        let entries: Vec<Value> = records.into_iter().map(Value::from_object).collect();
        tracing::debug!(entries = entries.len(), "rendering template");

        tmpl.render(context! { entries => entries })
            .map_err(template_error)
    }

    /// Normalizes every record, copies its citation key into its fields and
    /// sorts the list newest first.
    pub fn prepare(&self, mut records: Vec<Record>) -> Result<Vec<Record>> {
        let parallel = self.config.run_in_parallel;
        normalize_stage(&mut records, parallel)?;
        records.iter_mut().for_each(Record::inject_key);
        sort_stage(&mut records, parallel)?;
        tracing::debug!(entries = records.len(), parallel, "prepared records");
        Ok(records)
    }

    /// Builds a template environment with every extractor registered as a filter.
    pub fn environment<'source>(&self) -> Environment<'source> {
        let mut env = Environment::new();
        let lenient = self.config.lenient_venues;

        env.add_filter("title", |entry: Value| -> std::result::Result<String, Error> {
            Ok(extract::title(record_arg(&entry)?)?)
        });
        env.add_filter(
            "venue_type",
            |entry: Value| -> std::result::Result<String, Error> {
                Ok(extract::venue_type(record_arg(&entry)?)?)
            },
        );
        env.add_filter(
            "venue",
            move |entry: Value| -> std::result::Result<String, Error> {
                Ok(extract::venue(record_arg(&entry)?, lenient)?)
            },
        );
        env.add_filter("author_list", author_list_filter);
        env.add_filter("author_fmt", |author: Value| author_name(&author));
        env.add_filter("main_url", |entry: Value| -> std::result::Result<Value, Error> {
            Ok(extract::main_url(record_arg(&entry)?)
                .map(Value::from)
                .unwrap_or_else(|| Value::from(())))
        });
        env.add_filter(
            "extra_urls",
            |entry: Value| -> std::result::Result<Value, Error> {
                Ok(Value::from_serialize(extract::extra_urls(record_arg(
                    &entry,
                )?)))
            },
        );
        env.add_filter("doi", |entry: Value| -> std::result::Result<String, Error> {
            Ok(extract::doi(record_arg(&entry)?))
        });
        env.add_filter("month_name", month_name_filter);
        env.add_filter("monthname", month_name_filter);
        env.add_filter("english_list", |items: Vec<String>| english_list(&items));
        env.add_filter("sort_key", |entry: Value| -> std::result::Result<String, Error> {
            Ok(sort::sort_key(record_arg(&entry)?)?)
        });

        env
    }
}

#[cfg(feature = "parallel")]
fn normalize_stage(records: &mut [Record], parallel: bool) -> Result<()> {
    if parallel {
        normalize::par_normalize_all(records)
    } else {
        normalize::normalize_all(records)
    }
}

#[cfg(not(feature = "parallel"))]
fn normalize_stage(records: &mut [Record], _parallel: bool) -> Result<()> {
    normalize::normalize_all(records)
}

#[cfg(feature = "parallel")]
fn sort_stage(records: &mut Vec<Record>, parallel: bool) -> Result<()> {
    if parallel {
        sort::par_sort_newest_first(records)
    } else {
        sort::sort_newest_first(records)
    }
}

#[cfg(not(feature = "parallel"))]
fn sort_stage(records: &mut Vec<Record>, _parallel: bool) -> Result<()> {
    sort::sort_newest_first(records)
}

impl Object for Record {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let value = match key.as_str()? {
            "key" => Value::from(self.key()),
            "type" => Value::from(self.entry_type().as_str()),
            "fields" => Value::from_serialize(self.fields()),
            "authors" => persons(self.authors()),
            "editors" => persons(self.editors()),
            _ => return None,
        };
        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["key", "type", "fields", "authors", "editors"])
    }
}

impl Object for Author {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let parts = match key.as_str()? {
            "first" => &self.first,
            "middle" => &self.middle,
            "prelast" => &self.prelast,
            "last" => &self.last,
            "lineage" => &self.lineage,
            "full" => return Some(Value::from(self.full_name())),
            _ => return None,
        };
        Some(Value::from(parts.join(" ")))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["first", "middle", "prelast", "last", "lineage", "full"])
    }
}

fn persons(authors: Vec<Author>) -> Value {
    Value::from(
        authors
            .into_iter()
            .map(Value::from_object)
            .collect::<Vec<_>>(),
    )
}

impl From<BibbleError> for Error {
    fn from(err: BibbleError) -> Self {
        Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
    }
}

/// Recovers an extractor error raised inside the template engine, or wraps the
/// engine's own error.
fn template_error(err: Error) -> BibbleError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(current) = source {
        if let Some(inner) = current.downcast_ref::<BibbleError>() {
            return inner.clone();
        }
        source = current.source();
    }
    BibbleError::Template(err.to_string())
}

fn record_arg(value: &Value) -> std::result::Result<&Record, Error> {
    value.downcast_object_ref::<Record>().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("expected a bibliography entry, got {}", value.kind()),
        )
    })
}

fn author_name(value: &Value) -> std::result::Result<String, Error> {
    if let Some(author) = value.downcast_object_ref::<Author>() {
        return Ok(author.full_name());
    }
    value.as_str().map(str::to_string).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("expected an author, got {}", value.kind()),
        )
    })
}

fn author_list_filter(value: Value) -> std::result::Result<String, Error> {
    if let Some(record) = value.downcast_object_ref::<Record>() {
        return Ok(extract::author_list(record));
    }
    let names = value
        .try_iter()?
        .map(|item| author_name(&item))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(english_list(&names))
}

fn month_name_filter(month: Value) -> String {
    extract::month_name(&month.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LISTING: &str =
        "{% for entry in entries %}{{ entry.key }}: {{ entry|title }} ({{ entry|venue }});{% endfor %}";

    fn lenient() -> Renderer {
        Renderer::new().with_config(RenderConfig {
            lenient_venues: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_newest_first() {
        let bib = r#"
@article{old, title = {Older}, journal = {J. B}, year = 2019}
@article{new, title = {Newer}, journal = {J. A}, year = 2020}
"#;
        let output = Renderer::new().render(bib, LISTING).unwrap();
        assert_eq!(output, "new: Newer (J. A);old: Older (J. B);");
    }

    #[test]
    fn test_biblatex_dialect() {
        let bib = r#"
@article{zotero,
  title = {Deep {Learning}},
  journaltitle = {Nature},
  volume = {521},
  number = {7553},
  date = {2015-05-27},
}
@article{classic, title = {Classic}, journal = {Nature}, year = 2015, month = 1}
"#;
        let template = "{% for e in entries %}{{ e.key }} {{ e.fields.year }}-{{ e.fields.month|month_name }} {{ e|venue }}|{% endfor %}";
        let output = Renderer::new().render(bib, template).unwrap();
        assert_eq!(
            output,
            "zotero 2015-May Nature 521(7553)|classic 2015-January Nature|"
        );
    }

    #[test]
    fn test_key_injected_into_fields() {
        let bib = "@misc{k1, year = 2001}";
        let output = Renderer::new()
            .render(bib, "{% for e in entries %}{{ e.fields.key }}{% endfor %}")
            .unwrap();
        assert_eq!(output, "k1");
    }

    #[test]
    fn test_authors_and_links() {
        let bib = r#"
@inproceedings{p,
  author = {Lovelace, Ada and Alan Turing and Grace Hopper},
  title = {Engines},
  booktitle = {Proc. {Analytical} Engines},
  year = 1843,
  doi = {10.1000/xyz},
  url = {http://example.org/p},
  slides_url = {http://example.org/slides},
}
"#;
        let template = concat!(
            "{% for e in entries %}",
            "{{ e|author_list }}|",
            "{{ e.authors|author_list }}|",
            "{% for a in e.authors %}{{ a.last }}{{ ',' if not loop.last }}{% endfor %}|",
            "{{ e|doi }}|{{ e|main_url }}|",
            "{% for label, url in e|extra_urls|dictsort %}{{ label }}={{ url }}{% endfor %}|",
            "{{ e|venue }}",
            "{% endfor %}"
        );
        let output = Renderer::new().render(bib, template).unwrap();
        assert_eq!(
            output,
            "Ada Lovelace, Alan Turing, and Grace Hopper|\
             Ada Lovelace, Alan Turing, and Grace Hopper|\
             Lovelace,Turing,Hopper|\
             https://dx.doi.org/10.1000/xyz|http://example.org/p|\
             slides=http://example.org/slides|\
             Proc. Analytical Engines"
        );
    }

    #[test]
    fn test_missing_url_is_falsy() {
        let bib = "@misc{m, year = 2000}";
        let template = "{% for e in entries %}{% if e|main_url %}link{% else %}none{% endif %}{% endfor %}";
        assert_eq!(Renderer::new().render(bib, template).unwrap(), "none");
    }

    #[test]
    fn test_extractor_error_propagates_unmodified() {
        let bib = "@phdthesis{thesis, title = {T}, year = 2010}";
        let template = "{% for e in entries %}{{ e|venue_type }}{% endfor %}";
        assert_eq!(
            Renderer::new().render(bib, template),
            Err(BibbleError::MissingField {
                key: "thesis".to_string(),
                field: "school".to_string(),
            })
        );
    }

    #[test]
    fn test_unsupported_venue_strict_and_lenient() {
        let bib = "@foo{f, title = {Odd}, year = 2010}";
        assert_eq!(
            Renderer::new().render(bib, LISTING),
            Err(BibbleError::UnsupportedVenue {
                key: "f".to_string(),
                entry_type: "foo".to_string(),
            })
        );
        assert_eq!(
            lenient().render(bib, LISTING).unwrap(),
            "f: Odd (Unknown venue (type=foo));"
        );
    }

    #[test]
    fn test_missing_date_aborts() {
        let bib = "@misc{dated, year = 2000}\n@misc{undated, title = {x}}";
        assert_eq!(
            Renderer::new().render(bib, LISTING),
            Err(BibbleError::MissingDate {
                key: "undated".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_month_aborts() {
        let bib = "@misc{m, year = 2000, month = {Spring}}";
        assert_eq!(
            Renderer::new().render(bib, ""),
            Err(BibbleError::InvalidMonth {
                key: "m".to_string(),
                month: "Spring".to_string(),
            })
        );
    }

    #[test]
    fn test_template_syntax_error() {
        let result = Renderer::new().render("", "{% for e in entries %}");
        assert!(matches!(result, Err(BibbleError::Template(_))));
    }

    #[test]
    fn test_filter_rejects_non_entries() {
        let result = Renderer::new().render("", "{{ 'text'|title }}");
        assert!(matches!(result, Err(BibbleError::Template(_))));
    }

    #[test]
    fn test_undefined_fields_render_empty() {
        let bib = "@misc{m, year = 2000}";
        let template = "{% for e in entries %}[{{ e.fields.volume }}]{% endfor %}";
        assert_eq!(Renderer::new().render(bib, template).unwrap(), "[]");
    }

    #[test]
    fn test_helper_filters() {
        let template = "{{ ['a', 'b', 'c']|english_list }} {{ 3|monthname }} {{ 'x'|month_name }}.";
        assert_eq!(
            Renderer::new().render("", template).unwrap(),
            "a, b, and c March ."
        );
    }

    #[test]
    fn test_sort_key_filter_and_type() {
        let bib = "@techreport{t, number = {TR-1}, institution = {CMU}, year = 1999, month = 7}";
        let template = "{% for e in entries %}{{ e.type }} {{ e|sort_key }} {{ e|venue_type }}{{ e|venue }}{% endfor %}";
        assert_eq!(
            Renderer::new().render(bib, template).unwrap(),
            "techreport 199907 Technical Report TR-1, CMU"
        );
    }

    #[test]
    fn test_prepare_orders_and_keys() {
        let records = vec![
            Record::new("a", crate::EntryType::Misc).with_field("year", "2001"),
            Record::new("b", crate::EntryType::Misc).with_field("date", "2003-02"),
            Record::new("c", crate::EntryType::Misc).with_field("year", "2002"),
        ];
        let prepared = Renderer::new().prepare(records).unwrap();
        let keys: Vec<&str> = prepared.iter().map(Record::key).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
        assert!(prepared.iter().all(|r| r.field("key") == Some(r.key())));
    }

    #[test]
    fn test_date_does_not_supply_month_when_year_present() {
        let records = vec![
            Record::new("a", crate::EntryType::Misc)
                .with_field("year", "2019")
                .with_field("date", "2019-07-01"),
            Record::new("b", crate::EntryType::Misc)
                .with_field("year", "2019")
                .with_field("month", "3"),
        ];
        let prepared = Renderer::new().prepare(records).unwrap();
        let order: Vec<(&str, Option<&str>)> = prepared
            .iter()
            .map(|r| (r.key(), r.field("month")))
            .collect();
        assert_eq!(order, vec![("b", Some("3")), ("a", None)]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let bib: String = (0..30)
            .map(|i| format!("@misc{{m{i}, year = {}, month = {}}}\n", 1990 + i % 5, 1 + i % 12))
            .collect();
        let template = "{% for e in entries %}{{ e.key }},{% endfor %}";
        let parallel = Renderer::new().with_config(RenderConfig {
            run_in_parallel: true,
            ..Default::default()
        });
        assert_eq!(
            parallel.render(&bib, template).unwrap(),
            Renderer::new().render(&bib, template).unwrap()
        );
    }
}
