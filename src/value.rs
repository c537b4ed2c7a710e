//! Conversions from the pipeline's types into template [`Value`]s.

use std::collections::HashMap;

use gtmpl::Value;

use crate::annotate::SlugTag;
use crate::index::Entry;
use crate::markdown;

/// The format of the human-readable date, e.g. `01 January, 2023`.
const DATE_FORMAT: &str = "%d %B, %Y";

impl From<&SlugTag> for Value {
    /// Converts a [`SlugTag`] into an object with `tag` and `slug` fields.
    fn from(t: &SlugTag) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("tag".to_owned(), Value::String(t.tag.clone()));
        m.insert("slug".to_owned(), Value::String(t.slug.clone()));
        Value::Object(m)
    }
}

fn option_to_value(opt: &Option<String>) -> Value {
    match opt {
        Some(s) => Value::String(s.clone()),
        None => Value::Nil,
    }
}

/// Converts an [`Entry`] into a template value holding its frontmatter and
/// derived fields. The markdown body is only rendered when `with_body` is
/// set since listing pages don't need it.
pub fn entry_to_value(entry: &Entry, with_body: bool) -> Value {
    let frontmatter = &entry.document.frontmatter;
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), option_to_value(&frontmatter.title));
    m.insert("lang".to_owned(), option_to_value(&frontmatter.lang));
    m.insert("type".to_owned(), option_to_value(&frontmatter.kind));
    m.insert("desc".to_owned(), option_to_value(&frontmatter.desc));
    m.insert("cover".to_owned(), option_to_value(&frontmatter.cover));
    m.insert("published".to_owned(), Value::Bool(frontmatter.published));
    match frontmatter.date {
        Some(date) => {
            m.insert("date".to_owned(), Value::String(date.format(DATE_FORMAT).to_string()));
            m.insert("date_iso".to_owned(), Value::String(date.format("%Y-%m-%d").to_string()));
        }
        None => {
            m.insert("date".to_owned(), Value::Nil);
            m.insert("date_iso".to_owned(), Value::Nil);
        }
    }
    m.insert("slug".to_owned(), Value::String(entry.fields.slug.clone()));
    m.insert("slug_plain".to_owned(), Value::String(entry.fields.slug_plain.clone()));
    m.insert(
        "tags".to_owned(),
        Value::Array(entry.fields.slug_tag_list.iter().map(Value::from).collect()),
    );
    if with_body {
        m.insert("body".to_owned(), Value::String(markdown::to_html(&entry.document.body)));
    }
    Value::Object(m)
}

/// Converts a list of entries into an array of (bodiless) entry values.
pub fn entries_to_value(entries: &[&Entry]) -> Value {
    Value::Array(entries.iter().map(|e| entry_to_value(e, false)).collect())
}
