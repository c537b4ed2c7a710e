//! Defines the [`Frontmatter`] type and the logic for splitting a content
//! document into its YAML frontmatter and its body.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// The `type` of documents that stand alone (e.g., the about page) rather
/// than appearing in the blog.
pub const SINGLE_PAGE: &str = "single-page";

/// The `type` of blog posts.
pub const BLOG: &str = "blog";

/// The metadata block at the top of a content document. Only `lang` is
/// required for a document to be annotated, but that requirement is checked
/// by [`crate::annotate`] so that the error can name the offending file.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    /// The publication date. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<NaiveDate>,

    /// The language code, e.g. `en`. Every public slug is prefixed with it.
    #[serde(default)]
    pub lang: Option<String>,

    /// The document kind, e.g. [`SINGLE_PAGE`] or [`BLOG`].
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub published: bool,

    #[serde(default)]
    pub desc: Option<String>,

    /// The tags in declaration order. Tags are kept verbatim.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// A reference to the cover image.
    #[serde(default)]
    pub cover: Option<String>,
}

impl Frontmatter {
    /// Returns true if the document's `type` equals `kind`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date `{}`", s))),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Splits `input` into its parsed [`Frontmatter`] and the remaining body.
/// The input must begin with a `---` fence and the frontmatter ends at the
/// next line consisting of `---`.
///
/// ```md
/// ---
/// title: Hello, world!
/// date: 2023-01-01
/// lang: en
/// tags: [greet]
/// ---
/// # Hello
/// ```
pub fn split(input: &str) -> Result<(Frontmatter, &str)> {
    const FENCE: &str = "---";

    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    if !input.starts_with(FENCE) {
        return Err(Error::MissingStartFence);
    }
    let rest = &input[FENCE.len()..];
    let yaml_stop = match rest.find("\n---") {
        None => return Err(Error::MissingEndFence),
        Some(offset) => offset,
    };
    let yaml = &rest[..yaml_stop];
    let after_fence = &rest[yaml_stop + 1 + FENCE.len()..];
    let body = match after_fence.find('\n') {
        Some(i) => &after_fence[i + 1..],
        None => "",
    };

    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    Ok((frontmatter, body))
}

/// Represents the result of a frontmatter-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error splitting or parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a document is missing its starting fence (`---`).
    #[error("document must begin with `---`")]
    MissingStartFence,

    /// Returned when the starting fence was found but the terminal one was
    /// missing.
    #[error("missing closing `---`")]
    MissingEndFence,

    /// Returned when the frontmatter isn't valid YAML or doesn't match
    /// [`Frontmatter`].
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),
}
