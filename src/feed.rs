//! Support for creating an Atom feed from the blog index.

use crate::config::Author;
use crate::index::Entry;
use atom_syndication::{Entry as AtomEntry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use std::io::Write;
use tracing::debug;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub author: Option<Author>,

    /// The absolute URL of the site. Entry URLs are this joined with the
    /// document's slug.
    pub site_url: Url,

    /// The URL of the page the feed mirrors (the blog index).
    pub home_page: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and the blog
/// index entries (newest first) and writes the result to a
/// [`std::io::Write`]. Undated entries are left out, so the same entries
/// always produce the same feed.
pub fn write_feed<W: Write>(config: FeedConfig, entries: &[&Entry], w: W) -> Result<()> {
    feed(config, entries)?.write_to(w)?;
    Ok(())
}

fn feed(config: FeedConfig, entries: &[&Entry]) -> Result<Feed> {
    let entries = feed_entries(&config, entries)?;
    // An empty feed is stamped with the Unix epoch.
    let updated = match entries.iter().map(|e| *e.updated()).max() {
        Some(updated) => updated,
        None => midnight_utc(NaiveDate::default())?,
    };

    let mut feed = Feed::default();
    feed.set_title(config.title);
    feed.set_id(config.home_page.to_string());
    feed.set_updated(updated);
    feed.set_authors(author_to_people(config.author));
    feed.set_links(vec![alternate_link(config.home_page.to_string())]);
    feed.set_entries(entries);
    Ok(feed)
}

fn feed_entries(config: &FeedConfig, entries: &[&Entry]) -> Result<Vec<AtomEntry>> {
    let mut feed_entries: Vec<AtomEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        let frontmatter = &entry.document.frontmatter;
        let date = match frontmatter.date {
            Some(date) => midnight_utc(date)?,
            None => {
                debug!(slug = %entry.fields.slug, "leaving undated document out of the feed");
                continue;
            }
        };
        let url = config
            .site_url
            .join(entry.fields.slug.trim_start_matches('/'))
            .map_err(|err| Error::Url {
                slug: entry.fields.slug.clone(),
                err,
            })?;

        let mut feed_entry = AtomEntry::default();
        feed_entry.set_id(url.to_string());
        feed_entry.set_title(frontmatter.title.clone().unwrap_or_else(|| entry.fields.slug.clone()));
        feed_entry.set_authors(author_to_people(config.author.clone()));
        feed_entry.set_links(vec![alternate_link(url.to_string())]);
        if let Some(desc) = &frontmatter.desc {
            feed_entry.set_summary(Some(Text::plain(desc.clone())));
        }
        feed_entry.set_updated(date);
        feed_entry.set_published(Some(date));
        feed_entries.push(feed_entry);
    }
    Ok(feed_entries)
}

fn utc() -> FixedOffset {
    Utc.fix()
}

fn midnight_utc(date: NaiveDate) -> Result<DateTime<FixedOffset>> {
    let naive = date.and_hms_opt(0, 0, 0).ok_or(Error::Date(date))?;
    Ok(utc().from_utc_datetime(&naive))
}

fn alternate_link(href: String) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn author_to_people(author: Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name);
            person.set_email(author.email);
            vec![person]
        }
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants include Atom, URL, and
/// date issues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when there is an Atom-related error.
    #[error(transparent)]
    Atom(#[from] AtomError),

    /// Returned when a document's slug can't be joined onto the site URL.
    #[error("building the feed URL for `{slug}`: {err}")]
    Url {
        slug: String,
        #[source]
        err: url::ParseError,
    },

    /// Returned when a document's date can't be converted to a timestamp.
    #[error("can't convert `{0}` to a timestamp")]
    Date(NaiveDate),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::test::annotated;
    use crate::index::{ContentIndex, Filter, Sort};

    fn config() -> std::result::Result<FeedConfig, url::ParseError> {
        Ok(FeedConfig {
            title: "Example".to_owned(),
            author: Some(Author {
                name: "Jo".to_owned(),
                email: None,
            }),
            site_url: Url::parse("https://example.com/blog/")?,
            home_page: Url::parse("https://example.com/blog/en/blog")?,
        })
    }

    fn render(entries: &[&Entry]) -> std::result::Result<String, Box<dyn std::error::Error>> {
        let mut out = Vec::new();
        write_feed(config()?, entries, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_write_feed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = ContentIndex::new(annotated(&[
            (
                "hello.md",
                "title: Hello\nlang: en\ntype: blog\npublished: true\ndate: 2023-01-01\ndesc: Greetings",
            ),
            ("undated.md", "title: Undated\nlang: en\ntype: blog\npublished: true"),
        ]))?;
        let entries = index.find(&Filter::default().published(true), Sort::DateDesc);

        let xml = render(&entries)?;
        assert!(xml.contains("https://example.com/blog/en/hello"));
        assert!(!xml.contains("https://example.com/blog/en/undated"));
        assert!(xml.contains("2023-01-01T00:00:00"));
        assert!(xml.contains("Greetings"));
        assert!(xml.contains("<name>Jo</name>"));
        Ok(())
    }

    #[test]
    fn test_write_feed_is_reproducible() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = ContentIndex::new(annotated(&[
            ("a.md", "title: A\nlang: en\ntype: blog\npublished: true\ndate: 2023-05-01"),
            ("b.md", "title: B\nlang: en\ntype: blog\npublished: true"),
        ]))?;
        let entries = index.find(&Filter::default().published(true), Sort::DateDesc);
        assert_eq!(render(&entries)?, render(&entries)?);
        assert!(render(&entries)?.contains("<updated>2023-05-01T00:00:00"));

        let empty = render(&[])?;
        assert_eq!(empty, render(&[])?);
        assert!(empty.contains("<updated>1970-01-01T00:00:00"));
        Ok(())
    }
}
