//! Renders planned page requests through their templates into the output
//! directory.

use crate::emit::{PageContext, PageRequest, TemplateId};
use crate::frontmatter::BLOG;
use crate::index::{ContentIndex, Filter, Sort};
use crate::value::{entries_to_value, entry_to_value};
use gtmpl::{Template, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use url::Url;

/// The file name of every rendered page inside its directory.
const PAGE_FILE_NAME: &str = "index.html";

/// Templates and shared data for rendering [`PageRequest`]s to disk.
pub struct Renderer<'a> {
    /// The content index templates look their data up in.
    pub index: &'a ContentIndex,

    /// The template for each kind of page.
    pub templates: &'a HashMap<TemplateId, Template>,

    /// The site title. This is made available to every template as
    /// `.site.title`.
    pub site_title: &'a str,

    /// The site URL. This is made available to every template as
    /// `.site.url`.
    pub site_url: &'a Url,

    /// The directory the pages are written to.
    pub output_directory: &'a Path,
}

impl Renderer<'_> {
    /// Resolves the data for each request, templates it, and writes it to
    /// `{output_directory}{path}/index.html`.
    pub fn render_pages(&self, requests: &[PageRequest]) -> Result<()> {
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        for request in requests {
            let file_path = self.output_file(&request.path)?;
            if let Some(dir) = file_path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir)?;
                }
            }
            let template = self
                .templates
                .get(&request.template)
                .ok_or(Error::MissingTemplate(request.template))?;
            let item = self.resolve(request)?;
            self.write_page(template, &request.path, item, &file_path)?;
            debug!(path = %request.path, file = %file_path.display(), "rendered page");
        }
        Ok(())
    }

    /// Renders `template` without page data to `file_path`. Used for pages
    /// that don't correspond to a request, like the 404 page.
    pub fn render_standalone(&self, template: &Template, path: &str, file_path: &Path) -> Result<()> {
        if let Some(dir) = file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        self.write_page(template, path, Value::Nil, file_path)
    }

    /// Looks up the data a request's template displays, keyed by the
    /// request's context.
    fn resolve(&self, request: &PageRequest) -> Result<Value> {
        match (&request.template, &request.context) {
            (TemplateId::Post, PageContext::Slug(slug)) | (TemplateId::About, PageContext::Slug(slug)) => {
                match self.index.get(slug) {
                    Some(entry) => Ok(entry_to_value(entry, true)),
                    None => Err(Error::UnknownSlug(slug.clone())),
                }
            }
            (TemplateId::Tag, PageContext::Tag(tag)) => {
                let filter = Filter::default().published(true).kind_eq(BLOG).tag(tag);
                let entries = self.index.find(&filter, Sort::DateDesc);
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert("tag".to_owned(), Value::String(tag.clone()));
                m.insert("total_count".to_owned(), Value::from(entries.len() as u64));
                m.insert("documents".to_owned(), entries_to_value(&entries));
                Ok(Value::Object(m))
            }
            (TemplateId::BlogIndex, PageContext::Lang(lang)) => {
                let entries = self.index.find(&blog_filter(lang), Sort::DateDesc);
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert("lang".to_owned(), Value::String(lang.clone()));
                m.insert("documents".to_owned(), entries_to_value(&entries));
                Ok(Value::Object(m))
            }
            (template, context) => Err(Error::MismatchedContext {
                template: *template,
                context: context.clone(),
            }),
        }
    }

    /// Templates a single page and writes it to disk. The template data is
    /// an object with fields `item`, `page` and `site`.
    fn write_page(&self, template: &Template, path: &str, item: Value, file_path: &Path) -> Result<()> {
        let mut site: HashMap<String, Value> = HashMap::new();
        site.insert("title".to_owned(), Value::String(self.site_title.to_owned()));
        site.insert("url".to_owned(), Value::String(self.site_url.to_string()));

        let mut page: HashMap<String, Value> = HashMap::new();
        page.insert("path".to_owned(), Value::String(path.to_owned()));

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), item);
        m.insert("page".to_owned(), Value::Object(page));
        m.insert("site".to_owned(), Value::Object(site));

        let context = gtmpl::Context::from(Value::Object(m)).map_err(Error::Template)?;
        let mut file = std::fs::File::create(file_path)?;
        template.execute(&mut file, &context).map_err(Error::Template)?;
        Ok(())
    }

    /// Maps a URL path to the output file, refusing paths that could escape
    /// the output directory.
    fn output_file(&self, path: &str) -> Result<PathBuf> {
        let mut file_path = self.output_directory.to_owned();
        for part in path.trim_start_matches('/').split('/') {
            if part.is_empty() && path.trim_matches('/').is_empty() {
                break;
            }
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(c)), None) if c == part => file_path.push(c),
                _ => return Err(Error::UnsafePath(path.to_owned())),
            }
        }
        file_path.push(PAGE_FILE_NAME);
        Ok(file_path)
    }
}

/// The filter selecting the posts listed on the blog index for `lang`.
pub fn blog_filter(lang: &str) -> Filter {
    Filter::default().published(true).kind_eq(BLOG).lang(lang)
}

/// Concatenates the template files and parses the result into a template.
pub fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        let text = std::fs::read_to_string(template_file).map_err(|err| Error::OpenTemplateFile {
            path: template_file.to_owned(),
            err,
        })?;
        contents.push_str(&text);
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of a fallible page-rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-rendering operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error opening a template file.
    #[error("opening template file `{}`: {err}", path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// An error parsing a template.
    #[error("parsing template: {0}")]
    ParseTemplate(String),

    /// An error during templating.
    #[error("executing template: {0}")]
    Template(String),

    /// A request for a kind of page no template was loaded for.
    #[error("no template for `{0}` pages")]
    MissingTemplate(TemplateId),

    /// A request whose context doesn't fit its template.
    #[error("`{template}` page can't be rendered with `{context}`")]
    MismatchedContext {
        template: TemplateId,
        context: PageContext,
    },

    /// A request for a document the index doesn't hold.
    #[error("no document with slug `{0}`")]
    UnknownSlug(String),

    /// A page path that would be written outside the output directory.
    #[error("refusing to write page `{0}` outside of the output directory")]
    UnsafePath(String),

    /// An error writing the output files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::emit::emit_pages;
    use crate::index::test::annotated;

    fn template(text: &str) -> Template {
        let mut template = Template::default();
        template.parse(text).unwrap();
        template
    }

    fn templates() -> HashMap<TemplateId, Template> {
        let mut templates = HashMap::new();
        templates.insert(
            TemplateId::Post,
            template("{{.site.title}}|{{.page.path}}|{{.item.title}}|{{.item.date}}|{{.item.body}}"),
        );
        templates.insert(TemplateId::About, template("about:{{.item.title}}"));
        templates.insert(
            TemplateId::Tag,
            template("{{.item.tag}}:{{.item.total_count}}:{{range .item.documents}}{{.title}};{{end}}"),
        );
        templates.insert(
            TemplateId::BlogIndex,
            template("{{.item.lang}}:{{range .item.documents}}{{.slug}};{{end}}"),
        );
        templates
    }

    #[test]
    fn test_render_pages() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = ContentIndex::new(annotated(&[
            ("about.md", "title: About me\nlang: en\ntype: single-page\npublished: true"),
            (
                "hello/index.md",
                "title: Hello\nlang: en\ntype: blog\npublished: true\ndate: 2023-01-01\ntags: [rust]",
            ),
            (
                "later.md",
                "title: Later\nlang: en\ntype: blog\npublished: true\ndate: 2023-06-01\ntags: [rust]",
            ),
        ]))?;
        let mut requests = Vec::new();
        emit_pages(&index, &mut requests)?;

        let dir = tempfile::tempdir()?;
        let templates = templates();
        let site_url = Url::parse("https://example.com/")?;
        let renderer = Renderer {
            index: &index,
            templates: &templates,
            site_title: "Example",
            site_url: &site_url,
            output_directory: dir.path(),
        };
        renderer.render_pages(&requests)?;

        let read = |p: &str| std::fs::read_to_string(dir.path().join(p));
        assert_eq!(
            "Example|/en/hello|Hello|01 January, 2023|<p>body of hello/index.md</p>\n",
            read("en/hello/index.html")?
        );
        assert_eq!("about:About me", read("en/about/index.html")?);
        assert_eq!("rust:2:Later;Hello;", read("en/tag/rust/index.html")?);
        assert_eq!("en:/en/later;/en/hello;", read("en/blog/index.html")?);
        Ok(())
    }

    #[test]
    fn test_output_file() {
        let index = ContentIndex::default();
        let templates = HashMap::new();
        let site_url = Url::parse("https://example.com/").unwrap();
        let renderer = Renderer {
            index: &index,
            templates: &templates,
            site_title: "",
            site_url: &site_url,
            output_directory: Path::new("/out"),
        };
        assert_eq!(
            PathBuf::from("/out/en/tag/big data/index.html"),
            renderer.output_file("/en/tag/big data").unwrap()
        );
        assert_eq!(PathBuf::from("/out/en/index.html"), renderer.output_file("/en").unwrap());
        for path in &["/en/tag/..", "/en//x", "/en/tag/./x"] {
            assert!(matches!(renderer.output_file(path), Err(Error::UnsafePath(_))), "{}", path);
        }
    }

    #[test]
    fn test_mismatched_context() {
        let index = ContentIndex::default();
        let templates = templates();
        let dir = tempfile::tempdir().unwrap();
        let site_url = Url::parse("https://example.com/").unwrap();
        let renderer = Renderer {
            index: &index,
            templates: &templates,
            site_title: "",
            site_url: &site_url,
            output_directory: dir.path(),
        };
        let request = PageRequest {
            path: "/en/x".to_owned(),
            template: TemplateId::Tag,
            context: PageContext::Slug("/en/x".to_owned()),
            content_file: None,
        };
        assert!(matches!(
            renderer.render_pages(&[request]),
            Err(Error::MismatchedContext { .. })
        ));
    }
}
