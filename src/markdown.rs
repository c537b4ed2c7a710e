//! Markdown to HTML conversion for document bodies.

use pulldown_cmark::{html, Options, Parser};

/// Converts a document body to HTML, appending the result to `w`. MDX bodies
/// are treated as plain markdown; embedded JSX passes through as raw HTML.
pub fn push_html(w: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(w, Parser::new_ext(markdown, options));
}

/// Converts a document body to HTML.
pub fn to_html(markdown: &str) -> String {
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    push_html(&mut html, markdown);
    html
}
