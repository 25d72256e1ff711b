//! Markdown rendering for blog posts
//!
//! pulldown-cmark parses, syntect highlights fenced code, and every heading
//! gets a stable anchor id that the table of contents links to.
//!
//! # Example
//!
//! ```
//! use folio::render::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let doc = renderer.render("# Hello World\n\nThis is **bold** text.");
//! assert!(doc.html.contains("<h1 id=\"hello-world\">"));
//! assert_eq!(doc.toc[0].title, "Hello World");
//! ```

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const DEFAULT_THEME: &str = "base16-ocean.dark";

/// One heading in the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub title: String,
}

/// Rendered HTML plus the headings it contains
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Thread-safe renderer; syntax and theme sets are loaded once
#[derive(Clone)]
pub struct MarkdownRenderer {
    syntax_set: Arc<SyntaxSet>,
    theme_set: Arc<ThemeSet>,
    theme_name: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Use a specific syntect theme, falling back to the default when unknown
    pub fn with_theme(theme_name: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        let theme_name = if theme_set.themes.contains_key(theme_name) {
            theme_name.to_string()
        } else {
            DEFAULT_THEME.to_string()
        };

        Self {
            syntax_set: Arc::new(SyntaxSet::load_defaults_newlines()),
            theme_set: Arc::new(theme_set),
            theme_name,
        }
    }

    pub fn render(&self, markdown: &str) -> RenderedMarkdown {
        let parser = Parser::new_ext(markdown, parser_options());
        let mut toc = Vec::new();
        let events = self.process_events(parser, &mut toc);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedMarkdown {
            html: html_output,
            toc,
        }
    }

    fn process_events<'a>(&self, parser: Parser<'a>, toc: &mut Vec<TocEntry>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut used_ids: HashMap<String, usize> = HashMap::new();

        let mut code: Option<(Option<String>, String)> = None;
        let mut heading: Option<(u8, Option<String>, Vec<Event<'a>>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                        _ => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, content)) = code.take() {
                        let block = match lang {
                            Some(lang) => self.highlight_code(&content, &lang),
                            None => plain_code_block(&content, None),
                        };
                        events.push(Event::Html(block.into()));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, content)) = code.as_mut() {
                        content.push_str(&text);
                    }
                }
                Event::Start(Tag::Heading { level, id, .. }) => {
                    heading = Some((level as u8, id.map(|id| id.to_string()), Vec::new(), String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, explicit_id, inner, text)) = heading.take() {
                        let title = text.trim().to_string();
                        let base = explicit_id.unwrap_or_else(|| slugify(&title));
                        let id = unique_id(base, &mut used_ids);

                        events.push(Event::Html(
                            format!("<h{} id=\"{}\">", level, html_escape(&id)).into(),
                        ));
                        events.extend(inner);
                        events.push(Event::Html(format!("</h{}>\n", level).into()));

                        toc.push(TocEntry { level, id, title });
                    }
                }
                other => match heading.as_mut() {
                    Some((_, _, inner, text)) => {
                        if let Event::Text(t) | Event::Code(t) = &other {
                            text.push_str(t);
                        }
                        inner.push(other);
                    }
                    None => events.push(other),
                },
            }
        }

        events
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang));

        match (syntax, self.theme_set.themes.get(&self.theme_name)) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                    .unwrap_or_else(|_| plain_code_block(code, Some(lang)))
            }
            _ => plain_code_block(code, Some(lang)),
        }
    }
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            html_escape(lang),
            html_escape(code)
        ),
        None => format!("<pre><code>{}</code></pre>", html_escape(code)),
    }
}

/// Anchor id for a heading: lowercase words joined by `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn unique_id(base: String, used: &mut HashMap<String, usize>) -> String {
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{}-{}", base, *count - 1)
    }
}

/// Plain text of a markdown document, cut at a word boundary
pub fn excerpt(markdown: &str, max_chars: usize) -> String {
    let mut text = String::new();
    for event in Parser::new_ext(markdown, parser_options()) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_)) => text.push(' '),
            _ => {}
        }
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
