//! Site templates
//!
//! The default templates are compiled into the binary. Any `.html` file in
//! the configured templates directory replaces the embedded template of the
//! same name.

use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};
use thiserror::Error;

use super::{PageView, PostView};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Parse(String),

    #[error("Failed to render '{template}': {message}")]
    Render { template: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const EMBEDDED: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("post.html", include_str!("../../templates/post.html")),
    ("not_found.html", include_str!("../../templates/not_found.html")),
];

pub struct SiteTemplates {
    tera: Tera,
}

impl SiteTemplates {
    /// Embedded templates only
    pub fn embedded() -> Result<Self, TemplateError> {
        Self::build(Vec::new())
    }

    /// Embedded templates overlaid with the `.html` files in `dir`
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let overrides = if dir.is_dir() {
            collect_overrides(dir)?
        } else {
            tracing::debug!("No template overrides at {:?}", dir);
            Vec::new()
        };
        Self::build(overrides)
    }

    fn build(overrides: Vec<(String, String)>) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        let mut templates: Vec<(String, String)> = EMBEDDED
            .iter()
            .filter(|(name, _)| !overrides.iter().any(|(o, _)| o == name))
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect();
        for (name, _) in &overrides {
            tracing::info!("Using template override: {}", name);
        }
        templates.extend(overrides);
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::Parse(error_chain(&e)))?;

        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, TemplateError> {
        self.tera.render(template, context).map_err(|e| TemplateError::Render {
            template: template.to_string(),
            message: error_chain(&e),
        })
    }

    pub fn render_home(&self, page: &PageView) -> Result<String, TemplateError> {
        let mut context = TeraContext::new();
        context.insert("site_title", &page.site_title);
        context.insert("session_id", page.session_id);
        context.insert("page", page);
        self.render("index.html", &context)
    }

    pub fn render_post(&self, post: &PostView) -> Result<String, TemplateError> {
        let mut context = TeraContext::new();
        context.insert("site_title", &post.site_title);
        context.insert("session_id", post.session_id);
        context.insert("post", post);
        self.render("post.html", &context)
    }

    pub fn render_not_found(&self, site_title: &str, session_id: &str) -> Result<String, TemplateError> {
        let mut context = TeraContext::new();
        context.insert("site_title", site_title);
        context.insert("session_id", session_id);
        self.render("not_found.html", &context)
    }
}

fn collect_overrides(dir: &Path) -> Result<Vec<(String, String)>, TemplateError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "html") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                found.push((name.to_string(), fs::read_to_string(&path)?));
            }
        }
    }
    Ok(found)
}

fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Last-resort page when a template itself fails
pub fn error_page(message: &str) -> String {
    let escaped = message
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"UTF-8\"><title>Error</title></head>\
         <body><h1>Something went wrong</h1><p>{}</p></body></html>",
        escaped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Hero, Notice, SectionKey};
    use crate::render::{icons, ItemView, SectionView};

    fn page() -> PageView {
        PageView {
            site_title: "Ada's Portfolio".to_string(),
            session_id: "session-1",
            hero: Some(Hero::default()),
            about: None,
            sections: vec![SectionView {
                key: SectionKey::Skills,
                title: "Skills",
                used_fallback: false,
                items: vec![ItemView {
                    id: "1".to_string(),
                    position: 0,
                    delay_ms: 0,
                    icon: Some(icons::icon_for("code")),
                    period: None,
                    date: None,
                    summary: None,
                    fields: serde_json::json!({"name": "<Rust>"}).as_object().cloned().unwrap(),
                }],
            }],
            notices: vec![Notice::load_failed("blog")],
        }
    }

    #[test]
    fn test_render_home() {
        let templates = SiteTemplates::embedded().unwrap();
        let html = templates.render_home(&page()).unwrap();

        assert!(html.contains("data-session=\"session-1\""));
        assert!(html.contains("id=\"skills\""));
        assert!(html.contains("&lt;Rust&gt;"));
        assert!(html.contains("<svg"));
        assert!(html.contains("Could not load blog"));
        assert!(!html.contains("id=\"about\""));
    }

    #[test]
    fn test_render_post_keeps_markdown_html() {
        let templates = SiteTemplates::embedded().unwrap();
        let post = PostView {
            site_title: "Site".to_string(),
            session_id: "s",
            slug: "hello".to_string(),
            title: "Hello".to_string(),
            date: Some("Mar 4, 2024".to_string()),
            cover_image: None,
            html: "<h2 id=\"intro\">Intro</h2>".to_string(),
            toc: vec![crate::render::TocEntry {
                level: 2,
                id: "intro".to_string(),
                title: "Intro".to_string(),
            }],
        };
        let html = templates.render_post(&post).unwrap();
        assert!(html.contains("<h2 id=\"intro\">Intro</h2>"));
        assert!(html.contains("href=\"#intro\""));
    }

    #[test]
    fn test_override_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("not_found.html"),
            "{% extends \"base.html\" %}{% block content %}custom 404{% endblock %}",
        )
        .unwrap();

        let templates = SiteTemplates::load(dir.path()).unwrap();
        let html = templates.render_not_found("Site", "s").unwrap();
        assert!(html.contains("custom 404"));

        let missing = SiteTemplates::load(&dir.path().join("missing")).unwrap();
        assert!(!missing.render_not_found("Site", "s").unwrap().contains("custom 404"));
    }

    #[test]
    fn test_broken_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "{% if %}").unwrap();
        assert!(matches!(SiteTemplates::load(dir.path()), Err(TemplateError::Parse(_))));
    }

    #[test]
    fn test_error_page_escapes() {
        assert!(error_page("<script>").contains("&lt;script&gt;"));
    }
}
