//! View rendering
//!
//! Turns loaded section content into view models the templates consume.
//! Everything here is a pure function of its inputs apart from the
//! process-wide session id.
//!
//! - [`render_section`]: one section with per-item animation delays
//! - [`icons`]: tag to SVG lookup
//! - [`markdown`]: blog post rendering
//! - [`templates`]: Tera templates for the HTML pages

pub mod icons;
pub mod markdown;
pub mod session;
pub mod templates;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::SiteConfig;
use crate::models::{AuthorProfile, ContentItem, Hero, Notice, SectionKey, WorkHistoryItem};
use crate::services::loader::SectionContent;
use crate::services::sections::SectionSpec;

pub use markdown::{MarkdownRenderer, RenderedMarkdown, TocEntry};
pub use templates::{SiteTemplates, TemplateError};

/// Entrance animation timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub base_delay_ms: u64,
    pub stagger_ms: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            base_delay_ms: 0,
            stagger_ms: 100,
        }
    }
}

impl RenderOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            base_delay_ms: config.animation_base_delay_ms,
            stagger_ms: config.animation_stagger_ms,
        }
    }

    pub fn delay_for(&self, position: usize) -> u64 {
        self.base_delay_ms
            .saturating_add((position as u64).saturating_mul(self.stagger_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub position: usize,
    pub delay_ms: u64,
    pub icon: Option<&'static str>,
    /// Work history, e.g. "Jan 2021 – Present"
    pub period: Option<String>,
    /// Blog publication date, e.g. "Mar 4, 2024"
    pub date: Option<String>,
    /// Blog teaser text
    pub summary: Option<String>,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub key: SectionKey,
    pub title: &'static str,
    pub used_fallback: bool,
    pub items: Vec<ItemView>,
}

/// Everything the home page template needs
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub site_title: String,
    pub session_id: &'static str,
    pub hero: Option<Hero>,
    pub about: Option<AuthorProfile>,
    pub sections: Vec<SectionView>,
    pub notices: Vec<Notice>,
}

/// A single rendered blog post
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub site_title: String,
    pub session_id: &'static str,
    pub slug: String,
    pub title: String,
    pub date: Option<String>,
    pub cover_image: Option<String>,
    pub html: String,
    pub toc: Vec<TocEntry>,
}

const SUMMARY_CHARS: usize = 180;

fn uses_icons(key: SectionKey) -> bool {
    matches!(key, SectionKey::Skills | SectionKey::Services | SectionKey::Certifications)
}

fn month_year(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// "Jan 2021 – Present", "Mar 2019 – Dec 2020", or whichever end is known
pub fn format_period(entry: &WorkHistoryItem) -> Option<String> {
    let end = if entry.is_current {
        Some("Present".to_string())
    } else {
        entry.end_date.map(month_year)
    };
    match (entry.start_date.map(month_year), end) {
        (Some(start), Some(end)) => Some(format!("{} – {}", start, end)),
        (Some(start), None) => Some(start),
        (None, Some(end)) => Some(end),
        (None, None) => None,
    }
}

fn item_view(key: SectionKey, position: usize, item: &ContentItem, options: &RenderOptions) -> ItemView {
    let icon = uses_icons(key).then(|| icons::icon_for(item.get_str("icon").unwrap_or_default()));

    let period = match key {
        SectionKey::WorkHistory => format_period(&WorkHistoryItem::from_item(item.clone())),
        _ => None,
    };

    let (date, summary) = match key {
        SectionKey::Blog => (
            item.get_date("published_at").map(format_date),
            item.get_str("excerpt")
                .map(str::to_string)
                .or_else(|| item.get_str("content").map(|md| markdown::excerpt(md, SUMMARY_CHARS))),
        ),
        _ => (None, None),
    };

    ItemView {
        id: item.id.clone(),
        position,
        delay_ms: options.delay_for(position),
        icon,
        period,
        date,
        summary,
        fields: item.fields.clone(),
    }
}

/// View for one list section, or `None` when it should not render
pub fn render_section(
    spec: &SectionSpec,
    visible: bool,
    content: &SectionContent,
    options: &RenderOptions,
) -> Option<SectionView> {
    if !visible || content.items.is_empty() {
        return None;
    }

    let items = content
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| item_view(spec.key, position, item, options))
        .collect();

    Some(SectionView {
        key: spec.key,
        title: spec.title,
        used_fallback: content.used_fallback,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sections::spec_for;

    fn content(items: Vec<ContentItem>) -> SectionContent {
        SectionContent {
            items,
            used_fallback: false,
            failure: None,
        }
    }

    #[test]
    fn test_hidden_or_empty_sections_are_omitted() {
        let spec = spec_for(SectionKey::Testimonials).unwrap();
        let options = RenderOptions::default();
        let items = content(vec![ContentItem::new("1")]);

        assert!(render_section(spec, false, &items, &options).is_none());
        assert!(render_section(spec, true, &content(Vec::new()), &options).is_none());
        assert!(render_section(spec, true, &items, &options).is_some());
    }

    #[test]
    fn test_delays_grow_with_position() {
        let spec = spec_for(SectionKey::Skills).unwrap();
        let options = RenderOptions {
            base_delay_ms: 50,
            stagger_ms: 120,
        };
        let items = content((0..4).map(|i| ContentItem::new(i.to_string())).collect());

        let view = render_section(spec, true, &items, &options).unwrap();
        let delays: Vec<u64> = view.items.iter().map(|i| i.delay_ms).collect();
        assert_eq!(delays, vec![50, 170, 290, 410]);
        assert_eq!(view.items[3].position, 3);
    }

    #[test]
    fn test_icons_resolved_for_icon_sections() {
        let item = ContentItem::new("1").with_field("icon", "code");
        let options = RenderOptions::default();

        let skills = render_section(spec_for(SectionKey::Skills).unwrap(), true, &content(vec![item.clone()]), &options)
            .unwrap();
        assert_eq!(skills.items[0].icon, Some(icons::icon_for("code")));

        let unknown = ContentItem::new("2").with_field("icon", "nope");
        let services = render_section(spec_for(SectionKey::Services).unwrap(), true, &content(vec![unknown]), &options)
            .unwrap();
        assert_eq!(services.items[0].icon, Some(icons::DEFAULT_ICON));

        let blog = render_section(spec_for(SectionKey::Blog).unwrap(), true, &content(vec![item]), &options).unwrap();
        assert_eq!(blog.items[0].icon, None);
    }

    #[test]
    fn test_work_history_period() {
        let job = ContentItem::new("1")
            .with_field("start_date", "2021-01-15")
            .with_field("is_current", true);
        let past = ContentItem::new("2")
            .with_field("start_date", "2019-03-01")
            .with_field("end_date", "2020-12-31");

        let view = render_section(
            spec_for(SectionKey::WorkHistory).unwrap(),
            true,
            &content(vec![job, past]),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(view.items[0].period.as_deref(), Some("Jan 2021 – Present"));
        assert_eq!(view.items[1].period.as_deref(), Some("Mar 2019 – Dec 2020"));
    }

    #[test]
    fn test_blog_summary_and_date() {
        let post = ContentItem::new("1")
            .with_field("title", "Hello")
            .with_field("published_at", "2024-03-04T09:00:00Z")
            .with_field("content", "Some **markdown** body.");
        let view = render_section(
            spec_for(SectionKey::Blog).unwrap(),
            true,
            &content(vec![post]),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(view.items[0].date.as_deref(), Some("Mar 4, 2024"));
        assert_eq!(view.items[0].summary.as_deref(), Some("Some markdown body."));
    }

    #[test]
    fn test_fallback_flag_is_carried() {
        let spec = spec_for(SectionKey::Services).unwrap();
        let fallback = SectionContent {
            items: spec.fallback.unwrap()(),
            used_fallback: true,
            failure: None,
        };
        let view = render_section(spec, true, &fallback, &RenderOptions::default()).unwrap();
        assert!(view.used_fallback);
    }
}
