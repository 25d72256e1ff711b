//! Section catalogue
//!
//! Static description of every list section on the home page: where its rows
//! live, how they are ordered and what to show when the store has nothing.

use serde_json::json;

use super::ordering::OrderingRule;
use crate::models::{ContentItem, SectionKey};

/// Collection holding per-section visibility flags
pub const VISIBILITY_COLLECTION: &str = "section_visibility";
pub const HERO_COLLECTION: &str = "hero";
pub const PROFILE_COLLECTION: &str = "author_profile";

#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub key: SectionKey,
    pub title: &'static str,
    pub collection: &'static str,
    /// Whether rows carry an `is_visible` flag the loader filters on
    pub visibility_column: bool,
    pub ordering: OrderingRule,
    pub fallback: Option<fn() -> Vec<ContentItem>>,
    /// Fields admin writes must keep non-empty
    pub required_fields: &'static [&'static str],
}

pub static SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: SectionKey::Skills,
        title: "Skills",
        collection: "skills",
        visibility_column: true,
        ordering: OrderingRule::DisplayOrder,
        fallback: Some(default_skills),
        required_fields: &["name"],
    },
    SectionSpec {
        key: SectionKey::Services,
        title: "Services",
        collection: "services",
        visibility_column: true,
        ordering: OrderingRule::DisplayOrder,
        fallback: Some(default_services),
        required_fields: &["title", "description"],
    },
    SectionSpec {
        key: SectionKey::Testimonials,
        title: "Testimonials",
        collection: "testimonials",
        visibility_column: true,
        ordering: OrderingRule::DisplayOrder,
        fallback: None,
        required_fields: &["author", "quote"],
    },
    SectionSpec {
        key: SectionKey::Blog,
        title: "Blog",
        collection: "blog_posts",
        visibility_column: true,
        ordering: OrderingRule::Newest("published_at"),
        fallback: None,
        required_fields: &["title", "slug", "content"],
    },
    SectionSpec {
        key: SectionKey::Certifications,
        title: "Certifications",
        collection: "certifications",
        visibility_column: true,
        ordering: OrderingRule::DisplayOrder,
        fallback: None,
        required_fields: &["name", "issuer"],
    },
    SectionSpec {
        key: SectionKey::WorkHistory,
        title: "Experience",
        collection: "work_history",
        visibility_column: false,
        ordering: OrderingRule::WorkHistory,
        fallback: None,
        required_fields: &["company", "role", "start_date"],
    },
];

/// Catalogue entry for a list section; `None` for hero and about
pub fn spec_for(key: SectionKey) -> Option<&'static SectionSpec> {
    SECTIONS.iter().find(|spec| spec.key == key)
}

pub fn spec_for_collection(collection: &str) -> Option<&'static SectionSpec> {
    SECTIONS.iter().find(|spec| spec.collection == collection)
}

/// Collections the admin surface may write to
pub fn is_editable(collection: &str) -> bool {
    spec_for_collection(collection).is_some()
        || matches!(collection, HERO_COLLECTION | PROFILE_COLLECTION | VISIBILITY_COLLECTION)
}

pub fn required_fields(collection: &str) -> &'static [&'static str] {
    match collection {
        VISIBILITY_COLLECTION => &["section_key"],
        _ => spec_for_collection(collection)
            .map(|spec| spec.required_fields)
            .unwrap_or(&[]),
    }
}

/// Whether writes to `collection` default `is_visible` to true
pub fn has_visibility_column(collection: &str) -> bool {
    spec_for_collection(collection)
        .map(|spec| spec.visibility_column)
        .unwrap_or(false)
}

fn fallback_item(id: &str, order: i64, fields: serde_json::Value) -> ContentItem {
    let mut item = ContentItem::new(id).with_order(order);
    if let serde_json::Value::Object(map) = fields {
        item.fields = map;
    }
    item
}

fn default_skills() -> Vec<ContentItem> {
    [
        ("Rust", "code"),
        ("TypeScript", "code"),
        ("PostgreSQL", "database"),
        ("Cloud Infrastructure", "cloud"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (name, icon))| {
        fallback_item(
            &format!("fallback-skill-{}", i + 1),
            i as i64 + 1,
            json!({ "name": name, "icon": icon }),
        )
    })
    .collect()
}

fn default_services() -> Vec<ContentItem> {
    vec![
        fallback_item(
            "fallback-service-1",
            1,
            json!({
                "title": "Web Development",
                "description": "Fast, accessible sites and web applications built to last.",
                "icon": "code",
            }),
        ),
        fallback_item(
            "fallback-service-2",
            2,
            json!({
                "title": "Technical Consulting",
                "description": "Architecture reviews, performance work and team coaching.",
                "icon": "briefcase",
            }),
        ),
        fallback_item(
            "fallback-service-3",
            3,
            json!({
                "title": "Technical Writing",
                "description": "Documentation and articles that make hard topics approachable.",
                "icon": "pen",
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_list_section_has_a_spec() {
        for key in SectionKey::ALL {
            let expected = !matches!(key, SectionKey::Hero | SectionKey::About);
            assert_eq!(spec_for(key).is_some(), expected, "{}", key);
        }
    }

    #[test]
    fn test_collections_are_valid_identifiers() {
        for spec in SECTIONS {
            assert!(crate::store::validate_identifier(spec.collection).is_ok());
        }
    }

    #[test]
    fn test_fallbacks() {
        let skills = spec_for(SectionKey::Skills).and_then(|s| s.fallback).unwrap()();
        assert!(!skills.is_empty());
        assert!(skills.iter().all(|i| i.get_str("name").is_some()));

        let services = spec_for(SectionKey::Services).and_then(|s| s.fallback).unwrap()();
        assert_eq!(services.len(), 3);
        assert!(spec_for(SectionKey::Testimonials).unwrap().fallback.is_none());
    }

    #[test]
    fn test_editable_collections() {
        assert!(is_editable("skills"));
        assert!(is_editable("blog_posts"));
        assert!(is_editable("hero"));
        assert!(is_editable("section_visibility"));
        assert!(!is_editable("blog"));
        assert!(!is_editable("users"));
    }

    #[test]
    fn test_required_fields_and_visibility_column() {
        assert_eq!(required_fields("section_visibility"), &["section_key"]);
        assert_eq!(required_fields("hero"), &[] as &[&str]);
        assert!(has_visibility_column("skills"));
        assert!(!has_visibility_column("work_history"));
        assert!(!has_visibility_column("hero"));
    }
}
