//! Singleton content: the hero banner and the author profile

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::ContentItem;

/// Hero banner at the top of the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hero {
    pub headline: String,
    pub subheadline: String,
    pub cta_label: String,
    pub cta_url: String,
    pub image_url: Option<String>,
}

impl Default for Hero {
    fn default() -> Self {
        Self {
            headline: "Hi, I build things for the web.".to_string(),
            subheadline: "Engineering, writing and the occasional side project.".to_string(),
            cta_label: "Get in touch".to_string(),
            cta_url: "#contact".to_string(),
            image_url: None,
        }
    }
}

/// Author profile rendered in the about section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorProfile {
    pub name: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    /// Network name -> profile URL
    pub social_links: BTreeMap<String, String>,
}

/// Overlay the stored row on top of the defaults.
///
/// Unknown or mistyped fields keep their default rather than failing the page.
fn merge_with_default<T>(item: &ContentItem) -> T
where
    T: Default + Serialize + for<'de> Deserialize<'de>,
{
    let mut base = match serde_json::to_value(T::default()) {
        Ok(Value::Object(map)) => map,
        _ => return T::default(),
    };
    for (key, value) in &item.fields {
        if value.is_null() || !base.contains_key(key) {
            continue;
        }
        let mut candidate = base.clone();
        candidate.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(candidate)).is_ok() {
            base.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(base)).unwrap_or_default()
}

impl Hero {
    pub fn from_item(item: &ContentItem) -> Self {
        merge_with_default(item)
    }
}

impl AuthorProfile {
    pub fn from_item(item: &ContentItem) -> Self {
        merge_with_default(item)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.bio.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_overrides_only_present_fields() {
        let item = ContentItem::new("1")
            .with_field("headline", "Hello")
            .with_field("unrelated", 5);
        let hero = Hero::from_item(&item);
        assert_eq!(hero.headline, "Hello");
        assert_eq!(hero.cta_label, Hero::default().cta_label);
    }

    #[test]
    fn test_mistyped_field_keeps_default() {
        let item = ContentItem::new("1")
            .with_field("name", "Ada")
            .with_field("bio", 17);
        let profile = AuthorProfile::from_item(&item);
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.bio, "");
    }

    #[test]
    fn test_social_links() {
        let item = ContentItem::new("1").with_field(
            "social_links",
            serde_json::json!({"github": "https://github.com/ada"}),
        );
        let profile = AuthorProfile::from_item(&item);
        assert_eq!(profile.social_links["github"], "https://github.com/ada");
        assert!(AuthorProfile::default().is_empty());
    }
}
