//! Page section identifiers and visibility rows

use serde::{Deserialize, Serialize};

/// Every block the home page can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Hero,
    About,
    Skills,
    Services,
    Testimonials,
    Blog,
    Certifications,
    WorkHistory,
}

impl SectionKey {
    pub const ALL: [SectionKey; 8] = [
        Self::Hero,
        Self::About,
        Self::Skills,
        Self::Services,
        Self::Testimonials,
        Self::Blog,
        Self::Certifications,
        Self::WorkHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::About => "about",
            Self::Skills => "skills",
            Self::Services => "services",
            Self::Testimonials => "testimonials",
            Self::Blog => "blog",
            Self::Certifications => "certifications",
            Self::WorkHistory => "work_history",
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown section: {}", s))
    }
}

/// A row of the `section_visibility` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionVisibility {
    pub section_key: String,
    pub is_visible: bool,
}

/// Transient user-facing message about a degraded section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub section: String,
    pub message: String,
}

impl Notice {
    pub fn load_failed(section: &str) -> Self {
        Self {
            section: section.to_string(),
            message: format!("Could not load {}. Showing what we have.", section.replace('_', " ")),
        }
    }
}
