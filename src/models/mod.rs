//! Data models
//!
//! Content rows are schemaless documents; only the fields shared by every
//! collection are typed. Models cover:
//! - Generic content rows (ContentItem)
//! - Work history entries with parsed dates
//! - Section keys, visibility rows and user-facing notices
//! - The hero and author profile singletons

mod content;
mod profile;
mod section;
mod work_history;

pub use content::{parse_date, ContentItem, Row};
pub use profile::{AuthorProfile, Hero};
pub use section::{Notice, SectionKey, SectionVisibility};
pub use work_history::{EffectiveEnd, WorkHistoryItem};
