//! Work history entries

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

use super::ContentItem;

/// End point used to order work history entries.
///
/// A current position ends after every dated one; a missing end date counts
/// as the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectiveEnd {
    Date(NaiveDate),
    Current,
}

impl Ord for EffectiveEnd {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Current, Self::Current) => Ordering::Equal,
            (Self::Current, Self::Date(_)) => Ordering::Greater,
            (Self::Date(_), Self::Current) => Ordering::Less,
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for EffectiveEnd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// A content item with its employment dates parsed
#[derive(Debug, Clone, PartialEq)]
pub struct WorkHistoryItem {
    pub item: ContentItem,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

impl WorkHistoryItem {
    pub fn from_item(item: ContentItem) -> Self {
        let start_date = item.get_date("start_date");
        let end_date = item.get_date("end_date");
        let is_current = item.get_bool("is_current").unwrap_or(false);
        Self {
            item,
            start_date,
            end_date,
            is_current,
        }
    }

    pub fn effective_end(&self) -> EffectiveEnd {
        if self.is_current {
            EffectiveEnd::Current
        } else {
            EffectiveEnd::Date(self.end_date.unwrap_or_else(epoch))
        }
    }

    pub fn into_item(self) -> ContentItem {
        self.item
    }
}
