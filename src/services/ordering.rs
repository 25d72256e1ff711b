//! Section ordering rules
//!
//! Every rule is a stable sort, so rows that compare equal keep the order
//! the store returned them in.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::models::{ContentItem, WorkHistoryItem};
use crate::store::OrderHint;

/// How a section's rows are ordered after fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingRule {
    /// Ascending `display_order`, rows without one last
    DisplayOrder,
    /// Current positions first, then latest end date, then latest start date
    WorkHistory,
    /// Descending by the date in the named column, undated rows last
    Newest(&'static str),
}

impl Default for OrderingRule {
    fn default() -> Self {
        Self::DisplayOrder
    }
}

impl OrderingRule {
    /// Ordering the store can apply up front
    pub fn order_hint(&self) -> Option<OrderHint> {
        match self {
            Self::DisplayOrder => Some(OrderHint::asc("display_order")),
            Self::WorkHistory => None,
            Self::Newest(column) => Some(OrderHint::desc(*column)),
        }
    }

    pub fn apply(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        match self {
            Self::DisplayOrder => by_display_order(items),
            Self::WorkHistory => by_work_history(items),
            Self::Newest(column) => by_newest(items, column),
        }
    }
}

/// `Some` before `None`; two `Some`s compare with `cmp`
fn present_first<T, F>(a: Option<T>, b: Option<T>, cmp: F) -> Ordering
where
    F: FnOnce(T, T) -> Ordering,
{
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn by_display_order(mut items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.sort_by(|a, b| present_first(a.display_order, b.display_order, |a, b| a.cmp(&b)));
    items
}

pub fn compare_work_history(a: &WorkHistoryItem, b: &WorkHistoryItem) -> Ordering {
    b.effective_end()
        .cmp(&a.effective_end())
        .then_with(|| present_first(a.start_date, b.start_date, |a, b| b.cmp(&a)))
}

pub fn by_work_history(items: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut entries: Vec<WorkHistoryItem> = items.into_iter().map(WorkHistoryItem::from_item).collect();
    entries.sort_by(compare_work_history);
    entries.into_iter().map(WorkHistoryItem::into_item).collect()
}

pub fn by_newest(items: Vec<ContentItem>, column: &str) -> Vec<ContentItem> {
    let mut keyed: Vec<(Option<NaiveDate>, ContentItem)> = items
        .into_iter()
        .map(|item| (item.get_date(column), item))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| present_first(*a, *b, |a, b| b.cmp(&a)));
    keyed.into_iter().map(|(_, item)| item).collect()
}
