//! Query description for content store reads
//!
//! A query names a collection, a conjunction of equality predicates and an
//! optional ordering hint. Identifiers are validated up front so both store
//! drivers can splice them into SQL paths or URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::StoreError;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").unwrap());

/// Check a collection or column name
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!("invalid identifier: {:?}", name)))
    }
}

/// `column = value`; a null value means `column IS NULL`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub value: Value,
}

/// Conjunction of equality predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        for predicate in &self.predicates {
            validate_identifier(&predicate.column)?;
            if matches!(predicate.value, Value::Array(_) | Value::Object(_)) {
                return Err(StoreError::InvalidQuery(format!(
                    "filter on '{}' must compare against a scalar",
                    predicate.column
                )));
            }
        }
        Ok(())
    }

    /// Predicates rendered in column order, for cache keys
    fn canonical(&self) -> String {
        let mut parts: Vec<String> = self
            .predicates
            .iter()
            .map(|p| format!("{}=eq.{}", p.column, p.value))
            .collect();
        parts.sort();
        parts.join("&")
    }
}

/// Sort request passed through to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHint {
    pub column: String,
    pub descending: bool,
}

impl OrderHint {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), descending: false }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), descending: true }
    }
}

/// A read against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Filter,
    pub order: Option<OrderHint>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Filter::new(),
            order: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = self.filter.eq(column, value);
        self
    }

    pub fn order_by(mut self, hint: OrderHint) -> Self {
        self.order = Some(hint);
        self
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_identifier(&self.collection)?;
        self.filter.validate()?;
        if let Some(order) = &self.order {
            validate_identifier(&order.column)?;
        }
        Ok(())
    }

    /// Deterministic key over collection, filter and order
    pub fn cache_key(&self) -> String {
        let order = match &self.order {
            Some(hint) => format!(
                "{}.{}",
                hint.column,
                if hint.descending { "desc" } else { "asc" }
            ),
            None => "natural".to_string(),
        };
        format!("{}?{}#{}", self.collection, self.filter.canonical(), order)
    }
}
