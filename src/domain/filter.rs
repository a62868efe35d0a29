use crate::domain::table::Table;
use serde_json::Value;
use std::collections::BTreeMap;

/// Filter accepted by `list`. Keys a table does not recognize are dropped when
/// the filter is resolved against that table, never rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub search: Option<String>,
    pub equals: BTreeMap<String, Value>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// A filter narrowed to the columns one table recognizes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFilter {
    pub search: Option<String>,
    pub search_columns: &'static [&'static str],
    pub equals: Vec<(&'static str, Value)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(column.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Builds a filter from a loosely shaped JSON object such as
    /// `{"search": "smith", "is_active": true, "limit": 20}`.
    pub fn from_json(value: &Value) -> Self {
        let mut filter = ListFilter::default();
        let Some(object) = value.as_object() else {
            return filter;
        };

        for (key, value) in object {
            match key.as_str() {
                "search" => filter.search = value.as_str().map(str::to_string),
                "limit" => filter.limit = value.as_u64().map(|n| n as usize),
                "offset" => filter.offset = value.as_u64().map(|n| n as usize),
                _ => {
                    filter.equals.insert(key.clone(), value.clone());
                }
            }
        }
        filter
    }

    pub fn resolve(&self, table: Table) -> ResolvedFilter {
        let recognized = table.filter_columns();
        let mut equals = Vec::new();

        for (key, value) in &self.equals {
            match recognized.iter().find(|column| **column == key.as_str()) {
                Some(column) => equals.push((*column, value.clone())),
                None => {
                    tracing::debug!(table = %table, key = %key, "ignoring unrecognized list filter key");
                }
            }
        }

        let search = self
            .search
            .as_deref()
            .map(normalize_search)
            .filter(|term| !term.is_empty() && !table.search_columns().is_empty());

        ResolvedFilter {
            search,
            search_columns: table.search_columns(),
            equals,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl ResolvedFilter {
    /// First equality predicate on an indexed column, if any.
    pub fn indexed_predicate(&self, table: Table) -> Option<(&'static str, &Value)> {
        self.equals
            .iter()
            .find(|(column, _)| table.indexes().contains(column))
            .map(|(column, value)| (*column, value))
    }

    /// Whether a canonical JSON object passes the equality and search predicates.
    pub fn matches(&self, object: &serde_json::Map<String, Value>) -> bool {
        let equal = self
            .equals
            .iter()
            .all(|(column, expected)| values_equal(object.get(*column), expected));
        if !equal {
            return false;
        }

        match &self.search {
            Some(term) => {
                let needle = term.to_lowercase();
                self.search_columns.iter().any(|column| {
                    object
                        .get(*column)
                        .and_then(Value::as_str)
                        .map(|text| text.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
            None => true,
        }
    }

    /// Applies offset then limit.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0);
        let iter = items.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Drops characters that carry meaning in a remote `or=(...)` expression, so
/// both backends match the same term.
fn normalize_search(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None, Value::Null) | (Some(Value::Null), Value::Null) => true,
        (None, _) => false,
        (Some(actual), expected) if actual == expected => true,
        // "true" from a query string against a boolean column
        (Some(actual), Value::String(expected)) => match actual {
            Value::Bool(b) => b.to_string() == *expected,
            Value::Number(n) => n.to_string() == *expected,
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unrecognized_keys_are_dropped() {
        let filter = ListFilter::from_json(&json!({
            "household_id": "h1",
            "favorite_color": "blue",
            "limit": 5
        }));

        let resolved = filter.resolve(Table::Children);
        assert_eq!(resolved.equals, vec![("household_id", json!("h1"))]);
        assert_eq!(resolved.limit, Some(5));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let resolved = ListFilter::new().search("   ").resolve(Table::Children);
        assert_eq!(resolved.search, None);
    }

    #[test]
    fn test_matches_search_and_flags() {
        let resolved = ListFilter::new()
            .search("SMI")
            .eq("is_active", true)
            .resolve(Table::Children);

        let row = json!({"first_name": "Ann", "last_name": "Smith", "is_active": true});
        assert!(resolved.matches(row.as_object().unwrap()));

        let inactive = json!({"first_name": "Ann", "last_name": "Smith", "is_active": false});
        assert!(!resolved.matches(inactive.as_object().unwrap()));

        let string_flag = ListFilter::new().eq("is_active", "true").resolve(Table::Children);
        assert!(string_flag.matches(row.as_object().unwrap()));
    }

    #[test]
    fn test_search_term_is_normalized() {
        let resolved = ListFilter::new().search(" smi(th ").resolve(Table::Children);
        assert_eq!(resolved.search.as_deref(), Some("smith"));

        let row = json!({"first_name": "Ann", "last_name": "Smith"});
        assert!(resolved.matches(row.as_object().unwrap()));

        let only_symbols = ListFilter::new().search("(*)").resolve(Table::Children);
        assert_eq!(only_symbols.search, None);
    }

    #[test]
    fn test_paginate() {
        let resolved = ListFilter::new().offset(1).limit(2).resolve(Table::Households);
        assert_eq!(resolved.paginate(vec![1, 2, 3, 4]), vec![2, 3]);
    }
}
