//! Query building blocks for the remote document store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single filter condition composed into a list query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Full-text search on one attribute.
    Search { attribute: String, value: String },
    /// Attribute equals any of the given values.
    Equal { attribute: String, values: Vec<Value> },
    GreaterThan { attribute: String, value: Value },
    GreaterThanEqual { attribute: String, value: Value },
    LessThan { attribute: String, value: Value },
    LessThanEqual { attribute: String, value: Value },
}

impl Predicate {
    pub fn search(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Search {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    /// Equality-in-set predicate.
    pub fn equal_any<I, V>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::Equal {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn greater_than(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::GreaterThan {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn greater_than_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::GreaterThanEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn less_than(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::LessThan {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn less_than_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::LessThanEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// The attribute this predicate filters on.
    pub fn attribute(&self) -> &str {
        match self {
            Predicate::Search { attribute, .. }
            | Predicate::Equal { attribute, .. }
            | Predicate::GreaterThan { attribute, .. }
            | Predicate::GreaterThanEqual { attribute, .. }
            | Predicate::LessThan { attribute, .. }
            | Predicate::LessThanEqual { attribute, .. } => attribute,
        }
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Single-field sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A complete list query: predicates, window and ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListQuery {
    pub predicates: Vec<Predicate>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
    pub sort: Option<SortOrder>,
}

impl ListQuery {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Encodes a timestamp the way the document store compares datetime attributes.
pub fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_equal_any_collects_values() {
        let predicate = Predicate::equal_any("$id", ["u1", "u2"]);
        assert_eq!(
            predicate,
            Predicate::Equal {
                attribute: "$id".to_string(),
                values: vec![json!("u1"), json!("u2")],
            }
        );
        assert_eq!(predicate.attribute(), "$id");
    }

    #[test]
    fn test_list_query_builder() {
        let query = ListQuery::new(vec![Predicate::search("title", "hike")])
            .limit(10)
            .offset(20)
            .sort(SortOrder::asc("startDate"));

        assert_eq!(query.predicates.len(), 1);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(20));
        assert_eq!(query.sort.unwrap().direction, SortDirection::Asc);
    }

    #[test]
    fn test_timestamp_value_format() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(timestamp_value(ts), json!("2025-03-04T05:06:07.000Z"));
    }

    #[test]
    fn test_sort_direction_deserialize() {
        let direction: SortDirection = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(direction, SortDirection::Asc);
        assert_eq!(SortDirection::default(), SortDirection::Desc);
    }
}
