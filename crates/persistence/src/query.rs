//! Encoding of list queries into the backend's `queries[]` parameters.
//!
//! Each query is a JSON object `{"method", "attribute", "values"}` passed as a
//! separate `queries[]` query-string value.

use domain::models::{ListQuery, Predicate, SortDirection};
use serde_json::{json, Value};

/// Query-string key under which each query is sent.
pub const QUERY_PARAM: &str = "queries[]";

/// Encodes a list query: predicates first, then order, limit and offset.
pub fn encode_queries(query: &ListQuery) -> Vec<String> {
    let mut encoded: Vec<Value> = query.predicates.iter().map(encode_predicate).collect();

    if let Some(sort) = &query.sort {
        let method = match sort.direction {
            SortDirection::Asc => "orderAsc",
            SortDirection::Desc => "orderDesc",
        };
        encoded.push(json!({ "method": method, "attribute": sort.field }));
    }
    if let Some(limit) = query.limit {
        encoded.push(json!({ "method": "limit", "values": [limit] }));
    }
    if let Some(offset) = query.offset {
        encoded.push(json!({ "method": "offset", "values": [offset] }));
    }

    encoded.iter().map(Value::to_string).collect()
}

/// Query-string pairs ready for `RequestBuilder::query`.
pub fn query_pairs(query: &ListQuery) -> Vec<(&'static str, String)> {
    encode_queries(query)
        .into_iter()
        .map(|q| (QUERY_PARAM, q))
        .collect()
}

fn encode_predicate(predicate: &Predicate) -> Value {
    let (method, values) = match predicate {
        Predicate::Search { value, .. } => ("search", vec![Value::String(value.clone())]),
        Predicate::Equal { values, .. } => ("equal", values.clone()),
        Predicate::GreaterThan { value, .. } => ("greaterThan", vec![value.clone()]),
        Predicate::GreaterThanEqual { value, .. } => ("greaterThanEqual", vec![value.clone()]),
        Predicate::LessThan { value, .. } => ("lessThan", vec![value.clone()]),
        Predicate::LessThanEqual { value, .. } => ("lessThanEqual", vec![value.clone()]),
    };

    json!({
        "method": method,
        "attribute": predicate.attribute(),
        "values": values,
    })
}
