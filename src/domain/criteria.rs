//! Query criteria: target collection, selector, projection and paging.
//!
//! A [`Criteria`] is what the executor hands to a driver, and also what the
//! query cache fingerprints. The selector language is intentionally small:
//! equality plus `$in`, `$ne` and `$exists` on dotted paths.

use crate::domain::document::{
    compare_values, get_path, remove_path, set_path, values_equal, Document, ID_FIELD,
};
use crate::domain::error::DocError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

const OPERATORS: [&str; 3] = ["$in", "$ne", "$exists"];

/// Which fields a query loads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "mode", content = "fields")]
pub enum Projection {
    #[default]
    All,
    Only(BTreeSet<String>),
    Without(BTreeSet<String>),
}

impl Projection {
    pub fn only<S: AsRef<str>>(self, fields: &[S]) -> Self {
        let fields = fields.iter().map(|f| f.as_ref().to_string());
        match self {
            Projection::Only(mut set) => {
                set.extend(fields);
                Projection::Only(set)
            }
            _ => Projection::Only(fields.collect()),
        }
    }

    pub fn without<S: AsRef<str>>(self, fields: &[S]) -> Self {
        let fields: Vec<String> = fields
            .iter()
            .map(|f| f.as_ref().to_string())
            .filter(|f| f != ID_FIELD)
            .collect();
        match self {
            Projection::All => Projection::Without(fields.into_iter().collect()),
            Projection::Without(mut set) => {
                set.extend(fields);
                Projection::Without(set)
            }
            Projection::Only(mut set) => {
                for field in &fields {
                    set.remove(field);
                }
                Projection::Only(set)
            }
        }
    }

    /// Whether the top-level field `name` is present on projected documents.
    /// A field that is only partially excluded still counts as loaded.
    pub fn is_loaded(&self, name: &str) -> bool {
        if name == ID_FIELD {
            return true;
        }
        match self {
            Projection::All => true,
            Projection::Only(set) => set
                .iter()
                .any(|p| p == name || p.strip_prefix(name).is_some_and(|r| r.starts_with('.'))),
            Projection::Without(set) => !set.contains(name),
        }
    }

    pub fn project(&self, doc: Document) -> Document {
        match self {
            Projection::All => doc,
            Projection::Only(set) => {
                let mut out = Document::new();
                if let Some(id) = doc.get(ID_FIELD) {
                    out.insert(ID_FIELD.to_string(), id.clone());
                }
                for path in set {
                    if let Some(value) = get_path(&doc, path) {
                        set_path(&mut out, path, value.clone());
                    }
                }
                out
            }
            Projection::Without(set) => {
                let mut doc = doc;
                for path in set {
                    remove_path(&mut doc, path);
                }
                doc
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Deterministic cache key for a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    pub collection: String,
    pub selector: Document,
    pub projection: Projection,
    pub sort: Vec<(String, SortDirection)>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl Criteria {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            selector: Document::new(),
            projection: Projection::All,
            sort: Vec::new(),
            skip: None,
            limit: None,
        }
    }

    /// Build criteria from a raw selector, rejecting unsupported operators
    pub fn with_selector(collection: impl Into<String>, selector: Document) -> Result<Self, DocError> {
        validate_selector(&selector)?;
        let mut criteria = Self::new(collection);
        criteria.selector = selector;
        Ok(criteria)
    }

    pub fn where_eq(mut self, path: impl Into<String>, value: Value) -> Self {
        self.selector.insert(path.into(), value);
        self
    }

    pub fn any_in(self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.with_operator(path.into(), "$in", Value::Array(values))
    }

    pub fn not_eq(self, path: impl Into<String>, value: Value) -> Self {
        self.with_operator(path.into(), "$ne", value)
    }

    pub fn exists(self, path: impl Into<String>, exists: bool) -> Self {
        self.with_operator(path.into(), "$exists", Value::Bool(exists))
    }

    fn with_operator(mut self, path: String, op: &str, value: Value) -> Self {
        match self.selector.get_mut(&path) {
            Some(Value::Object(ops)) if is_operator_object(ops) => {
                ops.insert(op.to_string(), value);
            }
            _ => {
                let mut ops = Map::new();
                ops.insert(op.to_string(), value);
                self.selector.insert(path, Value::Object(ops));
            }
        }
        self
    }

    pub fn only<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.projection = self.projection.only(fields);
        self
    }

    pub fn without<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.projection = self.projection.without(fields);
        self
    }

    pub fn asc(mut self, path: impl Into<String>) -> Self {
        self.sort.push((path.into(), SortDirection::Asc));
        self
    }

    pub fn desc(mut self, path: impl Into<String>) -> Self {
        self.sort.push((path.into(), SortDirection::Desc));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Selector value when the query targets a single `_id`
    pub fn id_equality(&self) -> Option<&str> {
        self.selector.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.selector
            .iter()
            .all(|(path, condition)| condition_matches(get_path(doc, path), condition))
    }

    /// Filter, sort, page and project a candidate set
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if !self.sort.is_empty() {
            matched.sort_by(|a, b| {
                for (path, direction) in &self.sort {
                    let left = get_path(a, path).unwrap_or(&Value::Null);
                    let right = get_path(b, path).unwrap_or(&Value::Null);
                    let ord = compare_values(left, right);
                    let ord = match direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    };
                    if ord.is_ne() {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        matched
            .into_iter()
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|d| self.projection.project(d))
            .collect()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let sort: Vec<Value> = self
            .sort
            .iter()
            .map(|(path, direction)| {
                let dir = match direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                };
                json!([path, dir])
            })
            .collect();

        let shape = json!({
            "collection": self.collection,
            "selector": self.selector,
            "projection": self.projection,
            "sort": sort,
            "skip": self.skip,
            "limit": self.limit,
        });

        let mut hasher = Sha256::new();
        hasher.update(shape.to_string().as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

fn validate_selector(selector: &Document) -> Result<(), DocError> {
    for (path, condition) in selector {
        if path.starts_with('$') {
            return Err(DocError::InvalidQuery(format!(
                "top-level operator '{}' is not supported",
                path
            )));
        }
        if let Value::Object(ops) = condition {
            if is_operator_object(ops) {
                for (op, arg) in ops {
                    if !OPERATORS.contains(&op.as_str()) {
                        return Err(DocError::InvalidQuery(format!(
                            "unsupported operator '{}' on '{}'",
                            op, path
                        )));
                    }
                    if op == "$in" && !arg.is_array() {
                        return Err(DocError::InvalidQuery(format!(
                            "'$in' on '{}' expects an array",
                            path
                        )));
                    }
                    if op == "$exists" && !arg.is_boolean() {
                        return Err(DocError::InvalidQuery(format!(
                            "'$exists' on '{}' expects a boolean",
                            path
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Equality also matches array members, as document stores do
fn equals_or_contains(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn condition_matches(actual: Option<&Value>, condition: &Value) -> bool {
    match condition {
        Value::Object(ops) if is_operator_object(ops) => ops.iter().all(|(op, arg)| match op.as_str() {
            "$in" => arg
                .as_array()
                .map(|candidates| candidates.iter().any(|c| equals_or_contains(actual, c)))
                .unwrap_or(false),
            "$ne" => !equals_or_contains(actual, arg),
            "$exists" => arg.as_bool().map(|b| actual.is_some() == b).unwrap_or(false),
            _ => false,
        }),
        expected => equals_or_contains(actual, expected),
    }
}
