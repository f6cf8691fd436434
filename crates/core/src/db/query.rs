//! Filter documents and find options.
//!
//! Queries are plain JSON objects in the usual document-store dialect:
//! `{"vendor": "ACME"}` matches by equality, `{"size": {"$gt": 10}}` uses an
//! operator, and `$and` / `$or` / `$nor` combine sub-filters. Field names may
//! be dotted paths into nested documents (`processed_analysis.file_type.mime`).
//!
//! A `Query` is validated (and its regexes compiled) once at construction, so
//! matching itself cannot fail.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::db::{DbError, DbResult};

/// A stored JSON document.
pub type Document = Map<String, Value>;

/// A validated filter document.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filter: Document,
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    Field { path: String, conditions: Vec<Condition> },
    And(Vec<Vec<Clause>>),
    Or(Vec<Vec<Clause>>),
    Nor(Vec<Vec<Clause>>),
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Regex(Regex),
    Size(usize),
    Not(Vec<Condition>),
}

impl Query {
    /// The empty filter; matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Validate a filter document.
    pub fn new(filter: Document) -> DbResult<Self> {
        let clauses = parse_clauses(&filter)?;
        Ok(Self { filter, clauses })
    }

    /// Validate a filter given as an arbitrary JSON value (must be an object).
    pub fn from_value(value: Value) -> DbResult<Self> {
        match value {
            Value::Object(filter) => Self::new(filter),
            other => Err(DbError::InvalidQuery(format!("query must be a JSON object, got {other}"))),
        }
    }

    /// Parse a filter from JSON text.
    pub fn parse(text: &str) -> DbResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| DbError::InvalidQuery(format!("query is not valid JSON: {err}")))?;
        Self::from_value(value)
    }

    /// Equality filter on a single field.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let path = field.into();
        let value = value.into();
        let mut filter = Document::new();
        filter.insert(path.clone(), value.clone());
        Self { filter, clauses: vec![Clause::Field { path, conditions: vec![Condition::Eq(value)] }] }
    }

    /// Match a single document id.
    pub fn by_id(uid: &str) -> Self {
        Self::eq("_id", uid)
    }

    /// Match any of the given document ids.
    pub fn id_in<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = uids.into_iter().map(|uid| Value::String(uid.into())).collect();
        let mut operator = Document::new();
        operator.insert("$in".to_string(), Value::Array(values.clone()));
        let mut filter = Document::new();
        filter.insert("_id".to_string(), Value::Object(operator));
        Self {
            filter,
            clauses: vec![Clause::Field { path: "_id".to_string(), conditions: vec![Condition::In(values)] }],
        }
    }

    /// True for `{}`.
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }

    /// The filter document as given.
    pub fn as_document(&self) -> &Document {
        &self.filter
    }

    /// Check whether a document satisfies this filter.
    pub fn matches(&self, document: &Document) -> bool {
        all_clauses_match(&self.clauses, document)
    }

    /// Row ids a top-level `_id` equality or `$in` pins this filter to.
    ///
    /// Stores use it to read only the keyed rows; the full filter must still
    /// be applied to what they load.
    pub(crate) fn id_restriction(&self) -> Option<Vec<String>> {
        self.clauses.iter().find_map(|clause| match clause {
            Clause::Field { path, conditions } if path == "_id" => {
                conditions.iter().find_map(|condition| match condition {
                    Condition::Eq(value) => Some(vec![row_id(value)]),
                    Condition::In(values) => Some(values.iter().map(row_id).collect()),
                    _ => None,
                })
            }
            _ => None,
        })
    }
}

fn row_id(value: &Value) -> String {
    match value {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}

impl FromStr for Query {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.filter.clone()))
    }
}

fn parse_clauses(filter: &Document) -> DbResult<Vec<Clause>> {
    let mut clauses = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        let clause = match key.as_str() {
            "$and" => Clause::And(parse_filter_list(key, value)?),
            "$or" => Clause::Or(parse_filter_list(key, value)?),
            "$nor" => Clause::Nor(parse_filter_list(key, value)?),
            op if op.starts_with('$') => {
                return Err(DbError::InvalidQuery(format!("unknown top-level operator {op}")));
            }
            path => Clause::Field { path: path.to_string(), conditions: parse_conditions(value)? },
        };
        clauses.push(clause);
    }
    Ok(clauses)
}

fn parse_filter_list(operator: &str, value: &Value) -> DbResult<Vec<Vec<Clause>>> {
    let items = value
        .as_array()
        .ok_or_else(|| DbError::InvalidQuery(format!("{operator} expects an array of filters")))?;
    items
        .iter()
        .map(|item| match item {
            Value::Object(filter) => parse_clauses(filter),
            _ => Err(DbError::InvalidQuery(format!("{operator} entries must be objects"))),
        })
        .collect()
}

fn is_operator_document(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn parse_conditions(value: &Value) -> DbResult<Vec<Condition>> {
    let operators = match value {
        Value::Object(operators) if is_operator_document(value) => operators,
        literal => return Ok(vec![Condition::Eq(literal.clone())]),
    };

    let case_insensitive = match operators.get("$options") {
        Some(Value::String(options)) => options.contains('i'),
        Some(_) => return Err(DbError::InvalidQuery("$options must be a string".to_string())),
        None => false,
    };

    let mut conditions = Vec::with_capacity(operators.len());
    for (op, operand) in operators {
        let condition = match op.as_str() {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$gt" => Condition::Gt(operand.clone()),
            "$gte" => Condition::Gte(operand.clone()),
            "$lt" => Condition::Lt(operand.clone()),
            "$lte" => Condition::Lte(operand.clone()),
            "$in" => Condition::In(operand_list(op, operand)?),
            "$nin" => Condition::Nin(operand_list(op, operand)?),
            "$exists" => Condition::Exists(truthy(operand)),
            "$size" => {
                let size = operand
                    .as_u64()
                    .ok_or_else(|| DbError::InvalidQuery("$size expects a non-negative integer".into()))?;
                Condition::Size(size as usize)
            }
            "$regex" => {
                let pattern = operand
                    .as_str()
                    .ok_or_else(|| DbError::InvalidQuery("$regex expects a string".to_string()))?;
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|err| DbError::InvalidQuery(format!("invalid $regex: {err}")))?;
                Condition::Regex(regex)
            }
            "$options" => continue,
            "$not" => {
                if !is_operator_document(operand) {
                    return Err(DbError::InvalidQuery("$not expects an operator document".into()));
                }
                Condition::Not(parse_conditions(operand)?)
            }
            other => return Err(DbError::InvalidQuery(format!("unknown operator {other}"))),
        };
        conditions.push(condition);
    }
    Ok(conditions)
}

fn operand_list(op: &str, operand: &Value) -> DbResult<Vec<Value>> {
    operand
        .as_array()
        .cloned()
        .ok_or_else(|| DbError::InvalidQuery(format!("{op} expects an array")))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

fn all_clauses_match(clauses: &[Clause], document: &Document) -> bool {
    clauses.iter().all(|clause| clause_matches(clause, document))
}

fn clause_matches(clause: &Clause, document: &Document) -> bool {
    match clause {
        Clause::Field { path, conditions } => {
            let candidates = resolve_all(document, path);
            conditions.iter().all(|condition| condition_matches(condition, &candidates))
        }
        Clause::And(filters) => filters.iter().all(|f| all_clauses_match(f, document)),
        Clause::Or(filters) => filters.iter().any(|f| all_clauses_match(f, document)),
        Clause::Nor(filters) => !filters.iter().any(|f| all_clauses_match(f, document)),
    }
}

/// Candidate values at `path`, plus the elements of any array candidate.
fn flattened<'a>(candidates: &[&'a Value]) -> Vec<&'a Value> {
    let mut out = Vec::with_capacity(candidates.len());
    for value in candidates {
        out.push(*value);
        if let Value::Array(items) = value {
            out.extend(items.iter());
        }
    }
    out
}

fn condition_matches(condition: &Condition, candidates: &[&Value]) -> bool {
    match condition {
        Condition::Eq(expected) => equals_any(expected, candidates),
        Condition::Ne(expected) => !equals_any(expected, candidates),
        Condition::Gt(bound) => compares_any(bound, candidates, |o| o == Ordering::Greater),
        Condition::Gte(bound) => compares_any(bound, candidates, |o| o != Ordering::Less),
        Condition::Lt(bound) => compares_any(bound, candidates, |o| o == Ordering::Less),
        Condition::Lte(bound) => compares_any(bound, candidates, |o| o != Ordering::Greater),
        Condition::In(options) => options.iter().any(|option| equals_any(option, candidates)),
        Condition::Nin(options) => !options.iter().any(|option| equals_any(option, candidates)),
        Condition::Exists(expected) => candidates.is_empty() != *expected,
        Condition::Regex(regex) => flattened(candidates)
            .iter()
            .any(|value| value.as_str().is_some_and(|text| regex.is_match(text))),
        Condition::Size(size) => {
            candidates.iter().any(|value| value.as_array().is_some_and(|items| items.len() == *size))
        }
        Condition::Not(inner) => !inner.iter().all(|c| condition_matches(c, candidates)),
    }
}

fn equals_any(expected: &Value, candidates: &[&Value]) -> bool {
    if candidates.is_empty() {
        return expected.is_null();
    }
    flattened(candidates).iter().any(|value| values_equal(value, expected))
}

fn compares_any(bound: &Value, candidates: &[&Value], accept: impl Fn(Ordering) -> bool) -> bool {
    flattened(candidates).iter().any(|value| {
        same_kind(value, bound) && accept(compare_values(Some(value), Some(bound)))
    })
}

fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Bool(_), Value::Bool(_))
    )
}

/// Structural equality that treats `1` and `1.0` as the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Object(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Bool(_)) => 6,
    }
}

/// Total order used for sorting: missing < null < numbers < strings < objects < arrays < booleans.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(xs)), Some(Value::Array(ys))) => {
            for (x, y) in xs.iter().zip(ys) {
                let ord = compare_values(Some(x), Some(y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (Some(Value::Object(xs)), Some(Value::Object(ys))) => {
            for ((kx, x), (ky, y)) in xs.iter().zip(ys) {
                let ord = kx.cmp(ky).then_with(|| compare_values(Some(x), Some(y)));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => Ordering::Equal,
    }
}

/// Collect every value reachable at a dotted `path`, descending into arrays of documents.
pub fn resolve_all<'a>(document: &'a Document, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    if let Some((head, rest)) = segments.split_first() {
        if let Some(value) = document.get(*head) {
            resolve_into(value, rest, &mut out);
        }
    }
    out
}

fn resolve_into<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(next) = map.get(*head) {
                resolve_into(next, rest, out);
            }
        }
        Value::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if let Some(next) = items.get(index) {
                    resolve_into(next, rest, out);
                }
            } else {
                for item in items.iter().filter(|item| item.is_object()) {
                    resolve_into(item, segments, out);
                }
            }
        }
        _ => {}
    }
}

/// Look up a dotted path through nested documents only.
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at a dotted path, creating intermediate documents as needed.
pub fn set_path(document: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            document.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = document.entry(head.to_string()).or_insert_with(|| Value::Object(Document::new()));
            if !entry.is_object() {
                *entry = Value::Object(Document::new());
            }
            if let Value::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Ascending }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Descending }
    }
}

/// Stable sort of documents by the given keys.
pub fn sort_documents(documents: &mut [Document], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for key in keys {
            let ord = compare_values(get_path(a, &key.field), get_path(b, &key.field));
            let ord = match key.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Keep only `_id` and the listed dotted fields.
pub fn project_document(document: &Document, fields: &[String]) -> Document {
    let mut projected = Document::new();
    if let Some(id) = document.get("_id") {
        projected.insert("_id".to_string(), id.clone());
    }
    for field in fields {
        if let Some(value) = get_path(document, field) {
            set_path(&mut projected, field, value.clone());
        }
    }
    projected
}

/// Sort, skip, limit and projection passed through to a `find`.
///
/// A `limit` of `0` means "no limit".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub skip: usize,
    pub limit: usize,
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Apply these options to an already-filtered result set.
    pub fn apply(&self, mut documents: Vec<Document>) -> Vec<Document> {
        sort_documents(&mut documents, &self.sort);
        let take = if self.limit == 0 { usize::MAX } else { self.limit };
        documents
            .into_iter()
            .skip(self.skip)
            .take(take)
            .map(|doc| match &self.projection {
                Some(fields) => project_document(&doc, fields),
                None => doc,
            })
            .collect()
    }
}
