//! Filter evaluation for in-memory documents.
//!
//! Wire filters arrive as decoded field maps. [`parse_filter`] turns one back
//! into an [`Expr`] tree, and [`DocumentEvaluator`] walks that tree against a
//! stored document the way the service would.
//!
//! Field names may be dotted paths (`profile.city`) reaching into nested maps.
//! A missing field compares as null, so `{"x": null}` matches documents
//! without `x` and `$ne` matches them too.

use std::{cmp::Ordering, collections::HashMap};

use baasday_core::{
    query::{AND, Expr, FieldOp, FilterVisitor, NOT, OR},
    value::{Value, ValueMap},
};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Borrowed, comparable view of a [`Value`].
///
/// Integers and floats are normalized to `f64` so `1` equals `1.0`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
    String(&'a str),
    List(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(number) => Comparable::Number(number.as_f64()),
            Value::Timestamp(value) => Comparable::Timestamp(*value),
            Value::String(value) => Comparable::String(value),
            Value::List(values) => Comparable::List(values.iter().map(Comparable::from).collect()),
            Value::Map(map) => Comparable::Map(
                map.iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
        }
    }
}

impl<'a> From<Option<&'a Value>> for Comparable<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map(Comparable::from).unwrap_or(Comparable::Null)
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Timestamp(a), Comparable::Timestamp(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::List(a), Comparable::List(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    /// Only values of the same scalar type are ordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::Timestamp(a), Comparable::Timestamp(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl<'a> Comparable<'a> {
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::List(_) => 4,
            Comparable::Bool(_) => 5,
            Comparable::Timestamp(_) => 6,
        }
    }

    /// Total order used for sorting: by type first, then by value.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

/// Resolves a possibly dotted field path inside `document`.
pub(crate) fn lookup<'a>(document: &'a ValueMap, path: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }

    let mut segments = path.split('.');
    let first = document.get(segments.next()?)?;
    segments.try_fold(first, |current, segment| current.as_map()?.get(segment))
}

/// Parses a wire filter document into an expression tree.
///
/// A document with several keys is the conjunction of its clauses; an empty
/// document matches everything. Operator documents with several operators
/// (`{"n": {"$gt": 1, "$lt": 5}}`) are conjunctions too.
///
/// # Errors
///
/// Returns a description of the problem for unknown `$` operators and for
/// combinators with the wrong shape.
pub fn parse_filter(filter: &ValueMap) -> Result<Expr, String> {
    let mut clauses = filter
        .iter()
        .map(|(key, value)| parse_clause(key, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match clauses.len() {
        1 => clauses.remove(0),
        _ => Expr::And(clauses),
    })
}

fn parse_nested(value: &Value, operator: &str) -> Result<Expr, String> {
    match value {
        Value::Map(map) => parse_filter(map),
        other => Err(format!("{operator} expects a filter document, found {}", other.type_name())),
    }
}

fn parse_clause(key: &str, value: &Value) -> Result<Expr, String> {
    match key {
        AND | OR => {
            let Value::List(items) = value else {
                return Err(format!("{key} expects a list, found {}", value.type_name()));
            };
            let exprs = items
                .iter()
                .map(|item| parse_nested(item, key))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(if key == AND { Expr::And(exprs) } else { Expr::Or(exprs) })
        }
        NOT => Ok(parse_nested(value, key)?.not()),
        operator if operator.starts_with('$') => Err(format!("unknown filter operator {operator}")),
        field => parse_field(field, value),
    }
}

fn parse_field(field: &str, value: &Value) -> Result<Expr, String> {
    let operators = match value {
        Value::Map(map) if !map.is_empty() && map.keys().all(|key| key.starts_with('$')) => map,
        _ => {
            return Ok(Expr::Eq {
                field: field.to_string(),
                value: value.clone(),
            });
        }
    };

    let mut exprs = operators
        .iter()
        .map(|(operator, operand)| {
            FieldOp::from_wire(operator)
                .map(|op| Expr::field(field.to_string(), op, operand.clone()))
                .ok_or_else(|| format!("unknown field operator {operator}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match exprs.len() {
        1 => exprs.remove(0),
        _ => Expr::And(exprs),
    })
}

/// Evaluates expressions against one stored document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a ValueMap,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a ValueMap) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> bool {
        self.visit_expr(expr)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a ValueMap>,
        expr: &Expr,
    ) -> Vec<&'a ValueMap> {
        documents
            .into_iter()
            .filter(|document| DocumentEvaluator::new(document).evaluate(expr))
            .collect()
    }

    fn field(&self, field: &str) -> Comparable<'a> {
        Comparable::from(lookup(self.document, field))
    }
}

impl<'a> FilterVisitor for DocumentEvaluator<'a> {
    type Output = bool;

    fn visit_and(&mut self, exprs: &[Expr]) -> bool {
        exprs.iter().all(|expr| self.visit_expr(expr))
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> bool {
        exprs.iter().any(|expr| self.visit_expr(expr))
    }

    fn visit_not(&mut self, expr: &Expr) -> bool {
        !self.visit_expr(expr)
    }

    fn visit_eq(&mut self, field: &str, value: &Value) -> bool {
        self.field(field) == Comparable::from(value)
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Value) -> bool {
        let left = self.field(field);
        let right = Comparable::from(value);

        match op {
            FieldOp::Ne => left != right,
            FieldOp::In => match right {
                Comparable::List(candidates) => candidates.iter().any(|candidate| candidate == &left),
                _ => false,
            },
            FieldOp::Lt | FieldOp::Lte | FieldOp::Gt | FieldOp::Gte => match left.partial_cmp(&right) {
                Some(ordering) => match op {
                    FieldOp::Lt => ordering == Ordering::Less,
                    FieldOp::Lte => ordering != Ordering::Greater,
                    FieldOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
                None => false,
            },
        }
    }

    fn visit_raw(&mut self, filter: &ValueMap) -> bool {
        match parse_filter(filter) {
            Ok(expr) => self.visit_expr(&expr),
            Err(reason) => {
                warn!(%reason, "dropping unparseable raw filter; it matches nothing");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baasday_core::{query::Filter, value_map};
    use chrono::TimeZone;

    fn alice() -> ValueMap {
        value_map! {
            "name" => "alice",
            "score" => 42,
            "ratio" => 0.5,
            "tags" => vec!["a", "b"],
            "profile" => value_map! { "city" => "kyoto" },
            "joined" => Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn matches(expr: Expr) -> bool {
        let document = alice();
        let wire = match expr.to_value() {
            Value::Map(map) => map,
            other => panic!("filters encode to maps, got {other:?}"),
        };
        let parsed = parse_filter(&wire).unwrap();
        DocumentEvaluator::new(&document).evaluate(&parsed)
    }

    #[test]
    fn equality_and_comparisons() {
        assert!(matches(Filter::eq("name", "alice")));
        assert!(matches(Filter::eq("score", 42.0)));
        assert!(!matches(Filter::eq("name", "bob")));
        assert!(matches(Filter::gt("score", 41)));
        assert!(matches(Filter::gte("score", 42)));
        assert!(!matches(Filter::lt("score", 42)));
        assert!(matches(Filter::lte("ratio", 0.5)));
        assert!(matches(Filter::lt(
            "joined",
            Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
        )));
    }

    #[test]
    fn comparisons_across_types_never_match() {
        assert!(!matches(Filter::gt("name", 1)));
        assert!(!matches(Filter::lt("score", "z")));
    }

    #[test]
    fn missing_fields_compare_as_null() {
        assert!(matches(Filter::eq("missing", Value::Null)));
        assert!(matches(Filter::ne("missing", "x")));
        assert!(!matches(Filter::gt("missing", 0)));
    }

    #[test]
    fn membership_and_nested_paths() {
        assert!(matches(Filter::is_in("name", ["bob", "alice"])));
        assert!(!matches(Filter::is_in("name", ["bob"])));
        assert!(matches(Filter::eq("profile.city", "kyoto")));
        assert!(matches(Filter::eq("tags", vec!["a", "b"])));
    }

    #[test]
    fn combinators() {
        assert!(matches(Filter::and([
            Filter::eq("name", "alice"),
            Filter::gt("score", 10),
        ])));
        assert!(matches(Filter::or([
            Filter::eq("name", "bob"),
            Filter::gt("score", 10),
        ])));
        assert!(matches(Filter::not(Filter::eq("name", "bob"))));
        assert!(!matches(Filter::and([
            Filter::eq("name", "alice"),
            Filter::not(Filter::gt("score", 10)),
        ])));
    }

    #[test]
    fn multi_key_documents_are_conjunctions() {
        let document = alice();
        let both = parse_filter(&value_map! {
            "name" => "alice",
            "score" => value_map! { "$gt" => 40, "$lt" => 50 },
        })
        .unwrap();
        let empty = parse_filter(&ValueMap::new()).unwrap();

        assert!(DocumentEvaluator::new(&document).evaluate(&both));
        assert!(DocumentEvaluator::new(&document).evaluate(&empty));
    }

    #[test]
    fn raw_filters_are_evaluated() {
        assert!(matches(Filter::raw(value_map! { "score" => value_map! { "$gte" => 42 } })));
    }

    #[test]
    fn unparseable_raw_filters_match_nothing() {
        let document = alice();
        let bogus = Filter::raw(value_map! { "score" => value_map! { "$where" => 1 } });

        assert!(!DocumentEvaluator::new(&document).evaluate(&bogus));
        assert!(DocumentEvaluator::filter_documents([&document], &bogus).is_empty());
    }

    #[test]
    fn malformed_filters_are_rejected() {
        assert!(parse_filter(&value_map! { "$where" => "1" }).is_err());
        assert!(parse_filter(&value_map! { "n" => value_map! { "$regex" => "a" } }).is_err());
        assert!(parse_filter(&value_map! { "$and" => value_map! {} }).is_err());
        assert!(parse_filter(&value_map! { "$or" => vec![1] }).is_err());
    }

    #[test]
    fn sort_order_is_total_across_types() {
        let null = Value::Null;
        let number = Value::from(3);
        let text = Value::from("a");

        assert_eq!(Comparable::from(&null).sort_cmp(&Comparable::from(&number)), Ordering::Less);
        assert_eq!(Comparable::from(&text).sort_cmp(&Comparable::from(&number)), Ordering::Greater);
        assert_eq!(
            Comparable::from(&Value::from(1)).sort_cmp(&Comparable::from(&Value::from(2.5))),
            Ordering::Less
        );
    }
}
