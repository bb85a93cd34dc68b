//! Query construction for list fetches.
//!
//! This module provides filter expressions, sort order, pagination and
//! long-poll wait, and compiles them to the service's request parameters.
//!
//! # Query Building
//!
//! ```ignore
//! use baasday_core::query::{Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("status", "active").and(Filter::gte("score", 10)))
//!     .sort("score", SortDirection::Desc)
//!     .sort("name", SortDirection::Asc)
//!     .limit(20)
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static constructors for filter expressions:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - Membership: `is_in`
//! - Logical: `and`, `or`, `not`
//! - Escape hatch: `raw` passes a hand-written filter document through untouched
//!
//! Filters are not validated client side; the service rejects malformed ones.

use std::collections::BTreeMap;

use crate::{
    codec,
    value::{Value, ValueMap},
};

/// Maximum page size the service will return, whatever `limit` asks for.
pub const MAX_LIMIT: u32 = 100;
/// Maximum long-poll wait the service will honor, in seconds.
pub const MAX_WAIT_SECONDS: u32 = 30;

/// Flat mapping of wire parameter name to its text value.
pub type QueryParameters = BTreeMap<String, String>;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// One key of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Sort { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Sort { field: field.into(), direction: SortDirection::Desc }
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Desc
    }
}

/// Field comparison operators and their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Not equal to.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Field value is one of the listed values.
    In,
}

impl FieldOp {
    /// Returns the operator key used in wire filter documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOp::Ne => "$ne",
            FieldOp::Lt => "$lt",
            FieldOp::Lte => "$lte",
            FieldOp::Gt => "$gt",
            FieldOp::Gte => "$gte",
            FieldOp::In => "$in",
        }
    }

    /// Parses a wire operator key.
    pub fn from_wire(operator: &str) -> Option<Self> {
        match operator {
            "$ne" => Some(FieldOp::Ne),
            "$lt" => Some(FieldOp::Lt),
            "$lte" => Some(FieldOp::Lte),
            "$gt" => Some(FieldOp::Gt),
            "$gte" => Some(FieldOp::Gte),
            "$in" => Some(FieldOp::In),
            _ => None,
        }
    }
}

/// Wire key of the logical AND combinator.
pub const AND: &str = "$and";
/// Wire key of the logical OR combinator.
pub const OR: &str = "$or";
/// Wire key of the logical NOT combinator.
pub const NOT: &str = "$not";

/// A filter expression for selecting documents server side.
///
/// Expressions compose recursively with no depth limit.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression.
    Not(Box<Expr>),
    /// Direct equality, sent as `{field: value}`.
    Eq {
        field: String,
        value: Value,
    },
    /// Operator comparison, sent as `{field: {op: value}}`.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Value,
    },
    /// A filter document passed through verbatim.
    Raw(ValueMap),
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Value) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    ///
    /// If this expression is already an OR, the other expression is appended
    /// to the list. Otherwise, a new OR expression is created.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Compiles this expression to its wire filter document.
    pub fn to_value(&self) -> Value {
        FilterEncoder.visit_expr(self)
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        expr.to_value()
    }
}

/// Helper struct for constructing filter expressions.
///
/// All methods accept field names as `Into<String>` and values as `Into<Value>`.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::Eq { field: field.into(), value: value.into() }
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches documents where the field holds one of `values`.
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(field.into(), FieldOp::In, values.into_iter().collect())
    }

    /// Combines expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines expressions such that any may match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Inverts an expression.
    pub fn not(expr: Expr) -> Expr {
        expr.not()
    }

    /// Wraps a hand-written filter document.
    pub fn raw(filter: ValueMap) -> Expr {
        Expr::Raw(filter)
    }
}

/// Walks an [`Expr`] tree, one method per node kind.
pub trait FilterVisitor {
    type Output;

    fn visit_and(&mut self, exprs: &[Expr]) -> Self::Output;
    fn visit_or(&mut self, exprs: &[Expr]) -> Self::Output;
    fn visit_not(&mut self, expr: &Expr) -> Self::Output;
    fn visit_eq(&mut self, field: &str, value: &Value) -> Self::Output;
    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Value) -> Self::Output;
    fn visit_raw(&mut self, filter: &ValueMap) -> Self::Output;

    fn visit_expr(&mut self, expr: &Expr) -> Self::Output {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Eq { field, value } => self.visit_eq(field, value),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
            Expr::Raw(filter) => self.visit_raw(filter),
        }
    }
}

/// Compiles expressions into wire filter documents.
pub struct FilterEncoder;

impl FilterEncoder {
    fn single(key: &str, value: Value) -> Value {
        let mut map = ValueMap::new();
        map.insert(key.to_string(), value);
        Value::Map(map)
    }
}

impl FilterVisitor for FilterEncoder {
    type Output = Value;

    fn visit_and(&mut self, exprs: &[Expr]) -> Value {
        Self::single(AND, exprs.iter().map(|expr| self.visit_expr(expr)).collect())
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Value {
        Self::single(OR, exprs.iter().map(|expr| self.visit_expr(expr)).collect())
    }

    fn visit_not(&mut self, expr: &Expr) -> Value {
        Self::single(NOT, self.visit_expr(expr))
    }

    fn visit_eq(&mut self, field: &str, value: &Value) -> Value {
        Self::single(field, value.clone())
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Value) -> Value {
        Self::single(field, Self::single(op.as_str(), value.clone()))
    }

    fn visit_raw(&mut self, filter: &ValueMap) -> Value {
        Value::Map(filter.clone())
    }
}

/// A structured list query.
///
/// Every part is optional; unset parts are omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Sort keys in precedence order (primary first).
    pub order: Option<Vec<Sort>>,
    /// Number of documents to skip.
    pub skip: Option<u32>,
    /// Maximum number of documents to return (capped at [`MAX_LIMIT`] by the service).
    pub limit: Option<u32>,
    /// Long-poll wait in seconds (capped at [`MAX_WAIT_SECONDS`] by the service).
    pub wait: Option<u32>,
}

impl Query {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Compiles this query to wire request parameters.
    ///
    /// `filter` is the JSON text of the filter document, `order` the
    /// comma-joined field list with `-` marking descending keys, and `skip`,
    /// `limit` and `wait` the decimal integers.
    pub fn to_request_parameters(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();

        if let Some(filter) = &self.filter {
            parameters.insert(
                "filter".to_string(),
                codec::encode_value(&filter.to_value()).to_string(),
            );
        }
        if let Some(order) = &self.order {
            parameters.insert("order".to_string(), order_string(order));
        }
        if let Some(skip) = self.skip {
            parameters.insert("skip".to_string(), skip.to_string());
        }
        if let Some(limit) = self.limit {
            parameters.insert("limit".to_string(), limit.to_string());
        }
        if let Some(wait) = self.wait {
            parameters.insert("wait".to_string(), wait.to_string());
        }

        parameters
    }
}

fn order_string(order: &[Sort]) -> String {
    order
        .iter()
        .map(|sort| {
            if sort.is_descending() {
                format!("-{}", sort.field)
            } else {
                sort.field.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Replaces the whole sort specification.
    pub fn order(mut self, order: impl IntoIterator<Item = Sort>) -> Self {
        self.query.order = Some(order.into_iter().collect());
        self
    }

    /// Appends a sort key; keys added earlier take precedence.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query
            .order
            .get_or_insert_with(Vec::new)
            .push(Sort { field: field.into(), direction });
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u32) -> Self {
        self.query.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u32) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Asks the service to hold the response up to `seconds` until a match appears.
    pub fn wait(mut self, seconds: u32) -> Self {
        self.query.wait = Some(seconds);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}
