//! Backend-neutral filters for selecting documents.
//!
//! The collection engine treats a [`Query`] as opaque and hands it to the backend, which
//! interprets it through a [`QueryVisitor`] (the in-memory backend evaluates it in process,
//! the MongoDB backend translates it into a query document).
//!
//! ```ignore
//! use scaffold::query::{Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("status", "active").and(Filter::gte("age", 18)))
//!     .sort("created", SortDirection::Desc)
//!     .limit(20)
//!     .build();
//! ```
//!
//! Field names are the external (stored) names, so `Filter::eq("display_name", ..)` matches a
//! field declared as `#[serde(rename = "display_name")] name: String`.

use bson::Bson;

use crate::{document::DocumentId, error::ScaffoldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Comparison operators usable in a field expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring match on strings, membership on arrays.
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    /// The field equals (or, for arrays, shares an element with) one of the given values.
    AnyOf,
    NoneOf,
}

/// A filter predicate over stored documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// `Exists(field, true)` matches documents where the field is present and not null.
    Exists(String, bool),
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    pub fn field(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Expr::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Conjunction with `other`, flattening into an existing `And`.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut all) => {
                all.push(other);
                Expr::And(all)
            }
            expr => Expr::And(vec![expr, other]),
        }
    }

    /// Disjunction with `other`, flattening into an existing `Or`.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut any) => {
                any.push(other);
                Expr::Or(any)
            }
            expr => Expr::Or(vec![expr, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Constructors for [`Expr`].
pub struct Filter;

macro_rules! field_filters {
    ($($(#[$doc:meta])* $name:ident => $op:ident),+ $(,)?) => {
        impl Filter {
            $(
                $(#[$doc])*
                pub fn $name(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
                    Expr::field(field, FieldOp::$op, value)
                }
            )+
        }
    };
}

field_filters! {
    eq => Eq,
    ne => Ne,
    gt => Gt,
    gte => Gte,
    lt => Lt,
    lte => Lte,
    contains => Contains,
    not_contains => NotContains,
    starts_with => StartsWith,
    ends_with => EndsWith,
    /// `value` should be an array of candidates.
    any_of => AnyOf,
    /// `value` should be an array of excluded values.
    none_of => NoneOf,
}

impl Filter {
    /// Matches the document with the given identifier.
    pub fn id(id: DocumentId) -> Expr {
        Filter::eq("id", id.to_string())
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// A filter together with ordering and windowing.
///
/// An empty query (`Query::new()`) matches every document in store order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expr>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<Sort>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// A query matching `filter` with no ordering or window.
    pub fn filtered(filter: Expr) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Returns this query with its window replaced.
    pub fn window(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

impl From<Expr> for Query {
    fn from(filter: Expr) -> Self {
        Query::filtered(filter)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree. Backends implement the leaf and combinator cases and get
/// dispatch through [`QueryVisitor::visit_expr`].
pub trait QueryVisitor {
    type Output;
    type Error: Into<ScaffoldError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, field: &str, present: bool) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(inner) => self.visit_not(inner),
            Expr::Exists(field, present) => self.visit_exists(field, *present),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens() {
        let expr = Filter::eq("a", 1)
            .and(Filter::eq("b", 2))
            .and(Filter::eq("c", 3));

        match expr {
            Expr::And(all) => assert_eq!(all.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn id_filter_matches_on_the_string_form() {
        let id = DocumentId::new();

        assert_eq!(
            Filter::id(id),
            Expr::Field {
                field: "id".into(),
                op: FieldOp::Eq,
                value: Bson::String(id.to_string()),
            }
        );
    }

    #[test]
    fn window_overrides_builder_values() {
        let query = Query::builder()
            .filter(Filter::exists("name"))
            .limit(1)
            .build()
            .window(20, 10);

        assert_eq!(query.offset, Some(20));
        assert_eq!(query.limit, Some(10));
        assert!(query.filter.is_some());
    }
}
