//! In-process evaluation of query filters against stored documents.

use bson::{Bson, DateTime, Document as BsonDocument};
use std::{cmp::Ordering, collections::HashMap};

use scaffold_core::{
    error::ScaffoldError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// A normalized view of a BSON value for comparison.
///
/// All numeric types compare as `f64`. Types without a natural ordering (binary, object
/// ids, regexes) collapse to `Null`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(items) => Comparable::Array(items.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
            _ => Comparable::Null,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares the `field` of two documents for sorting. Missing fields sort as null and
/// incomparable values as equal.
pub(crate) fn compare_field(left: &BsonDocument, right: &BsonDocument, field: &str) -> Ordering {
    let left = left.get(field).map_or(Comparable::Null, Comparable::from);
    let right = right.get(field).map_or(Comparable::Null, Comparable::from);

    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

/// Evaluates a filter against a single stored document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a BsonDocument,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a BsonDocument) -> Self {
        Self { document }
    }

    pub fn matches(document: &'a BsonDocument, expr: &Expr) -> Result<bool, ScaffoldError> {
        Self::new(document).visit_expr(expr)
    }
}

/// Whether `field` shares at least one element with `candidates`.
///
/// Either side may be a single value, which is treated as a one-element list.
fn intersects(field: &Comparable<'_>, candidates: &Comparable<'_>) -> bool {
    fn elements<'b, 'c>(value: &'b Comparable<'c>) -> &'b [Comparable<'c>] {
        match value {
            Comparable::Array(items) => items,
            single => std::slice::from_ref(single),
        }
    }

    let field = elements(field);
    elements(candidates)
        .iter()
        .any(|candidate| field.contains(candidate))
}

fn contains(field: &Comparable<'_>, needle: &Comparable<'_>) -> bool {
    match (field, needle) {
        (Comparable::Array(items), needle) => items.contains(needle),
        (Comparable::String(haystack), Comparable::String(needle)) => haystack.contains(needle),
        _ => false,
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = ScaffoldError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<bool, ScaffoldError> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<bool, ScaffoldError> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<bool, ScaffoldError> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, present: bool) -> Result<bool, ScaffoldError> {
        let found = matches!(self.document.get(field), Some(value) if *value != Bson::Null);

        Ok(found == present)
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<bool, ScaffoldError> {
        let Some(stored) = self.document.get(field) else {
            // Negated operators match documents lacking the field.
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        let left = Comparable::from(stored);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
            FieldOp::Gte => matches!(left.partial_cmp(&right), Some(Ordering::Greater | Ordering::Equal)),
            FieldOp::Lt => left.partial_cmp(&right) == Some(Ordering::Less),
            FieldOp::Lte => matches!(left.partial_cmp(&right), Some(Ordering::Less | Ordering::Equal)),
            FieldOp::Contains => contains(&left, &right),
            FieldOp::NotContains => !contains(&left, &right),
            FieldOp::StartsWith => match (&left, &right) {
                (Comparable::String(s), Comparable::String(prefix)) => s.starts_with(prefix),
                _ => false,
            },
            FieldOp::EndsWith => match (&left, &right) {
                (Comparable::String(s), Comparable::String(suffix)) => s.ends_with(suffix),
                _ => false,
            },
            FieldOp::AnyOf => intersects(&left, &right),
            FieldOp::NoneOf => !intersects(&left, &right),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use scaffold_core::query::Filter;

    fn user() -> BsonDocument {
        doc! {
            "name": "Alice",
            "age": 30_i64,
            "score": 4.5,
            "tags": ["admin", "ops"],
            "nickname": Bson::Null,
        }
    }

    fn eval(expr: Expr) -> bool {
        DocumentEvaluator::matches(&user(), &expr).unwrap()
    }

    #[test]
    fn numbers_compare_across_widths() {
        assert!(eval(Filter::eq("age", 30_i32)));
        assert!(eval(Filter::gt("age", 29.5)));
        assert!(eval(Filter::lte("score", 4.5)));
        assert!(!eval(Filter::lt("age", 30_i64)));
    }

    #[test]
    fn string_operators() {
        assert!(eval(Filter::starts_with("name", "Al")));
        assert!(eval(Filter::ends_with("name", "ice")));
        assert!(eval(Filter::contains("name", "lic")));
        assert!(!eval(Filter::contains("name", "bob")));
    }

    #[test]
    fn array_membership() {
        assert!(eval(Filter::contains("tags", "ops")));
        assert!(eval(Filter::any_of("tags", vec!["guest", "admin"])));
        assert!(eval(Filter::none_of("tags", vec!["guest"])));
        assert!(eval(Filter::any_of("name", vec!["Bob", "Alice"])));
    }

    #[test]
    fn null_fields_do_not_exist() {
        assert!(eval(Filter::exists("name")));
        assert!(eval(Filter::not_exists("nickname")));
        assert!(eval(Filter::not_exists("missing")));
    }

    #[test]
    fn missing_fields_only_match_negations() {
        assert!(!eval(Filter::eq("missing", 1)));
        assert!(eval(Filter::ne("missing", 1)));
    }

    #[test]
    fn combinators() {
        assert!(eval(Filter::eq("name", "Alice").and(Filter::gte("age", 18))));
        assert!(eval(Filter::eq("name", "Bob").or(Filter::eq("age", 30))));
        assert!(eval(Filter::eq("name", "Bob").not()));
        assert!(eval(Filter::and([])));
        assert!(!eval(Filter::or([])));
    }
}
