//! Translation of query filters into MongoDB query documents.
//!
//! String operators compile to anchored, escaped regular expressions and are case
//! sensitive, matching the in-memory evaluator.

use bson::{Bson, Document, doc};

use scaffold_core::{
    error::ScaffoldError,
    query::{Expr, FieldOp, QueryVisitor},
};

pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub(crate) fn translate(expr: Option<&Expr>) -> Result<Document, ScaffoldError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

/// Escapes regex metacharacters so `input` matches literally.
fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn as_list(value: &Bson) -> Bson {
    match value {
        Bson::Array(_) => value.clone(),
        single => Bson::Array(vec![single.clone()]),
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = ScaffoldError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Document, ScaffoldError> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Document, ScaffoldError> {
        if exprs.is_empty() {
            // an empty disjunction matches nothing
            return Ok(doc! { "_id": { "$exists": false } });
        }

        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Document, ScaffoldError> {
        let inner = self.visit_expr(expr)?;

        Ok(doc! { "$nor": [inner] })
    }

    fn visit_exists(&mut self, field: &str, present: bool) -> Result<Document, ScaffoldError> {
        Ok(if present {
            doc! { field: { "$exists": true, "$ne": Bson::Null } }
        } else {
            doc! { field: Bson::Null }
        })
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Document, ScaffoldError> {
        let condition = match (op, value) {
            (FieldOp::Eq, _) => doc! { "$eq": value },
            (FieldOp::Ne, _) => doc! { "$ne": value },
            (FieldOp::Gt, _) => doc! { "$gt": value },
            (FieldOp::Gte, _) => doc! { "$gte": value },
            (FieldOp::Lt, _) => doc! { "$lt": value },
            (FieldOp::Lte, _) => doc! { "$lte": value },
            (FieldOp::Contains, Bson::String(s)) => doc! { "$regex": escape(s) },
            (FieldOp::Contains, _) => doc! { "$elemMatch": { "$eq": value } },
            (FieldOp::NotContains, Bson::String(s)) => {
                doc! { "$not": { "$regex": escape(s) } }
            }
            (FieldOp::NotContains, _) => doc! { "$not": { "$elemMatch": { "$eq": value } } },
            (FieldOp::StartsWith, Bson::String(s)) => doc! { "$regex": format!("^{}", escape(s)) },
            (FieldOp::EndsWith, Bson::String(s)) => doc! { "$regex": format!("{}$", escape(s)) },
            (FieldOp::StartsWith | FieldOp::EndsWith, _) => {
                return Err(ScaffoldError::bad_request(format!(
                    "{field}: prefix and suffix filters require a string value"
                )));
            }
            (FieldOp::AnyOf, _) => doc! { "$in": as_list(value) },
            (FieldOp::NoneOf, _) => doc! { "$nin": as_list(value) },
        };

        Ok(doc! { field: condition })
    }
}
