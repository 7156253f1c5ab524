//! Query predicate evaluation

use super::values::{compare_values, eval_expr, get_path, same_bracket, values_equal};
use crate::error::{Error, Result};
use bson::{Bson, Document};
use std::cmp::Ordering;

/// Test a document against a `$match` predicate
pub(crate) fn matches(doc: &Document, filter: &Document) -> Result<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            "$expr" => expr_truthy(doc, condition)?,
            op if op.starts_with('$') => {
                return Err(Error::invalid_pipeline(format!("unsupported query operator {op}")))
            }
            field => field_matches(get_path(doc, field).as_ref(), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(op: &str, condition: &'a Bson) -> Result<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(Error::invalid_pipeline(format!("{op} expects an array")));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d),
            _ => Err(Error::invalid_pipeline(format!("{op} expects documents"))),
        })
        .collect()
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    let operators = match condition {
        Bson::Document(d) if !d.is_empty() && d.keys().all(|k| k.starts_with('$')) => d,
        _ => return Ok(equals(value, condition)),
    };

    for (op, operand) in operators {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$lt" => compares(value, operand, |o| o == Ordering::Less),
            "$lte" => compares(value, operand, |o| o != Ordering::Greater),
            "$gt" => compares(value, operand, |o| o == Ordering::Greater),
            "$gte" => compares(value, operand, |o| o != Ordering::Less),
            "$in" => in_list(value, op, operand)?,
            "$nin" => !in_list(value, op, operand)?,
            "$exists" => value.is_some() == truthy(operand),
            other => {
                return Err(Error::invalid_pipeline(format!(
                    "unsupported query operator {other}"
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality with array membership: `{tags: "a"}` matches `tags: ["a", "b"]`
fn equals(value: Option<&Bson>, operand: &Bson) -> bool {
    if values_equal(value, Some(operand)) {
        return true;
    }
    match value {
        Some(Bson::Array(items)) => items.iter().any(|item| values_equal(Some(item), Some(operand))),
        _ => false,
    }
}

fn compares(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |v: &Bson| same_bracket(v, operand) && accept(compare_values(v, operand));
    match value {
        None => false,
        Some(Bson::Array(items)) if !matches!(operand, Bson::Array(_)) => items.iter().any(check),
        Some(v) => check(v),
    }
}

fn in_list(value: Option<&Bson>, op: &str, operand: &Bson) -> Result<bool> {
    let Bson::Array(candidates) = operand else {
        return Err(Error::invalid_pipeline(format!("{op} expects an array")));
    };
    Ok(candidates.iter().any(|candidate| equals(value, candidate)))
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null | Bson::Undefined => false,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        _ => true,
    }
}

/// Evaluate a `$expr` comparison
fn expr_truthy(doc: &Document, expr: &Bson) -> Result<bool> {
    let Bson::Document(spec) = expr else {
        return Ok(eval_expr(doc, expr).is_some_and(|v| truthy(&v)));
    };
    let Some((op, args)) = spec.iter().next() else {
        return Ok(true);
    };

    match op.as_str() {
        "$and" | "$or" => {
            let Bson::Array(items) = args else {
                return Err(Error::invalid_pipeline(format!("{op} expects an array")));
            };
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                results.push(expr_truthy(doc, item)?);
            }
            Ok(if op == "$and" {
                results.into_iter().all(|r| r)
            } else {
                results.into_iter().any(|r| r)
            })
        }
        "$eq" | "$ne" | "$lt" | "$lte" | "$gt" | "$gte" => {
            let (left, right) = operands(doc, op, args)?;
            let ordering = compare_values(&left, &right);
            Ok(match op.as_str() {
                "$eq" => ordering == Ordering::Equal,
                "$ne" => ordering != Ordering::Equal,
                "$lt" => ordering == Ordering::Less,
                "$lte" => ordering != Ordering::Greater,
                "$gt" => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
        other => Err(Error::invalid_pipeline(format!(
            "unsupported expression operator {other}"
        ))),
    }
}

fn operands(doc: &Document, op: &str, args: &Bson) -> Result<(Bson, Bson)> {
    match args {
        Bson::Array(items) if items.len() == 2 => {
            let left = eval_expr(doc, &items[0]).unwrap_or(Bson::Null);
            let right = eval_expr(doc, &items[1]).unwrap_or(Bson::Null);
            Ok((left, right))
        }
        _ => Err(Error::invalid_pipeline(format!("{op} expects two arguments"))),
    }
}
