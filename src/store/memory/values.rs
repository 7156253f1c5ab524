//! Value helpers for the memory store
//!
//! Field paths, expression evaluation and BSON ordering.

use bson::{Bson, Document};
use std::cmp::Ordering;

// ============================================================================
// Paths
// ============================================================================

/// Resolve a dotted path
///
/// Numeric segments index into arrays; other segments applied to an array
/// collect the field from every element document.
pub(crate) fn get_path(doc: &Document, path: &str) -> Option<Bson> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = doc.get(first)?.clone();
    for part in parts {
        current = step(&current, part)?;
    }
    Some(current)
}

fn step(value: &Bson, part: &str) -> Option<Bson> {
    match value {
        Bson::Document(inner) => inner.get(part).cloned(),
        Bson::Array(items) => {
            if let Ok(index) = part.parse::<usize>() {
                return items.get(index).cloned();
            }
            let collected: Vec<Bson> = items.iter().filter_map(|item| step(item, part)).collect();
            Some(Bson::Array(collected))
        }
        _ => None,
    }
}

/// Set a dotted path, creating intermediate documents
///
/// When an intermediate value is an array, the remainder of the path is set
/// on every document element.
pub(crate) fn set_path(doc: &mut Document, path: &str, value: Bson) {
    let parts: Vec<&str> = path.split('.').collect();
    set_parts(doc, &parts, &value);
}

fn set_parts(doc: &mut Document, parts: &[&str], value: &Bson) {
    match parts {
        [] => {}
        [last] => {
            doc.insert(*last, value.clone());
        }
        [head, rest @ ..] => {
            let needs_document = !matches!(
                doc.get(*head),
                Some(Bson::Document(_) | Bson::Array(_))
            );
            if needs_document {
                doc.insert(*head, Document::new());
            }
            match doc.get_mut(*head) {
                Some(Bson::Document(inner)) => set_parts(inner, rest, value),
                Some(Bson::Array(items)) => {
                    for item in items.iter_mut() {
                        if let Bson::Document(inner) = item {
                            set_parts(inner, rest, value);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Evaluate an aggregation expression against a document
///
/// Supports `"$path"` references, `{"$first": expr}`, `{"$last": expr}`,
/// `{"$literal": value}`, documents of expressions and literals. Missing
/// references evaluate to `None`.
pub(crate) fn eval_expr(doc: &Document, expr: &Bson) -> Option<Bson> {
    match expr {
        Bson::String(s) if s.starts_with('$') => get_path(doc, &s[1..]),
        Bson::Document(spec) if is_operator_doc(spec) => {
            let (op, arg) = spec.iter().next()?;
            match op.as_str() {
                "$first" => match eval_expr(doc, arg)? {
                    Bson::Array(items) => items.into_iter().next(),
                    other => Some(other),
                },
                "$last" => match eval_expr(doc, arg)? {
                    Bson::Array(items) => items.into_iter().last(),
                    other => Some(other),
                },
                "$literal" => Some(arg.clone()),
                _ => Some(expr.clone()),
            }
        }
        Bson::Document(spec) => {
            let mut out = Document::new();
            for (key, value) in spec {
                if let Some(v) = eval_expr(doc, value) {
                    out.insert(key.clone(), v);
                }
            }
            Some(Bson::Document(out))
        }
        Bson::Array(items) => Some(Bson::Array(
            items
                .iter()
                .map(|item| eval_expr(doc, item).unwrap_or(Bson::Null))
                .collect(),
        )),
        other => Some(other.clone()),
    }
}

/// A single-key document whose key is an operator
pub(crate) fn is_operator_doc(doc: &Document) -> bool {
    doc.len() == 1 && doc.keys().all(|k| k.starts_with('$'))
}

/// Read an integer stage argument
pub(crate) fn as_count(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) if n.fract() == 0.0 => Some(*n as i64),
        _ => None,
    }
}

pub(crate) fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

// ============================================================================
// Ordering
// ============================================================================

fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

/// Whether two values belong to the same comparison bracket
pub(crate) fn same_bracket(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b)
}

/// Total order over BSON values, following MongoDB's cross-type ordering
pub fn compare_values(a: &Bson, b: &Bson) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Symbol(x), Bson::Symbol(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        (Bson::Array(x), Bson::Array(y)) => compare_sequences(x, y),
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn compare_documents(a: &Document, b: &Document) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        let ord = ka.cmp(kb).then_with(|| compare_values(va, vb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_sequences(a: &[Bson], b: &[Bson]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare_values(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Equality as used by queries and joins (`1 == 1.0`, missing == null)
pub(crate) fn values_equal(a: Option<&Bson>, b: Option<&Bson>) -> bool {
    let a = a.unwrap_or(&Bson::Null);
    let b = b.unwrap_or(&Bson::Null);
    same_bracket(a, b) && compare_values(a, b) == Ordering::Equal
}
