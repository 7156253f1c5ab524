//! Aggregation stage interpreter

use super::matcher::matches;
use super::values::{as_count, as_f64, compare_values, eval_expr, get_path, set_path, values_equal};
use crate::error::{Error, Result};
use crate::types::ID_FIELD;
use bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Run `pipeline` over `docs`
///
/// `collections` resolves `$lookup` sources; a missing collection joins
/// nothing.
pub(crate) fn run_pipeline(
    mut docs: Vec<Document>,
    pipeline: &[Document],
    collections: &HashMap<String, Vec<Document>>,
) -> Result<Vec<Document>> {
    for stage in pipeline {
        let (name, spec) = single_entry(stage)?;
        docs = match name {
            "$match" => {
                let filter = expect_document(name, spec)?;
                let mut kept = Vec::with_capacity(docs.len());
                for doc in docs {
                    if matches(&doc, filter)? {
                        kept.push(doc);
                    }
                }
                kept
            }
            "$project" => project(docs, expect_document(name, spec)?)?,
            "$group" => group(docs, expect_document(name, spec)?)?,
            "$sort" => sort(docs, expect_document(name, spec)?)?,
            "$skip" => {
                let n = expect_count(name, spec)?;
                docs.into_iter().skip(n).collect()
            }
            "$limit" => {
                let n = expect_count(name, spec)?;
                docs.truncate(n);
                docs
            }
            "$lookup" => lookup(docs, expect_document(name, spec)?, collections)?,
            "$set" | "$addFields" => add_fields(docs, expect_document(name, spec)?),
            "$replaceRoot" => replace_root(docs, expect_document(name, spec)?)?,
            "$count" => {
                let Bson::String(field) = spec else {
                    return Err(Error::invalid_pipeline("$count expects a field name"));
                };
                let mut out = Document::new();
                out.insert(field.clone(), docs.len() as i64);
                vec![out]
            }
            other => {
                return Err(Error::invalid_pipeline(format!("unsupported stage {other}")));
            }
        };
    }
    Ok(docs)
}

fn single_entry(stage: &Document) -> Result<(&str, &Bson)> {
    let mut iter = stage.iter();
    match (iter.next(), iter.next()) {
        (Some((name, spec)), None) => Ok((name.as_str(), spec)),
        _ => Err(Error::invalid_pipeline(
            "a pipeline stage must have exactly one field",
        )),
    }
}

fn expect_document<'a>(name: &str, spec: &'a Bson) -> Result<&'a Document> {
    match spec {
        Bson::Document(d) => Ok(d),
        _ => Err(Error::invalid_pipeline(format!("{name} expects a document"))),
    }
}

fn expect_count(name: &str, spec: &Bson) -> Result<usize> {
    as_count(spec)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| Error::invalid_pipeline(format!("{name} expects a non-negative integer")))
}

// ============================================================================
// $project
// ============================================================================

fn project(docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>> {
    let includes = |v: &Bson| match v {
        Bson::Boolean(b) => Some(*b),
        other => as_f64(other).map(|n| n != 0.0),
    };

    let exclusion = spec
        .iter()
        .filter(|(k, _)| k.as_str() != ID_FIELD)
        .all(|(_, v)| includes(v) == Some(false));
    let keep_id = spec.get(ID_FIELD).and_then(includes).unwrap_or(true);

    if exclusion && !spec.is_empty() {
        return Ok(docs
            .into_iter()
            .map(|mut doc| {
                for (field, _) in spec {
                    if field != ID_FIELD || !keep_id {
                        doc.remove(field);
                    }
                }
                doc
            })
            .collect());
    }

    Ok(docs
        .into_iter()
        .map(|doc| {
            let mut out = Document::new();
            if keep_id {
                if let Some(id) = doc.get(ID_FIELD) {
                    out.insert(ID_FIELD, id.clone());
                }
            }
            for (field, value) in spec {
                if field == ID_FIELD {
                    continue;
                }
                let projected = match includes(value) {
                    Some(true) => get_path(&doc, field),
                    Some(false) => None,
                    None => eval_expr(&doc, value),
                };
                if let Some(v) = projected {
                    set_path(&mut out, field, v);
                }
            }
            out
        })
        .collect())
}

// ============================================================================
// $group
// ============================================================================

enum Accumulator {
    First(Option<Bson>),
    Last(Option<Bson>),
    Sum { int: i64, float: f64, is_long: bool, is_float: bool },
    Min(Option<Bson>),
    Max(Option<Bson>),
    Push(Vec<Bson>),
}

impl Accumulator {
    fn new(op: &str) -> Result<Self> {
        Ok(match op {
            "$first" => Self::First(None),
            "$last" => Self::Last(None),
            "$sum" | "$count" => Self::Sum {
                int: 0,
                float: 0.0,
                is_long: false,
                is_float: false,
            },
            "$min" => Self::Min(None),
            "$max" => Self::Max(None),
            "$push" => Self::Push(Vec::new()),
            other => {
                return Err(Error::invalid_pipeline(format!(
                    "unsupported accumulator {other}"
                )))
            }
        })
    }

    fn update(&mut self, value: Option<Bson>, seen_first: bool) {
        match self {
            Self::First(slot) => {
                if !seen_first {
                    *slot = Some(value.unwrap_or(Bson::Null));
                }
            }
            Self::Last(slot) => *slot = Some(value.unwrap_or(Bson::Null)),
            Self::Sum {
                int,
                float,
                is_long,
                is_float,
            } => match value {
                Some(Bson::Int32(n)) => *int += i64::from(n),
                Some(Bson::Int64(n)) => {
                    *int += n;
                    *is_long = true;
                }
                Some(Bson::Double(n)) => {
                    *float += n;
                    *is_float = true;
                }
                _ => {}
            },
            Self::Min(slot) => keep_extreme(slot, value, Ordering::Less),
            Self::Max(slot) => keep_extreme(slot, value, Ordering::Greater),
            Self::Push(items) => items.push(value.unwrap_or(Bson::Null)),
        }
    }

    fn finish(self) -> Bson {
        match self {
            Self::First(v) | Self::Last(v) | Self::Min(v) | Self::Max(v) => v.unwrap_or(Bson::Null),
            Self::Sum {
                int,
                float,
                is_long,
                is_float,
            } => {
                if is_float {
                    Bson::Double(int as f64 + float)
                } else if let (false, Ok(small)) = (is_long, i32::try_from(int)) {
                    Bson::Int32(small)
                } else {
                    Bson::Int64(int)
                }
            }
            Self::Push(items) => Bson::Array(items),
        }
    }
}

fn keep_extreme(slot: &mut Option<Bson>, value: Option<Bson>, wanted: Ordering) {
    let Some(value) = value.filter(|v| !matches!(v, Bson::Null)) else {
        return;
    };
    let replace = match slot {
        Some(current) => compare_values(&value, current) == wanted,
        None => true,
    };
    if replace {
        *slot = Some(value);
    }
}

struct GroupState {
    key: Bson,
    accumulators: Vec<(String, Accumulator)>,
}

fn group(docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>> {
    let key_expr = spec
        .get(ID_FIELD)
        .ok_or_else(|| Error::invalid_pipeline("$group requires an _id"))?;

    let mut fields: Vec<(&str, &str, Bson)> = Vec::new();
    for (field, accumulator) in spec {
        if field == ID_FIELD {
            continue;
        }
        let Bson::Document(acc) = accumulator else {
            return Err(Error::invalid_pipeline(format!(
                "$group field {field} must be an accumulator"
            )));
        };
        let Some((op, arg)) = acc.iter().next() else {
            return Err(Error::invalid_pipeline(format!(
                "$group field {field} must be an accumulator"
            )));
        };
        // `{$count: {}}` is shorthand for `{$sum: 1}`
        let arg = if op == "$count" { Bson::Int32(1) } else { arg.clone() };
        fields.push((field.as_str(), op.as_str(), arg));
    }

    let mut groups: Vec<GroupState> = Vec::new();
    for doc in &docs {
        let key = eval_expr(doc, key_expr).unwrap_or(Bson::Null);
        let position = groups
            .iter()
            .position(|g| values_equal(Some(&g.key), Some(&key)));

        let (state, seen_first) = match position {
            Some(index) => (&mut groups[index], true),
            None => {
                let mut accumulators = Vec::with_capacity(fields.len());
                for (field, op, _) in &fields {
                    accumulators.push(((*field).to_string(), Accumulator::new(op)?));
                }
                groups.push(GroupState { key, accumulators });
                let last = groups.len() - 1;
                (&mut groups[last], false)
            }
        };

        for ((_, _, arg), (_, accumulator)) in fields.iter().zip(state.accumulators.iter_mut()) {
            accumulator.update(eval_expr(doc, arg), seen_first);
        }
    }

    Ok(groups
        .into_iter()
        .map(|state| {
            let mut out = Document::new();
            out.insert(ID_FIELD, state.key);
            for (field, accumulator) in state.accumulators {
                out.insert(field, accumulator.finish());
            }
            out
        })
        .collect())
}

// ============================================================================
// $sort
// ============================================================================

fn sort(mut docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>> {
    let mut keys = Vec::with_capacity(spec.len());
    for (field, direction) in spec {
        let ascending = match as_count(direction) {
            Some(1) => true,
            Some(-1) => false,
            _ => {
                return Err(Error::invalid_pipeline(format!(
                    "$sort direction for {field} must be 1 or -1"
                )))
            }
        };
        keys.push((field.as_str(), ascending));
    }

    docs.sort_by(|a, b| {
        for (field, ascending) in &keys {
            let left = get_path(a, field).unwrap_or(Bson::Null);
            let right = get_path(b, field).unwrap_or(Bson::Null);
            let ord = compare_values(&left, &right);
            let ord = if *ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(docs)
}

// ============================================================================
// $lookup
// ============================================================================

fn lookup(
    docs: Vec<Document>,
    spec: &Document,
    collections: &HashMap<String, Vec<Document>>,
) -> Result<Vec<Document>> {
    let field = |key: &str| {
        spec.get_str(key)
            .map_err(|_| Error::invalid_pipeline(format!("$lookup requires a string {key}")))
    };
    let from = field("from")?;
    let local_field = field("localField")?;
    let foreign_field = field("foreignField")?;
    let alias = field("as")?;

    let foreign = collections.get(from).map(Vec::as_slice).unwrap_or_default();

    Ok(docs
        .into_iter()
        .map(|mut doc| {
            let local = get_path(&doc, local_field);
            let joined: Vec<Bson> = foreign
                .iter()
                .filter(|candidate| join_matches(local.as_ref(), get_path(candidate, foreign_field).as_ref()))
                .map(|candidate| Bson::Document(candidate.clone()))
                .collect();
            set_path(&mut doc, alias, Bson::Array(joined));
            doc
        })
        .collect())
}

fn join_matches(local: Option<&Bson>, foreign: Option<&Bson>) -> bool {
    let locals: Vec<Option<&Bson>> = match local {
        Some(Bson::Array(items)) => items.iter().map(Some).collect(),
        other => vec![other],
    };
    let foreigns: Vec<Option<&Bson>> = match foreign {
        Some(Bson::Array(items)) => items.iter().map(Some).collect(),
        other => vec![other],
    };
    locals
        .iter()
        .any(|l| foreigns.iter().any(|f| values_equal(*l, *f)))
}

// ============================================================================
// $set / $replaceRoot
// ============================================================================

fn add_fields(docs: Vec<Document>, spec: &Document) -> Vec<Document> {
    docs.into_iter()
        .map(|mut doc| {
            // Every expression reads the input document, not partial output
            let values: Vec<(&str, Option<Bson>)> = spec
                .iter()
                .map(|(path, expr)| (path.as_str(), eval_expr(&doc, expr)))
                .collect();
            for (path, value) in values {
                if let Some(value) = value {
                    set_path(&mut doc, path, value);
                }
            }
            doc
        })
        .collect()
}

fn replace_root(docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>> {
    let new_root = spec
        .get("newRoot")
        .ok_or_else(|| Error::invalid_pipeline("$replaceRoot requires newRoot"))?;

    docs.into_iter()
        .map(|doc| match eval_expr(&doc, new_root) {
            Some(Bson::Document(root)) => Ok(root),
            _ => Err(Error::invalid_pipeline(
                "$replaceRoot newRoot must evaluate to a document",
            )),
        })
        .collect()
}
