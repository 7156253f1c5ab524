//! `$lookup` and root replacement stage generation

use super::group::field_ref;
use crate::error::{Error, Result};
use crate::pager::{PopulateMode, PopulatorSpec};
use bson::{doc, Document};
use chrono::Utc;

/// Output of [`populate_stages`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulatePlan {
    /// Stages to append after `$limit`
    pub stages: Vec<Document>,

    /// Where the pager value lives after root replacement
    pub cursor_field: Option<String>,

    /// Fields the joins read from the current document
    pub read_fields: Vec<String>,
}

impl PopulatePlan {
    /// Whether a populator replaces the root document
    pub fn replaces_root(&self) -> bool {
        self.cursor_field.is_some()
    }
}

/// Suffix for stash field names, unique per planning call
pub fn stash_suffix() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Build the join stages for `populators`, in declaration order
///
/// A root-replacing populator stashes the local and pager values onto every
/// joined document, drops rows without a match, promotes the first match to
/// the root and then checks that it really belongs to the stashed local
/// value. At most one populator may replace the root.
pub fn populate_stages(
    populators: &[PopulatorSpec],
    pager_field: &str,
    suffix: &str,
) -> Result<PopulatePlan> {
    let mut plan = PopulatePlan::default();

    for populator in populators {
        let alias = populator.alias();
        let local_field = populator.local_field.as_str();
        let foreign_field = populator.foreign_field();

        push_unique(&mut plan.read_fields, local_field);

        plan.stages.push(doc! {
            "$lookup": {
                "from": populator.from.as_str(),
                "localField": local_field,
                "foreignField": foreign_field,
                "as": alias,
            }
        });

        let PopulateMode::ReplaceRoot { retained_fields } = &populator.mode else {
            continue;
        };

        if plan.cursor_field.is_some() {
            let count = populators.iter().filter(|p| p.replaces_root()).count();
            return Err(Error::MultipleRootReplacements { count });
        }

        let pager_stash = stash_field(pager_field, suffix);
        let local_stash = stash_field(local_field, suffix);

        let mut stash = Document::new();
        stash.insert(format!("{alias}.{local_stash}"), field_ref(local_field));
        stash.insert(format!("{alias}.{pager_stash}"), field_ref(pager_field));
        for (source, target) in retained_fields {
            if let Some(destination) = target.destination(source) {
                stash.insert(format!("{alias}.{destination}"), field_ref(source));
                push_unique(&mut plan.read_fields, source);
            }
        }

        let mut has_match = Document::new();
        has_match.insert(format!("{alias}.0"), doc! { "$exists": true });

        plan.stages.push(doc! { "$set": stash });
        plan.stages.push(doc! { "$match": has_match });
        plan.stages.push(doc! {
            "$replaceRoot": { "newRoot": { "$first": field_ref(alias) } }
        });
        plan.stages.push(doc! {
            "$match": {
                "$expr": { "$eq": [field_ref(foreign_field), field_ref(&local_stash)] }
            }
        });

        plan.cursor_field = Some(pager_stash);
    }

    Ok(plan)
}

/// Flat stash name for `field`; dots would nest it under `$set`
fn stash_field(field: &str, suffix: &str) -> String {
    format!("_{}_{suffix}", field.replace('.', "_"))
}

fn push_unique(fields: &mut Vec<String>, field: &str) {
    if !fields.iter().any(|f| f == field) {
        fields.push(field.to_string());
    }
}
