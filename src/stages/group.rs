//! `$group` stage generation

use crate::pager::GroupSpec;
use crate::types::{SortOrder, ID_FIELD};
use bson::{doc, Bson, Document};

/// Stages implementing `spec`: an optional `$sort` followed by `$group`
///
/// Fields carried from the representative row use `$first` under descending
/// order and `$last` under ascending order, so each group keeps its row with
/// the greatest pager value either way. `$group` does not preserve input
/// order, which is why `sort_before_group` exists.
pub fn group_stages(
    spec: &GroupSpec,
    pager_field: &str,
    order: SortOrder,
    sort: &Document,
) -> Vec<Document> {
    let mut stages = Vec::with_capacity(2);

    if spec.sort_before_group {
        stages.push(doc! { "$sort": sort.clone() });
    }

    let key_fields: Vec<&str> = spec.key_fields().collect();
    let mut group = Document::new();
    group.insert(ID_FIELD, group_key(&key_fields));

    let accumulator = if order.is_ascending() { "$last" } else { "$first" };
    let mut retained: Vec<&str> = Vec::new();
    let candidates = std::iter::once(pager_field)
        .chain(key_fields.iter().copied())
        .chain(spec.project_fields.iter().map(String::as_str));
    for field in candidates {
        if field != ID_FIELD && !retained.contains(&field) {
            retained.push(field);
        }
    }
    for field in retained {
        let mut acc = Document::new();
        acc.insert(accumulator, field_ref(field));
        group.insert(field, acc);
    }

    // $sum over non-numeric sources yields 0; that is left to the caller
    for (source, output) in &spec.field_sum_map {
        group.insert(output.as_str(), doc! { "$sum": field_ref(source) });
    }

    if let Some(alias) = &spec.count_as {
        group.insert(alias.as_str(), doc! { "$sum": 1 });
    }

    stages.push(doc! { "$group": group });
    stages
}

fn group_key(fields: &[&str]) -> Bson {
    match fields {
        [] => Bson::Null,
        [single] => Bson::String(field_ref(single)),
        many => {
            let mut key = Document::new();
            for field in many {
                key.insert(*field, field_ref(field));
            }
            Bson::Document(key)
        }
    }
}

pub(crate) fn field_ref(field: &str) -> String {
    format!("${field}")
}
