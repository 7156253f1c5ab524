//! Pipeline assembly

use super::plan::PipelinePlan;
use crate::config::PagerConfig;
use crate::cursor::next_page_predicate;
use crate::error::Result;
use crate::filter::{cast_ids, merge_predicate};
use crate::pager::PageRequest;
use crate::sort::sort_document;
use crate::stages::{group_stages, populate_stages, stash_suffix, PopulatePlan};
use crate::types::ID_FIELD;
use bson::{doc, Document};

/// Turns a [`PageRequest`] into a [`PipelinePlan`]
#[derive(Debug)]
pub struct PipelineBuilder<'a> {
    request: &'a PageRequest,
    config: &'a PagerConfig,
    suffix: Option<String>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(request: &'a PageRequest, config: &'a PagerConfig) -> Self {
        Self {
            request,
            config,
            suffix: None,
        }
    }

    /// Fix the stash field suffix instead of deriving it from the clock
    #[must_use]
    pub fn with_stash_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Validate the request and assemble the stages
    ///
    /// Stage order: `$match`, narrowing `$project` (root replacement only),
    /// grouping, `$sort`, `$limit` of one extra row, joins, post filter.
    pub fn build(&self) -> Result<PipelinePlan> {
        self.request.validate()?;

        let request = self.request;
        let pager = &request.pager;
        let field = pager.field.as_str();

        let sort_order = pager.resolved_order();
        let sort = sort_document(field, sort_order, request.secondary_sort_on_id);
        let limit = self.config.effective_limit(pager.limit.as_ref());

        let mut filter = cast_ids(&request.filter);
        let count_filter = match &pager.from {
            Some(token) => {
                match next_page_predicate(token, field) {
                    Some(predicate) => merge_predicate(&mut filter, predicate),
                    None => tracing::debug!("Cursor has no value for {field}, ignoring it"),
                }
                None
            }
            None => Some(filter.clone()),
        };

        let suffix = self.suffix.clone().unwrap_or_else(stash_suffix);
        let populate = populate_stages(&request.populators, field, &suffix)?;

        let mut stages = vec![doc! { "$match": filter.clone() }];

        if populate.replaces_root() {
            stages.push(doc! { "$project": self.narrow_projection(&populate) });
        }

        if let Some(group) = &pager.group_by {
            stages.extend(group_stages(group, field, sort_order, &sort));
        }

        stages.push(doc! { "$sort": sort.clone() });
        stages.push(doc! { "$limit": i64::from(limit) + 1 });

        let cursor_field = populate
            .cursor_field
            .clone()
            .unwrap_or_else(|| field.to_string());
        stages.extend(populate.stages);

        if let Some(post_filter) = &request.post_filter {
            stages.push(doc! { "$match": post_filter.clone() });
        }

        Ok(PipelinePlan {
            filter,
            count_filter,
            stages,
            sort,
            sort_order,
            limit,
            pager_field: field.to_string(),
            cursor_field,
            secondary_sort_on_id: request.secondary_sort_on_id,
        })
    }

    /// Inclusion projection of every field later stages read
    fn narrow_projection(&self, populate: &PopulatePlan) -> Document {
        let pager = &self.request.pager;
        let mut fields: Vec<&str> = vec![ID_FIELD, pager.field.as_str()];
        fields.extend(populate.read_fields.iter().map(String::as_str));

        if let Some(group) = &pager.group_by {
            fields.extend(group.key_fields());
            fields.extend(group.project_fields.iter().map(String::as_str));
            fields.extend(group.field_sum_map.keys().map(String::as_str));
        }

        let mut projection = Document::new();
        for field in fields {
            if !projection.contains_key(field) {
                projection.insert(field, 1);
            }
        }
        projection
    }
}
