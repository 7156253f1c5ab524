//! Page request types
//!
//! A [`PageRequest`] is the declarative input of the pager: which rows
//! (`filter`), in what order and how many (`pager`), and which related
//! documents to attach (`populators`).

use crate::cursor::CursorToken;
use crate::error::{Error, Result};
use crate::sort::resolve_sort_order;
use crate::store::Collection;
use crate::types::{deserialize_limit, LimitValue, SortOrder, ID_FIELD};
use bson::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Page Request
// ============================================================================

/// Everything needed to fetch one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// `$match` filter applied before anything else
    #[serde(default)]
    pub filter: Document,

    /// Sort field, limit, cursor and grouping
    pub pager: PagerSpec,

    /// Joins applied after the limit, in declaration order
    #[serde(default)]
    pub populators: Vec<PopulatorSpec>,

    /// `$match` filter applied after the joins
    #[serde(default)]
    pub post_filter: Option<Document>,

    /// Break sort ties on `_id` and carry `_id` in the cursor
    #[serde(default)]
    pub secondary_sort_on_id: bool,

    /// Ask the query runner to bypass any cache it keeps
    #[serde(default)]
    pub skip_cache: bool,
}

impl PageRequest {
    /// Create a request paging on `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            pager: PagerSpec::new(field),
            ..Default::default()
        }
    }

    /// Set the filter
    #[must_use]
    pub fn with_filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_limit(mut self, limit: impl Into<LimitValue>) -> Self {
        self.pager.limit = Some(limit.into());
        self
    }

    /// Continue after a cursor
    #[must_use]
    pub fn with_cursor(mut self, from: impl Into<CursorToken>) -> Self {
        self.pager.from = Some(from.into());
        self
    }

    /// Set an explicit sort order
    #[must_use]
    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.pager.sort_order = Some(order.as_i32());
        self
    }

    /// Group rows before sorting
    #[must_use]
    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.pager.group_by = Some(group);
        self
    }

    /// Add a populator
    #[must_use]
    pub fn with_populator(mut self, populator: PopulatorSpec) -> Self {
        self.populators.push(populator);
        self
    }

    /// Set the post-join filter
    #[must_use]
    pub fn with_post_filter(mut self, filter: Document) -> Self {
        self.post_filter = Some(filter);
        self
    }

    /// Break ties on `_id`
    #[must_use]
    pub fn with_secondary_sort_on_id(mut self, enabled: bool) -> Self {
        self.secondary_sort_on_id = enabled;
        self
    }

    /// Bypass runner caches
    #[must_use]
    pub fn with_skip_cache(mut self, skip: bool) -> Self {
        self.skip_cache = skip;
        self
    }

    /// Check the request shape before planning
    pub fn validate(&self) -> Result<()> {
        if self.pager.field.trim().is_empty() {
            return Err(Error::invalid_request("pager field cannot be empty"));
        }

        if let Some(group) = &self.pager.group_by {
            if group.key_fields().next().is_none() {
                return Err(Error::invalid_request(
                    "group_by needs at least one field other than _id",
                ));
            }
        }

        for populator in &self.populators {
            if populator.from.trim().is_empty() {
                return Err(Error::invalid_request("populator collection cannot be empty"));
            }
            if populator.local_field.trim().is_empty() {
                return Err(Error::invalid_request(format!(
                    "populator for '{}' has an empty local_field",
                    populator.from
                )));
            }
        }

        let replacing = self
            .populators
            .iter()
            .filter(|p| p.replaces_root())
            .count();
        if replacing > 1 {
            return Err(Error::MultipleRootReplacements { count: replacing });
        }

        Ok(())
    }
}

// ============================================================================
// Pager Spec
// ============================================================================

/// Sort, size and position of the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagerSpec {
    /// Field the page is sorted and cursored on
    pub field: String,

    /// Page size; missing, zero or non-numeric values use the default
    #[serde(default, deserialize_with = "deserialize_limit")]
    pub limit: Option<LimitValue>,

    /// Ascending when `true`; ignored if `sort_order` is set
    #[serde(default)]
    pub sort_ascending: Option<bool>,

    /// Explicit `1` / `-1`
    #[serde(default)]
    pub sort_order: Option<i32>,

    /// Cursor from the previous page
    #[serde(default)]
    pub from: Option<CursorToken>,

    /// Optional grouping
    #[serde(default)]
    pub group_by: Option<GroupSpec>,
}

impl PagerSpec {
    /// Create a pager on `field` with default settings
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Default::default()
        }
    }

    /// Resolved sort direction
    pub fn resolved_order(&self) -> SortOrder {
        resolve_sort_order(self.sort_order, self.sort_ascending)
    }
}

// ============================================================================
// Group Spec
// ============================================================================

/// Grouping applied before the pager sort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Group key fields; `_id` entries are ignored
    pub fields: Vec<String>,

    /// Sort rows before grouping so `$first`/`$last` are deterministic
    #[serde(default)]
    pub sort_before_group: bool,

    /// Extra fields carried from the representative row
    #[serde(default)]
    pub project_fields: Vec<String>,

    /// Output field holding the number of rows per group
    #[serde(default)]
    pub count_as: Option<String>,

    /// Numeric source field → output field holding its sum
    #[serde(default)]
    pub field_sum_map: BTreeMap<String, String>,
}

impl GroupSpec {
    /// Group on the given fields
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Key fields with `_id` removed
    pub fn key_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|field| *field != ID_FIELD)
    }

    /// Sort before grouping
    #[must_use]
    pub fn sort_before(mut self) -> Self {
        self.sort_before_group = true;
        self
    }

    /// Carry extra fields
    #[must_use]
    pub fn with_project_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Count rows per group under `alias`
    #[must_use]
    pub fn with_count(mut self, alias: impl Into<String>) -> Self {
        self.count_as = Some(alias.into());
        self
    }

    /// Sum `source` into `output`
    #[must_use]
    pub fn with_sum(mut self, source: impl Into<String>, output: impl Into<String>) -> Self {
        self.field_sum_map.insert(source.into(), output.into());
        self
    }
}

// ============================================================================
// Populator Spec
// ============================================================================

/// Join against another collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulatorSpec {
    /// Target collection name
    pub from: String,

    /// Field on the current document holding the reference
    pub local_field: String,

    /// Field on the target document; `_id` when unset
    #[serde(default)]
    pub foreign_field: Option<String>,

    /// Field receiving the joined documents; the collection name when unset
    #[serde(default)]
    pub alias: Option<String>,

    /// Plain join or root replacement
    #[serde(default)]
    pub mode: PopulateMode,
}

impl PopulatorSpec {
    /// Join `local_field` against `_id` of collection `from`
    pub fn new(from: impl Into<String>, local_field: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            local_field: local_field.into(),
            ..Default::default()
        }
    }

    /// Join against a collection handle, resolving its name
    pub fn for_collection(target: &dyn Collection, local_field: impl Into<String>) -> Self {
        Self::new(target.name(), local_field)
    }

    /// Effective foreign field
    pub fn foreign_field(&self) -> &str {
        self.foreign_field.as_deref().unwrap_or(ID_FIELD)
    }

    /// Effective alias
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.from)
    }

    /// Whether the joined document replaces the current one
    pub fn replaces_root(&self) -> bool {
        matches!(self.mode, PopulateMode::ReplaceRoot { .. })
    }

    /// Set the foreign field
    #[must_use]
    pub fn with_foreign_field(mut self, field: impl Into<String>) -> Self {
        self.foreign_field = Some(field.into());
        self
    }

    /// Set the alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Replace the current document with the first joined one
    #[must_use]
    pub fn replace_root(mut self) -> Self {
        if !self.replaces_root() {
            self.mode = PopulateMode::ReplaceRoot {
                retained_fields: BTreeMap::new(),
            };
        }
        self
    }

    /// Keep `source` from the replaced document, stored as `target`
    ///
    /// Switches the populator to root replacement.
    #[must_use]
    pub fn retain(mut self, source: impl Into<String>, target: RetainedTarget) -> Self {
        self = self.replace_root();
        if let PopulateMode::ReplaceRoot { retained_fields } = &mut self.mode {
            retained_fields.insert(source.into(), target);
        }
        self
    }
}

/// What a populator does with the joined documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PopulateMode {
    /// Attach joined documents under the alias
    #[default]
    Join,

    /// Re-anchor the row on the first joined document
    ReplaceRoot {
        /// Source field → where to keep it on the new root
        #[serde(default)]
        retained_fields: BTreeMap<String, RetainedTarget>,
    },
}

/// Destination of a retained field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetainedTarget {
    /// `true` keeps the source name, `false` drops the entry
    Keep(bool),
    /// Store under a different name
    Rename(String),
}

impl RetainedTarget {
    /// Destination name for `source`, if the field is retained at all
    pub fn destination<'a>(&'a self, source: &'a str) -> Option<&'a str> {
        match self {
            RetainedTarget::Keep(true) => Some(source),
            RetainedTarget::Keep(false) => None,
            RetainedTarget::Rename(name) => Some(name.as_str()),
        }
    }
}
