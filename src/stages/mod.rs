//! Stage generators
//!
//! Builds the grouping and join portions of the page pipeline.
//!
//! # Overview
//!
//! - [`group_stages`] - optional pre-sort plus a single `$group`
//! - [`populate_stages`] - `$lookup` per populator, plus root replacement
//!
//! Both only emit documents; ordering them into a pipeline is the job of
//! [`crate::pipeline`].

mod group;
mod populate;

pub use group::group_stages;
pub use populate::{populate_stages, stash_suffix, PopulatePlan};

#[cfg(test)]
mod tests;
