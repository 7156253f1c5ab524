//! Loader module
//!
//! Read page requests and seed documents from files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `load_request` / `load_request_from_str` - YAML or JSON page requests,
//!   validated before they are returned
//! - `load_documents` - documents for seeding a `MemoryStore`

mod parser;

pub use parser::{load_documents, load_documents_from_str, load_request, load_request_from_str};

#[cfg(test)]
mod tests;
