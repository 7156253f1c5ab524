//! Request and document file parsing
//!
//! Files ending in `.json` are read as JSON, everything else as YAML.
//! Extended JSON (`{"$oid": ...}`, `{"$date": ...}`) becomes native BSON.

use crate::error::{Error, Result};
use crate::pager::PageRequest;
use bson::Document;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Load a page request from a file
///
/// # Examples
///
/// ```ignore
/// let request = load_request("./requests/recent-orders.yaml")?;
/// ```
pub fn load_request(path: impl AsRef<Path>) -> Result<PageRequest> {
    let path = path.as_ref();
    let content = read_file(path)?;
    let request: PageRequest = parse(path, &content)
        .map_err(|e| Error::config(format!("Failed to parse request '{}': {e}", path.display())))?;
    request.validate()?;
    Ok(request)
}

/// Load a page request from a YAML (or JSON) string
pub fn load_request_from_str(yaml: &str) -> Result<PageRequest> {
    let request: PageRequest = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse request YAML: {e}")))?;
    request.validate()?;
    Ok(request)
}

/// Either a bare list of documents or documents keyed by collection
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentsFile {
    List(Vec<Document>),
    Named(BTreeMap<String, Vec<Document>>),
}

impl DocumentsFile {
    fn into_collections(self, default_collection: &str) -> BTreeMap<String, Vec<Document>> {
        match self {
            DocumentsFile::List(docs) => BTreeMap::from([(default_collection.to_string(), docs)]),
            DocumentsFile::Named(collections) => collections,
        }
    }
}

/// Load seed documents from a file
///
/// A top-level list goes to `default_collection`; a top-level map names
/// the collections itself.
pub fn load_documents(
    path: impl AsRef<Path>,
    default_collection: &str,
) -> Result<BTreeMap<String, Vec<Document>>> {
    let path = path.as_ref();
    let content = read_file(path)?;
    let file: DocumentsFile = parse(path, &content).map_err(|e| {
        Error::config(format!("Failed to parse documents '{}': {e}", path.display()))
    })?;
    let collections = file.into_collections(default_collection);

    tracing::debug!(
        "Loaded {} documents in {} collections from {}",
        collections.values().map(Vec::len).sum::<usize>(),
        collections.len(),
        path.display()
    );
    Ok(collections)
}

/// Load seed documents from a YAML (or JSON) string
pub fn load_documents_from_str(
    yaml: &str,
    default_collection: &str,
) -> Result<BTreeMap<String, Vec<Document>>> {
    let file: DocumentsFile = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse documents YAML: {e}")))?;
    Ok(file.into_collections(default_collection))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!("Failed to read '{}': {e}", path.display()))
        }
    })
}

fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> std::result::Result<T, String> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }
}
