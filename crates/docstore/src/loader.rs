//! Seed loader: builds a `MemoryDatabase` from JSON files on disk.
//!
//! A data directory holds one file per collection:
//! - `pets.json`: array of listing objects
//! - `users.json`: array of lister profiles
//!
//! Each file must be a JSON array of objects.

use crate::error::{Result, StoreError};
use crate::memory::MemoryDatabase;
use crate::types::Document;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

pub const PETS: &str = "pets";
pub const USERS: &str = "users";

impl MemoryDatabase {
    /// Load the pets and users collections from a directory.
    ///
    /// Steps:
    /// 1. Parse both files in parallel
    /// 2. Validate listing field types
    /// 3. Insert into a fresh database
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading seed data from {:?}", data_dir);

        let pets_path = data_dir.join("pets.json");
        let users_path = data_dir.join("users.json");

        let (pets, users) = rayon::join(
            || parse_documents(&pets_path),
            || parse_documents(&users_path),
        );
        let pets = pets?;
        let users = users?;

        validate_listings(&pets, "pets.json")?;

        info!("Loaded {} pets, {} users", pets.len(), users.len());

        let db = MemoryDatabase::new();
        db.insert_many(PETS, pets)?;
        db.insert_many(USERS, users)?;
        Ok(db)
    }
}

/// Parse a file holding a JSON array of objects.
pub fn parse_documents(path: &Path) -> Result<Vec<Document>> {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !path.exists() {
        return Err(StoreError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_documents_str(&content, &file)
}

/// Parse JSON text holding an array of objects. `file` is used in errors.
pub fn parse_documents_str(content: &str, file: &str) -> Result<Vec<Document>> {
    let value: Value = serde_json::from_str(content).map_err(|e| StoreError::ParseError {
        file: file.to_string(),
        reason: e.to_string(),
    })?;

    let Value::Array(items) = value else {
        return Err(StoreError::ParseError {
            file: file.to_string(),
            reason: "expected a top-level array".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(doc) => Ok(doc),
            other => Err(StoreError::ParseError {
                file: file.to_string(),
                reason: format!("element {index} is not an object: {other}"),
            }),
        })
        .collect()
}

/// Check the field types the ranking code relies on.
///
/// - `category` must be a string
/// - `location`, if present, must be a string
/// - `adopted`, if present, must be a boolean
/// - `created_at`, if present, must be an integer (epoch milliseconds)
pub fn validate_listings(docs: &[Document], file: &str) -> Result<()> {
    for (index, doc) in docs.iter().enumerate() {
        let invalid = |field: &str, value: Option<&Value>| StoreError::InvalidValue {
            file: file.to_string(),
            index,
            field: field.to_string(),
            value: value.map(Value::to_string).unwrap_or_else(|| "missing".to_string()),
        };

        match doc.get("category") {
            Some(Value::String(_)) => {}
            other => return Err(invalid("category", other)),
        }
        match doc.get("location") {
            None | Some(Value::String(_)) => {}
            other => return Err(invalid("location", other)),
        }
        match doc.get("adopted") {
            None | Some(Value::Bool(_)) => {}
            other => return Err(invalid("adopted", other)),
        }
        match doc.get("created_at") {
            None => {}
            Some(v) if v.as_i64().is_some() => {}
            other => return Err(invalid("created_at", other)),
        }
    }
    Ok(())
}
