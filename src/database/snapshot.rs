//! Portable JSON snapshot of a whole database
//!
//! The file written by the in-process dump path is `backup.json`:
//!
//! ```json
//! {
//!   "timestamp": "2025-05-31T03:00:00Z",
//!   "database": "gamevault",
//!   "collections": {
//!     "games": [ { "_id": { "$oid": "665a..." }, "title": "..." } ]
//!   }
//! }
//! ```
//!
//! Values are parsed into [`SnapshotValue`], which keeps object identifiers
//! as a distinct [`SnapshotValue::Reference`] variant so restore never has to
//! guess from field shapes. 64-bit integers are written as
//! `{ "$numberLong": "<n>" }`; a bare JSON integer restores as a 32-bit
//! integer when it fits.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{BackupError, BackupResult};

/// File name of the JSON snapshot inside a database artifact
pub const SNAPSHOT_FILE: &str = "backup.json";

/// A document value as stored in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum SnapshotValue {
    /// An object identifier, written as `{ "$oid": "<hex>" }`
    Reference(ObjectId),
    /// Null, boolean, number or string
    Plain(Value),
    Array(Vec<SnapshotValue>),
    /// Ordered field list
    Document(Vec<(String, SnapshotValue)>),
}

fn oid_wrapper(map: &Map<String, Value>) -> Option<&str> {
    if map.len() == 1 {
        map.get("$oid")?.as_str()
    } else {
        None
    }
}

impl From<Value> for SnapshotValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                if let Some(hex) = oid_wrapper(&map) {
                    match ObjectId::parse_str(hex) {
                        Ok(oid) => return Self::Reference(oid),
                        Err(_) => warn!("Could not convert $oid {:?}, keeping it as-is", hex),
                    }
                }
                Self::Document(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
            scalar => Self::Plain(scalar),
        }
    }
}

impl From<SnapshotValue> for Value {
    fn from(value: SnapshotValue) -> Self {
        match value {
            SnapshotValue::Reference(oid) => {
                let mut map = Map::new();
                map.insert("$oid".to_string(), Value::String(oid.to_hex()));
                Value::Object(map)
            }
            SnapshotValue::Plain(value) => value,
            SnapshotValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            SnapshotValue::Document(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl SnapshotValue {
    /// Capture a BSON value
    ///
    /// Identifiers and 64-bit integers keep their type; other leaves go
    /// through relaxed extended JSON.
    pub fn from_bson(bson: Bson) -> Self {
        match bson {
            Bson::ObjectId(oid) => Self::Reference(oid),
            Bson::Int64(n) => Self::Document(vec![(
                "$numberLong".to_string(),
                Self::Plain(Value::String(n.to_string())),
            )]),
            Bson::Array(items) => Self::Array(items.into_iter().map(Self::from_bson).collect()),
            Bson::Document(doc) => Self::Document(
                doc.into_iter()
                    .map(|(key, value)| (key, Self::from_bson(value)))
                    .collect(),
            ),
            other => Self::from(other.into_relaxed_extjson()),
        }
    }

    /// Convert back into native BSON
    ///
    /// Extended JSON wrappers other than `$oid` (`$date`, `$numberLong`, ...)
    /// are decoded by the driver; a wrapper it rejects is kept as a plain
    /// document and a warning is logged.
    pub fn into_bson(self) -> Bson {
        match self {
            Self::Reference(oid) => Bson::ObjectId(oid),
            Self::Plain(value) => plain_to_bson(value),
            Self::Array(items) => Bson::Array(items.into_iter().map(Self::into_bson).collect()),
            Self::Document(fields) => {
                if fields.iter().any(|(key, _)| key.starts_with('$')) {
                    let json = Value::from(Self::Document(fields.clone()));
                    match Bson::try_from(json) {
                        Ok(bson) => return bson,
                        Err(e) => warn!("Could not decode extended JSON value ({}), keeping it as-is", e),
                    }
                }
                Bson::Document(
                    fields
                        .into_iter()
                        .map(|(key, value)| (key, value.into_bson()))
                        .collect(),
                )
            }
        }
    }

    /// Convert a top-level snapshot entry into a document ready for insertion
    ///
    /// A plain string `_id` holding 24 hex digits becomes an object identifier.
    pub fn into_document(self) -> BackupResult<Document> {
        let fields = match self {
            Self::Document(fields) => fields,
            other => {
                return Err(BackupError::Validation(format!(
                    "snapshot entry is not a document: {}",
                    Value::from(other)
                )))
            }
        };

        let mut document = Document::new();
        for (key, value) in fields {
            let value = match (key.as_str(), value) {
                ("_id", Self::Plain(Value::String(raw))) => match ObjectId::parse_str(&raw) {
                    Ok(oid) => Self::Reference(oid),
                    Err(_) => {
                        warn!("Could not convert _id {:?}, keeping it as a string", raw);
                        Self::Plain(Value::String(raw))
                    }
                },
                (_, value) => value,
            };
            document.insert(key, value.into_bson());
        }
        Ok(document)
    }
}

fn plain_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map(Bson::Int32).unwrap_or(Bson::Int64(i))
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s),
        // Arrays and objects never land in `Plain`, but convert them faithfully anyway.
        other => SnapshotValue::from(other).into_bson(),
    }
}

/// Whole-database snapshot written by the in-process dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Source database name
    pub database: String,
    /// Documents keyed by collection name
    pub collections: BTreeMap<String, Vec<SnapshotValue>>,
}

impl DatabaseSnapshot {
    /// Start an empty snapshot of `database`
    pub fn new(database: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            database: database.into(),
            collections: BTreeMap::new(),
        }
    }

    /// Add a collection's documents
    pub fn insert_collection(&mut self, name: impl Into<String>, documents: Vec<Document>) {
        let values = documents
            .into_iter()
            .map(|doc| SnapshotValue::from_bson(Bson::Document(doc)))
            .collect();
        self.collections.insert(name.into(), values);
    }

    /// Total number of documents across all collections
    pub fn document_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Write the snapshot as `backup.json` inside `dir`
    pub fn write_to(&self, dir: &Path) -> BackupResult<PathBuf> {
        let path = dir.join(SNAPSHOT_FILE);
        let file = File::create(&path).map_err(|e| {
            BackupError::Io(format!("Failed to create {}: {}", path.display(), e))
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| BackupError::Json(format!("Failed to serialize snapshot: {}", e)))?;
        writer.flush()?;

        Ok(path)
    }

    /// Read a snapshot file
    pub fn read_from(path: &Path) -> BackupResult<Self> {
        let file = File::open(path).map_err(|e| {
            BackupError::Io(format!("Failed to open {}: {}", path.display(), e))
        })?;

        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| BackupError::Json(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Convert every collection into insertable documents
    ///
    /// Entries that are not documents are skipped with a warning.
    pub fn into_documents(self) -> Vec<(String, Vec<Document>)> {
        self.collections
            .into_iter()
            .map(|(name, values)| {
                let documents = values
                    .into_iter()
                    .filter_map(|value| match value.into_document() {
                        Ok(doc) => Some(doc),
                        Err(e) => {
                            warn!("Skipping entry in {}: {}", name, e);
                            None
                        }
                    })
                    .collect();
                (name, documents)
            })
            .collect()
    }
}
