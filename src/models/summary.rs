//! Identifier summary of a stored game, used by the debug listing

use mongodb::bson::{Bson, Document};

use super::game::Game;

/// One line of the debug listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    /// 1-based position in the collection
    pub index: usize,
    pub title: String,
    /// `_id` rendered as text, `-` when absent
    pub id: String,
    /// BSON type of `_id`
    pub id_type: &'static str,
    /// Validation problems found in the record
    pub issues: Vec<String>,
}

impl GameSummary {
    /// Summarize a raw `games` document
    pub fn from_document(index: usize, document: &Document) -> Self {
        let title = document
            .get_str("title")
            .map(str::to_string)
            .unwrap_or_else(|_| "(untitled)".to_string());

        let (id, id_type) = match document.get("_id") {
            Some(Bson::ObjectId(oid)) => (oid.to_hex(), "objectId"),
            Some(Bson::String(s)) => (s.clone(), "string"),
            Some(other) => (other.to_string(), bson_type_name(other)),
            None => ("-".to_string(), "missing"),
        };

        let issues = match mongodb::bson::from_document::<Game>(document.clone()) {
            Ok(game) => game.issues(),
            Err(e) => vec![format!("Not a valid game record: {}", e)],
        };

        Self {
            index,
            title,
            id,
            id_type,
            issues,
        }
    }

    /// Whether `_id` is a proper object identifier
    pub fn has_object_id(&self) -> bool {
        self.id_type == "objectId"
    }
}

/// MongoDB's name for the type of a BSON value
pub fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => "javascript",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}
