//! The document wrapper: an identifier and timestamps around a [`Record`].
//!
//! A [`Document`] serializes with its record inlined next to the envelope fields:
//!
//! ```json
//! { "id": "0f4c…", "created": "2025-01-01T00:00:00Z", "last_updated": "…", "name": "a" }
//! ```
//!
//! Documents do not hold a pointer to the collection they came from. Operations that route
//! back through the hook pipeline ([`Document::set_many`], [`Document::delete`]) take the
//! owning [`Collection`] as an explicit argument.

use bson::{Document as BsonDocument, de::deserialize_from_document, ser::serialize_to_document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::{
    collection::{Collection, UpdateOutcome},
    context::Context,
    error::{ScaffoldError, ScaffoldResult},
    record::{FieldSet, Record},
};

/// Globally unique, immutable document identifier.
///
/// Serialized as its hyphenated string form, both on the wire and in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = ScaffoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ScaffoldError::bad_request("invalid id"))
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        Uuid::parse_str(&raw)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Returns the current time, the source of every document timestamp.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// A stored record together with its identifier and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "R: Record")]
pub struct Document<R: Record> {
    pub id: DocumentId,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub data: R,
}

impl<R: Record> Document<R> {
    /// Wraps `data` in a new document with a fresh identifier and both timestamps set to now.
    pub fn new(data: R) -> Self {
        let now = now();

        Self {
            id: DocumentId::new(),
            created: now,
            last_updated: now,
            data,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn data(&self) -> &R {
        &self.data
    }

    /// Updates a single field through the collection's update pipeline.
    ///
    /// `field` may be the external or the internal name.
    pub async fn set(
        &mut self,
        collection: &Collection<R>,
        ctx: &Context,
        field: &str,
        value: impl Into<Value>,
    ) -> ScaffoldResult<UpdateOutcome> {
        let mut fields = FieldSet::new();
        fields.insert(field.to_string(), value.into());

        self.set_many(collection, ctx, fields).await
    }

    /// Reconciles `fields` into this document and persists the fields that changed.
    ///
    /// See [`Collection::update`].
    pub async fn set_many(
        &mut self,
        collection: &Collection<R>,
        ctx: &Context,
        fields: FieldSet,
    ) -> ScaffoldResult<UpdateOutcome> {
        collection.update(ctx, self, fields).await
    }

    /// Deletes this document after the collection's delete hook clears it.
    pub async fn delete(&self, collection: &Collection<R>, ctx: &Context) -> ScaffoldResult<()> {
        collection.delete(ctx, self).await
    }

    /// Encodes this document in its stored form.
    pub fn to_bson(&self) -> ScaffoldResult<BsonDocument> {
        Ok(serialize_to_document(self)?)
    }

    /// Decodes a document from its stored form.
    pub fn from_bson(document: BsonDocument) -> ScaffoldResult<Self> {
        Ok(deserialize_from_document(document)?)
    }
}

/// A document seeded into its collection at activation when no document with its
/// identifier exists yet.
///
/// Unset timestamps are filled with the activation time.
#[derive(Debug, Clone)]
pub struct DefaultDocument<R: Record> {
    pub id: DocumentId,
    pub created: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub data: R,
}

impl<R: Record> DefaultDocument<R> {
    pub fn new(id: DocumentId, data: R) -> Self {
        Self {
            id,
            created: None,
            last_updated: None,
            data,
        }
    }

    /// Sets the creation time recorded for the seeded document.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Sets the last-update time recorded for the seeded document.
    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = Some(last_updated);
        self
    }

    /// Resolves unset timestamps against `now` and produces the document to insert.
    pub(crate) fn into_document(self, now: DateTime<Utc>) -> Document<R> {
        Document {
            id: self.id,
            created: self.created.unwrap_or(now),
            last_updated: self.last_updated.unwrap_or(now),
            data: self.data,
        }
    }
}

impl<R: Record> From<Document<R>> for DefaultDocument<R> {
    fn from(document: Document<R>) -> Self {
        Self {
            id: document.id,
            created: Some(document.created),
            last_updated: Some(document.last_updated),
            data: document.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, scaffold_macros::Record)]
    struct Note {
        title: String,
        #[serde(rename = "body_text")]
        body: String,
    }

    fn note() -> Note {
        Note {
            title: "t".into(),
            body: "b".into(),
        }
    }

    #[test]
    fn new_documents_start_with_equal_timestamps() {
        let doc = Document::new(note());

        assert_eq!(doc.created, doc.last_updated);
    }

    #[test]
    fn identifiers_are_unique() {
        let a = Document::new(note());
        let b = Document::new(note());

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn record_fields_are_inlined_on_the_wire() {
        let doc = Document::new(note());
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["id"], json!(doc.id.to_string()));
        assert_eq!(value["title"], json!("t"));
        assert_eq!(value["body_text"], json!("b"));
        assert!(value.get("data").is_none());
        assert!(value["created"].is_string());
    }

    #[test]
    fn stored_form_round_trips() {
        let doc = Document::new(note());
        let stored = doc.to_bson().unwrap();

        assert_eq!(stored.get_str("id").unwrap(), doc.id.to_string());
        assert_eq!(Document::<Note>::from_bson(stored).unwrap(), doc);
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let err = "not-a-uuid".parse::<DocumentId>().unwrap_err();

        assert_eq!(err.message(), "invalid id");
    }

    #[test]
    fn seeds_fill_unset_timestamps() {
        let now = now();
        let earlier = now - chrono::Duration::days(1);
        let doc = DefaultDocument::new(DocumentId::new(), note())
            .with_created(earlier)
            .into_document(now);

        assert_eq!(doc.created, earlier);
        assert_eq!(doc.last_updated, now);
    }
}
