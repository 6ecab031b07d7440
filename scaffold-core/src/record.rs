//! The user-defined schema stored inside every document.
//!
//! A [`Record`] is a plain struct with a static table of [`FieldDescriptor`]s mapping each
//! field's internal (Rust) name to its external (wire) name and declared kind. The table is
//! produced at compile time by `#[derive(Record)]`, which reads `#[serde(rename = "...")]`
//! to find the external name, so the wire name used for reconciliation is always the name
//! serde writes.
//!
//! # Example
//!
//! ```ignore
//! use scaffold::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Record)]
//! pub struct User {
//!     #[serde(rename = "display_name")]
//!     pub name: String,
//!     pub age: Option<i64>,
//! }
//!
//! assert_eq!(User::FIELDS[0].external, "display_name");
//! assert_eq!(User::FIELDS[0].name, "name");
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    fmt::Debug,
};

use crate::error::{ScaffoldError, ScaffoldResult};

pub use serde_json::{Map, Value};

/// A client-proposed or hook-resolved mapping of field name to new value.
pub type FieldSet = Map<String, Value>;

/// The external names the store reserves for the document envelope.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created", "last_updated"];

/// Declared runtime type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    /// Whole numbers. Floats are never accepted, even when integral.
    Integer,
    /// Numbers carried as floating point. Integers are never widened into this kind.
    Float,
    String,
    Array,
    Object,
    /// Accepts any value.
    Any,
}

impl FieldKind {
    /// Returns whether `value` has exactly this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Any, _) => true,
            (FieldKind::Bool, Value::Bool(_)) => true,
            (FieldKind::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldKind::Float, Value::Number(n)) => n.is_f64(),
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::Array, Value::Array(_)) => true,
            (FieldKind::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The Rust field identifier.
    pub name: &'static str,
    /// The name the field carries on the wire and in the store.
    pub external: &'static str,
    /// The declared kind of the field.
    pub kind: FieldKind,
    /// Whether `null` is a valid value (the field is an `Option`).
    pub nullable: bool,
}

impl FieldDescriptor {
    /// Returns whether `value` may be assigned to this field without coercion.
    pub fn accepts(&self, value: &Value) -> bool {
        (self.nullable && value.is_null()) || self.kind.accepts(value)
    }
}

/// Associates a Rust type with the [`FieldKind`] it has on the wire.
///
/// Implemented for the common scalar, collection, and time types. Nested structs used as
/// record fields implement it with `FieldKind::Object`:
///
/// ```ignore
/// impl FieldType for Address {
///     const KIND: FieldKind = FieldKind::Object;
/// }
/// ```
pub trait FieldType {
    const KIND: FieldKind;
    const NULLABLE: bool = false;
}

macro_rules! field_type {
    ($kind:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl FieldType for $ty {
                const KIND: FieldKind = FieldKind::$kind;
            }
        )+
    };
}

field_type!(Bool => bool);
field_type!(Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
field_type!(Float => f32, f64);
field_type!(String => String, char, uuid::Uuid);
field_type!(Any => Value);
field_type!(Object => Map<String, Value>);

impl<Tz: chrono::TimeZone> FieldType for chrono::DateTime<Tz> {
    const KIND: FieldKind = FieldKind::String;
}

impl FieldType for chrono::NaiveDate {
    const KIND: FieldKind = FieldKind::String;
}

impl<T: FieldType> FieldType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = true;
}

impl<T: FieldType + ?Sized> FieldType for Box<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = T::NULLABLE;
}

impl<T> FieldType for Vec<T> {
    const KIND: FieldKind = FieldKind::Array;
}

impl<T> FieldType for VecDeque<T> {
    const KIND: FieldKind = FieldKind::Array;
}

impl<T> FieldType for HashSet<T> {
    const KIND: FieldKind = FieldKind::Array;
}

impl<T> FieldType for BTreeSet<T> {
    const KIND: FieldKind = FieldKind::Array;
}

impl<K, V> FieldType for HashMap<K, V> {
    const KIND: FieldKind = FieldKind::Object;
}

impl<K, V> FieldType for BTreeMap<K, V> {
    const KIND: FieldKind = FieldKind::Object;
}

/// A typed schema stored inside a [`Document`](crate::document::Document).
///
/// Implement it with `#[derive(Record)]`; the derive keeps [`Record::FIELDS`],
/// [`Record::field_value`], and [`Record::set_field`] consistent with the serde
/// representation of the struct.
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Every persisted field in declaration order.
    const FIELDS: &'static [FieldDescriptor];

    /// Returns the current value of the field with the given internal name, encoded as JSON.
    ///
    /// Returns `None` when the record has no such field.
    fn field_value(&self, name: &str) -> Option<ScaffoldResult<Value>>;

    /// Decodes `value` into the field with the given internal name.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no such field or the value cannot be decoded into it.
    fn set_field(&mut self, name: &str, value: Value) -> ScaffoldResult<()>;

    /// Finds the descriptor whose external or internal name equals `key`.
    ///
    /// External names are matched before internal names.
    fn describe(key: &str) -> Option<&'static FieldDescriptor> {
        Self::FIELDS
            .iter()
            .find(|field| field.external == key)
            .or_else(|| {
                Self::FIELDS
                    .iter()
                    .find(|field| field.name == key)
            })
    }
}

/// Encodes a field value as JSON. Used by the `Record` derive.
#[doc(hidden)]
pub fn encode_field<T: Serialize + ?Sized>(value: &T) -> ScaffoldResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Decodes a JSON value into a field. Used by the `Record` derive.
#[doc(hidden)]
pub fn decode_field<T: DeserializeOwned>(field: &str, value: Value) -> ScaffoldResult<T> {
    serde_json::from_value(value).map_err(|_| ScaffoldError::InvalidFieldType(field.to_string()))
}

/// Error for a field name the record does not declare. Used by the `Record` derive.
#[doc(hidden)]
pub fn unknown_field(name: &str) -> ScaffoldError {
    ScaffoldError::Internal(format!("record has no field named {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, scaffold_macros::Record)]
    struct Profile {
        #[serde(rename = "display_name")]
        name: String,
        age: Option<i64>,
        score: f64,
        tags: Vec<String>,
        #[serde(skip)]
        cache: u32,
    }

    #[test]
    fn integer_kind_rejects_floats() {
        assert!(FieldKind::Integer.accepts(&json!(3)));
        assert!(!FieldKind::Integer.accepts(&json!(3.0)));
        assert!(!FieldKind::Integer.accepts(&json!("3")));
    }

    #[test]
    fn float_kind_rejects_integers() {
        assert!(FieldKind::Float.accepts(&json!(2.5)));
        assert!(!FieldKind::Float.accepts(&json!(2)));
    }

    #[test]
    fn nullable_fields_accept_null() {
        let field = Profile::describe("age").unwrap();

        assert!(field.nullable);
        assert!(field.accepts(&Value::Null));
        assert!(field.accepts(&json!(30)));
        assert!(!Profile::describe("score").unwrap().accepts(&Value::Null));
    }

    #[test]
    fn derive_maps_external_names() {
        let names: Vec<_> = Profile::FIELDS
            .iter()
            .map(|f| (f.name, f.external, f.kind))
            .collect();

        assert_eq!(
            names,
            vec![
                ("name", "display_name", FieldKind::String),
                ("age", "age", FieldKind::Integer),
                ("score", "score", FieldKind::Float),
                ("tags", "tags", FieldKind::Array),
            ]
        );
    }

    #[test]
    fn describe_prefers_external_name() {
        assert_eq!(Profile::describe("display_name").unwrap().name, "name");
        assert_eq!(Profile::describe("name").unwrap().external, "display_name");
        assert!(Profile::describe("cache").is_none());
        assert!(Profile::describe("id").is_none());
    }

    #[test]
    fn derive_reads_and_writes_fields() {
        let mut profile = Profile {
            name: "a".into(),
            age: None,
            score: 1.5,
            tags: vec![],
            cache: 0,
        };

        assert_eq!(profile.field_value("name").unwrap().unwrap(), json!("a"));
        assert!(profile.field_value("missing").is_none());

        profile.set_field("tags", json!(["x"])).unwrap();
        profile.set_field("age", json!(41)).unwrap();

        assert_eq!(profile.tags, vec!["x".to_string()]);
        assert_eq!(profile.age, Some(41));
        assert!(profile.set_field("missing", json!(1)).is_err());
    }
}
