//! Procedural macros for the scaffold workspace.
//!
//! `#[derive(Record)]` generates the static field table and the by-name field accessors a
//! collection needs to reconcile partial updates, reading `#[serde(...)]` attributes so the
//! table always agrees with the struct's serde representation.

use proc_macro::TokenStream;

mod record;

/// Derives `scaffold::record::Record` for a struct with named fields.
///
/// - `#[serde(rename = "...")]` on a field sets its external name.
/// - `#[serde(skip)]` (or `skip_serializing` / `skip_deserializing`) leaves a field out.
/// - `#[record(kind = "object")]` overrides the field kind for types that do not implement
///   `FieldType`. Accepted kinds: `bool`, `integer`, `float`, `string`, `array`, `object`, `any`.
///
/// Container-level `rename_all`, `deny_unknown_fields`, and field-level `flatten` are rejected.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
