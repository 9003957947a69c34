//! Entity contracts
//!
//! Every type served by a repository implements [`Entity`]: it has a stable
//! identity that never changes after the store creates it. Stores that evaluate
//! criteria themselves (such as [`MemoryStore`](crate::store::MemoryStore)) also
//! need [`Record`] to read fields by name.

use std::fmt;
use std::hash::Hash;

use crate::specification::FilterValue;

/// An identity-bearing record managed by a store
///
/// The repository layer only reads entities; creation and destruction belong to
/// the store.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Identity type (e.g. `i32`, `i64`, an opaque string key)
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + Into<FilterValue>;

    /// Human-readable entity type name used in logs and errors
    const ENTITY_TYPE: &'static str;

    /// Name of the field holding the identity
    const ID_FIELD: &'static str = "id";

    /// The entity's identity
    fn id(&self) -> &Self::Id;
}

/// Read access to an entity's fields by name
///
/// Returns `None` for unknown field names and `Some(FilterValue::Null)` for
/// known fields without a value.
pub trait Record {
    /// Read the value of `name`
    fn field(&self, name: &str) -> Option<FilterValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Tag {
        code: String,
        label: Option<String>,
    }

    impl Entity for Tag {
        type Id = String;
        const ENTITY_TYPE: &'static str = "Tag";
        const ID_FIELD: &'static str = "code";

        fn id(&self) -> &String {
            &self.code
        }
    }

    impl Record for Tag {
        fn field(&self, name: &str) -> Option<FilterValue> {
            match name {
                "code" => Some(self.code.as_str().into()),
                "label" => Some(
                    self.label
                        .as_deref()
                        .map_or(FilterValue::Null, FilterValue::from),
                ),
                _ => None,
            }
        }
    }

    #[test]
    fn test_custom_id_field() {
        let tag = Tag {
            code: "rust".to_string(),
            label: None,
        };
        assert_eq!(Tag::ID_FIELD, "code");
        assert_eq!(tag.id(), "rust");
        let value: FilterValue = tag.id().clone().into();
        assert_eq!(value, FilterValue::String("rust".into()));
    }

    #[test]
    fn test_record_distinguishes_unknown_from_null() {
        let tag = Tag {
            code: "rust".to_string(),
            label: None,
        };
        assert_eq!(tag.field("label"), Some(FilterValue::Null));
        assert_eq!(tag.field("missing"), None);
    }
}
