use serde::{Deserialize, Serialize};

/// Kind of symbol referenced from bytecode.
///
/// Closed enumeration: the codec assigns each variant a stable tag, so
/// adding a variant requires bumping [`crate::codec::FORMAT_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RefKind {
    /// Reference to a class or interface type
    Class,

    /// Reference to a field (read or write)
    Field,

    /// Reference to a method (any invoke form)
    Method,
}

/// Canonical identifier of a referenced class, field, or method.
///
/// Equality, hashing, and ordering are structural over all fields with
/// no normalization: `owner`, `name`, and `descriptor` are compared as
/// exact strings. `owner` is an internal name (`com/mojang/Bar`);
/// `name` and `descriptor` are absent for class references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolKey {
    pub kind: RefKind,
    pub owner: String,
    pub name: Option<String>,
    pub descriptor: Option<String>,
}

impl SymbolKey {
    /// Key for a reference to the type `owner`.
    pub fn class_ref(owner: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Class,
            owner: owner.into(),
            name: None,
            descriptor: None,
        }
    }

    /// Key for a reference to the field `owner.name` of type `descriptor`.
    pub fn field_ref(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            kind: RefKind::Field,
            owner: owner.into(),
            name: Some(name.into()),
            descriptor: Some(descriptor.into()),
        }
    }

    /// Key for a reference to the method `owner.name` with signature `descriptor`.
    pub fn method_ref(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            kind: RefKind::Method,
            owner: owner.into(),
            name: Some(name.into()),
            descriptor: Some(descriptor.into()),
        }
    }
}
