//! Static types carried by XR nodes.
//!
//! The lattice is intentionally small: a renderer only needs to know whether a
//! value is a plain column value, a boolean (as a value or as a predicate), or
//! a product with named fields.

use serde::{Deserialize, Serialize};

/// Type of an XR node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XrType {
    /// A plain scalar value (number, string, date, ...).
    Value,
    /// A boolean used as a value (a column, a literal).
    BooleanValue,
    /// A boolean produced by a predicate (`a == b`, `x && y`).
    BooleanExpression,
    /// A named product with ordered fields (entity rows, constructors).
    Product {
        name: String,
        fields: Vec<(String, XrType)>,
    },
    /// A type parameter that was never made concrete.
    Generic,
    /// The type of the `null` literal.
    Null,
    /// Nothing is known.
    Unknown,
}

impl XrType {
    pub fn product(name: impl Into<String>, fields: Vec<(String, XrType)>) -> Self {
        Self::Product {
            name: name.into(),
            fields,
        }
    }

    /// Bottom types carry no information a substitution could lose.
    pub fn is_bottom(&self) -> bool {
        matches!(self, Self::Null | Self::Unknown)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::BooleanValue | Self::BooleanExpression)
    }

    pub fn is_product(&self) -> bool {
        matches!(self, Self::Product { .. })
    }

    /// Look up a product field's type.
    pub fn field(&self, name: &str) -> Option<&XrType> {
        let Self::Product { fields, .. } = self else {
            return None;
        };
        fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Whether `self` carries strictly more information than `other`.
    pub fn is_more_specific_than(&self, other: &XrType) -> bool {
        match (self, other) {
            (a, b) if a == b => false,
            (a, _) if a.is_bottom() || *a == Self::Generic => false,
            (_, b) if b.is_bottom() || *b == Self::Generic => true,
            (Self::BooleanValue | Self::BooleanExpression, Self::Value) => true,
            (Self::BooleanValue, Self::BooleanExpression) => false,
            (
                Self::Product {
                    name: a,
                    fields: fa,
                },
                Self::Product {
                    name: b,
                    fields: fb,
                },
            ) => {
                a == b
                    && fa.len() > fb.len()
                    && fb.iter().all(|(n, t)| {
                        fa.iter()
                            .any(|(m, u)| m == n && (u == t || u.is_more_specific_than(t)))
                    })
            }
            _ => false,
        }
    }

    /// Combine two types into the most precise type consistent with both.
    ///
    /// - `Generic` (and bottom types) defer to the other side
    /// - the two boolean kinds widen to `BooleanExpression`
    /// - a boolean against a plain value widens to `Value`
    /// - products with the same name merge field-wise (fields of `self` first)
    ///
    /// Returns `None` when no bound exists.
    pub fn least_upper_bound(&self, other: &XrType) -> Option<XrType> {
        match (self, other) {
            (a, b) if a == b => Some(a.clone()),
            (Self::Generic | Self::Unknown | Self::Null, b) => Some(b.clone()),
            (a, Self::Generic | Self::Unknown | Self::Null) => Some(a.clone()),
            (Self::BooleanValue, Self::BooleanExpression)
            | (Self::BooleanExpression, Self::BooleanValue) => Some(Self::BooleanExpression),
            (Self::BooleanValue | Self::BooleanExpression, Self::Value)
            | (Self::Value, Self::BooleanValue | Self::BooleanExpression) => Some(Self::Value),
            (
                Self::Product {
                    name: a,
                    fields: fa,
                },
                Self::Product {
                    name: b,
                    fields: fb,
                },
            ) if a == b => {
                let mut merged = Vec::with_capacity(fa.len().max(fb.len()));
                for (name, ty) in fa {
                    let combined = match fb.iter().find(|(n, _)| n == name) {
                        Some((_, other_ty)) => ty.least_upper_bound(other_ty)?,
                        None => ty.clone(),
                    };
                    merged.push((name.clone(), combined));
                }
                for (name, ty) in fb {
                    if !fa.iter().any(|(n, _)| n == name) {
                        merged.push((name.clone(), ty.clone()));
                    }
                }
                Some(Self::Product {
                    name: a.clone(),
                    fields: merged,
                })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for XrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value => write!(f, "Value"),
            Self::BooleanValue => write!(f, "BooleanValue"),
            Self::BooleanExpression => write!(f, "BooleanExpression"),
            Self::Product { name, .. } => write!(f, "{name}"),
            Self::Generic => write!(f, "Generic"),
            Self::Null => write!(f, "Null"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
