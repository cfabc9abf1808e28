//! Static types assigned by the host front-end.

use quarry_core::{ContainerTag, XrType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostType {
    Unit,
    Boolean,
    Int,
    Long,
    Double,
    String,
    Char,
    Class {
        name: String,
        #[serde(default)]
        fields: Vec<(String, HostType)>,
    },
    Nullable(Box<HostType>),
    List(Box<HostType>),
    /// `SqlQuery<T>`
    Query(Box<HostType>),
    /// `SqlExpression<T>`
    Expression(Box<HostType>),
    /// `SqlAction<Input, Output>`
    Action {
        input: Box<HostType>,
        output: Box<HostType>,
    },
    /// `SqlActionBatch<Batch, Input, Output>`
    ActionBatch {
        batch: Box<HostType>,
        input: Box<HostType>,
        output: Box<HostType>,
    },
    Function {
        params: Vec<HostType>,
        ret: Box<HostType>,
    },
    TypeParam(String),
    Unknown,
}

impl HostType {
    pub fn class(name: impl Into<String>, fields: Vec<(String, HostType)>) -> Self {
        Self::Class {
            name: name.into(),
            fields,
        }
    }

    pub fn query(row: HostType) -> Self {
        Self::Query(Box::new(row))
    }

    pub fn expression(value: HostType) -> Self {
        Self::Expression(Box::new(value))
    }

    pub fn action(input: HostType, output: HostType) -> Self {
        Self::Action {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    /// Structural signature, as used in cross-module store keys.
    pub fn signature(&self) -> String {
        match self {
            Self::Unit => "Unit".into(),
            Self::Boolean => "Boolean".into(),
            Self::Int => "Int".into(),
            Self::Long => "Long".into(),
            Self::Double => "Double".into(),
            Self::String => "String".into(),
            Self::Char => "Char".into(),
            Self::Class { name, .. } => name.clone(),
            Self::Nullable(inner) => format!("{}?", inner.signature()),
            Self::List(inner) => format!("List<{}>", inner.signature()),
            Self::Query(row) => format!("SqlQuery<{}>", row.signature()),
            Self::Expression(value) => format!("SqlExpression<{}>", value.signature()),
            Self::Action { input, output } => {
                format!("SqlAction<{}, {}>", input.signature(), output.signature())
            }
            Self::ActionBatch {
                batch,
                input,
                output,
            } => format!(
                "SqlActionBatch<{}, {}, {}>",
                batch.signature(),
                input.signature(),
                output.signature()
            ),
            Self::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(HostType::signature).collect();
                format!("({}) -> {}", params.join(", "), ret.signature())
            }
            Self::TypeParam(name) => name.clone(),
            Self::Unknown => "*".into(),
        }
    }

    /// Kind of capture a value of this type holds, if any.
    pub fn capture_kind(&self) -> Option<ContainerTag> {
        match self {
            Self::Query(_) => Some(ContainerTag::Query),
            Self::Expression(_) => Some(ContainerTag::Expr),
            Self::Action { .. } => Some(ContainerTag::Action),
            Self::ActionBatch { .. } => Some(ContainerTag::ActionBatch),
            _ => None,
        }
    }

    /// Values a plain `param(..)` can bind without a custom serializer.
    pub fn is_primitive(&self) -> bool {
        match self {
            Self::Boolean
            | Self::Int
            | Self::Long
            | Self::Double
            | Self::String
            | Self::Char => true,
            Self::Nullable(inner) => inner.is_primitive(),
            _ => false,
        }
    }

    /// Element type of a list, or the type itself.
    pub fn element(&self) -> &HostType {
        match self {
            Self::List(inner) => inner,
            other => other,
        }
    }

    /// Class name of a row type, looking through nullability.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class { name, .. } => Some(name),
            Self::Nullable(inner) => inner.class_name(),
            _ => None,
        }
    }

    pub fn to_xr_type(&self) -> XrType {
        match self {
            Self::Boolean => XrType::BooleanValue,
            Self::Unit | Self::Int | Self::Long | Self::Double | Self::String | Self::Char => {
                XrType::Value
            }
            Self::Class { name, fields } => XrType::Product {
                name: name.clone(),
                fields: fields
                    .iter()
                    .map(|(n, t)| (n.clone(), t.to_xr_type()))
                    .collect(),
            },
            Self::Nullable(inner) | Self::List(inner) => inner.to_xr_type(),
            Self::Query(inner) | Self::Expression(inner) => inner.to_xr_type(),
            Self::Action { output, .. } | Self::ActionBatch { output, .. } => output.to_xr_type(),
            Self::TypeParam(_) => XrType::Generic,
            Self::Function { .. } | Self::Unknown => XrType::Unknown,
        }
    }
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.signature())
    }
}
