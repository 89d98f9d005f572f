use serde::{Deserialize, Serialize};
use strata_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::ObjectKind;
use crate::rev::Revision;

/// The declared type of a feature attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    /// Geometry encoded as well-known text.
    Geometry,
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Geometry => "geometry",
        };
        f.write_str(s)
    }
}

/// A single attribute value of a feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Geometry(String),
}

impl Value {
    /// The attribute kind this value satisfies, or `None` for [`Value::Null`].
    pub fn kind(&self) -> Option<AttributeKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(AttributeKind::Bool),
            Self::Int(_) => Some(AttributeKind::Int),
            Self::Float(_) => Some(AttributeKind::Float),
            Self::Text(_) => Some(AttributeKind::Text),
            Self::Bytes(_) => Some(AttributeKind::Bytes),
            Self::Geometry(_) => Some(AttributeKind::Geometry),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Geometry(wkt) => f.write_str(wkt),
        }
    }
}

/// One named, typed column of a feature type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
    pub nullable: bool,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, kind: AttributeKind, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable,
        }
    }
}

/// Schema shared by the features of a layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevFeatureType {
    pub name: String,
    pub attributes: Vec<AttributeDescriptor>,
    /// Coordinate reference system identifier, e.g. `EPSG:4326`.
    pub crs: Option<String>,
}

impl RevFeatureType {
    pub fn new(name: impl Into<String>, attributes: Vec<AttributeDescriptor>) -> Self {
        Self {
            name: name.into(),
            attributes,
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    /// Position of the attribute called `name`.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Check that `values` line up with this schema: same arity, matching
    /// kinds, and nulls only where the attribute is nullable.
    pub fn validate(&self, values: &[Value]) -> StoreResult<()> {
        if values.len() != self.attributes.len() {
            return Err(StoreError::SchemaViolation(format!(
                "{} expects {} values, got {}",
                self.name,
                self.attributes.len(),
                values.len()
            )));
        }
        for (attr, value) in self.attributes.iter().zip(values) {
            match value.kind() {
                None if attr.nullable => {}
                None => {
                    return Err(StoreError::SchemaViolation(format!(
                        "{}.{} is not nullable",
                        self.name, attr.name
                    )))
                }
                Some(kind) if kind != attr.kind => {
                    return Err(StoreError::SchemaViolation(format!(
                        "{}.{} expects {}, got {}",
                        self.name, attr.name, attr.kind, kind
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Revision for RevFeatureType {
    const KIND: ObjectKind = ObjectKind::FeatureType;
}

/// A feature: its schema id plus attribute values in schema order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevFeature {
    pub feature_type: ObjectId,
    pub values: Vec<Value>,
}

impl RevFeature {
    pub fn new(feature_type: ObjectId, values: Vec<Value>) -> Self {
        Self {
            feature_type,
            values,
        }
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

impl Revision for RevFeature {
    const KIND: ObjectKind = ObjectKind::Feature;
}
