//! Property schema
//!
//! Every concrete component and entity kind publishes a static table of
//! named properties. Each entry forwards to the kind's ordinary setter, so
//! a write through the table and a direct call leave the object in the same
//! state. Serialization and editor layers use the tables to read and write
//! fields without knowing the concrete type.

use crate::assets::{ResourceError, ResourceProvider};
use crate::foundation::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Type of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// `true` / `false`
    Bool,
    /// Signed integer
    Int,
    /// Floating point
    Float,
    /// Text, also used for resource names and enum variants
    String,
    /// 3D vector, also used for colors
    Vec3,
    /// Rotation
    Quat,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A dynamically typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f32),
    /// String value
    String(String),
    /// Vector value
    Vec3(Vec3),
    /// Rotation value
    Quat(Quat),
}

impl PropertyValue {
    /// Kind of this value
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
            Self::String(_) => PropertyKind::String,
            Self::Vec3(_) => PropertyKind::Vec3,
            Self::Quat(_) => PropertyKind::Quat,
        }
    }

    fn mismatch(&self, expected: PropertyKind) -> PropertyError {
        PropertyError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    /// Read as bool
    pub fn as_bool(&self) -> Result<bool, PropertyError> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(other.mismatch(PropertyKind::Bool)),
        }
    }

    /// Read as integer
    pub fn as_int(&self) -> Result<i64, PropertyError> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(other.mismatch(PropertyKind::Int)),
        }
    }

    /// Read as float; integers are widened
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Result<f32, PropertyError> {
        match self {
            Self::Float(v) => Ok(*v),
            Self::Int(v) => Ok(*v as f32),
            other => Err(other.mismatch(PropertyKind::Float)),
        }
    }

    /// Read as string slice
    pub fn as_str(&self) -> Result<&str, PropertyError> {
        match self {
            Self::String(v) => Ok(v),
            other => Err(other.mismatch(PropertyKind::String)),
        }
    }

    /// Read as vector
    pub fn as_vec3(&self) -> Result<Vec3, PropertyError> {
        match self {
            Self::Vec3(v) => Ok(*v),
            other => Err(other.mismatch(PropertyKind::Vec3)),
        }
    }

    /// Read as rotation
    pub fn as_quat(&self) -> Result<Quat, PropertyError> {
        match self {
            Self::Quat(v) => Ok(*v),
            other => Err(other.mismatch(PropertyKind::Quat)),
        }
    }
}

/// Property access errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    /// No property with this name
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Value has the wrong type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the property holds
        expected: PropertyKind,
        /// Type that was supplied
        found: PropertyKind,
    },

    /// The owner refused the value in its current state
    #[error("Rejected: {0}")]
    Rejected(String),

    /// A named resource could not be resolved
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

/// Services available to property setters
#[derive(Clone, Copy)]
pub struct PropertyContext<'a> {
    /// Resolves resource-name properties
    pub resources: &'a dyn ResourceProvider,
}

impl<'a> PropertyContext<'a> {
    /// Create a context over a resource provider
    pub fn new(resources: &'a dyn ResourceProvider) -> Self {
        Self { resources }
    }
}

/// Getter signature
pub type PropertyGetter<T> = fn(&T) -> PropertyValue;

/// Setter signature
pub type PropertySetter<T> = fn(&mut T, &PropertyValue, &PropertyContext<'_>) -> Result<(), PropertyError>;

/// One entry of a property table
pub struct Property<T: ?Sized> {
    /// Property name
    pub name: &'static str,
    /// Value type
    pub kind: PropertyKind,
    /// Reads the current value
    pub get: PropertyGetter<T>,
    /// Forwards to the owner's setter
    pub set: PropertySetter<T>,
}

impl<T: ?Sized> Property<T> {
    /// Create a table entry
    pub const fn new(name: &'static str, kind: PropertyKind, get: PropertyGetter<T>, set: PropertySetter<T>) -> Self {
        Self { name, kind, get, set }
    }

    /// Name and type of this entry
    pub fn info(&self) -> PropertyInfo {
        PropertyInfo {
            name: self.name,
            kind: self.kind,
        }
    }
}

/// Name and type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Property name
    pub name: &'static str,
    /// Value type
    pub kind: PropertyKind,
}

/// Find a table entry by name
pub fn find<'a, T: ?Sized>(table: &'a [Property<T>], name: &str) -> Option<&'a Property<T>> {
    table.iter().find(|p| p.name == name)
}

/// Read a property through its table
pub fn get<T: ?Sized>(table: &[Property<T>], target: &T, name: &str) -> Result<PropertyValue, PropertyError> {
    find(table, name)
        .map(|p| (p.get)(target))
        .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))
}

/// Write a property through its table
pub fn set<T: ?Sized>(
    table: &[Property<T>],
    target: &mut T,
    name: &str,
    value: &PropertyValue,
    context: &PropertyContext<'_>,
) -> Result<(), PropertyError> {
    let property = find(table, name).ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))?;
    if property.kind != value.kind() && !(property.kind == PropertyKind::Float && value.kind() == PropertyKind::Int) {
        return Err(value.mismatch(property.kind));
    }
    (property.set)(target, value, context)
}

/// Types that publish a static property table
pub trait PropertyTable: Sized + 'static {
    /// The table
    fn property_table() -> &'static [Property<Self>];
}

/// Object-safe access to a property table
pub trait Reflect {
    /// Read a property by name
    fn get_property(&self, name: &str) -> Result<PropertyValue, PropertyError>;

    /// Write a property by name
    fn set_property(&mut self, name: &str, value: &PropertyValue, context: &PropertyContext<'_>) -> Result<(), PropertyError>;

    /// Names and types of every property
    fn property_info(&self) -> Vec<PropertyInfo>;
}

impl<T: PropertyTable> Reflect for T {
    fn get_property(&self, name: &str) -> Result<PropertyValue, PropertyError> {
        get(T::property_table(), self, name)
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue, context: &PropertyContext<'_>) -> Result<(), PropertyError> {
        set(T::property_table(), self, name, value, context)
    }

    fn property_info(&self) -> Vec<PropertyInfo> {
        T::property_table().iter().map(Property::info).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;

    struct Lamp {
        brightness: f32,
    }

    impl Lamp {
        fn set_brightness(&mut self, brightness: f32) -> Result<(), PropertyError> {
            if brightness < 0.0 {
                return Err(PropertyError::Rejected("negative brightness".to_string()));
            }
            self.brightness = brightness;
            Ok(())
        }
    }

    static LAMP_PROPERTIES: [Property<Lamp>; 1] = [Property::<Lamp>::new(
        "Brightness",
        PropertyKind::Float,
        |lamp| PropertyValue::Float(lamp.brightness),
        |lamp, value, _| lamp.set_brightness(value.as_float()?),
    )];

    impl PropertyTable for Lamp {
        fn property_table() -> &'static [Property<Self>] {
            &LAMP_PROPERTIES
        }
    }

    #[test]
    fn test_table_forwards_to_setter() {
        let resources = ResourceManager::new();
        let context = PropertyContext::new(&resources);
        let mut lamp = Lamp { brightness: 1.0 };

        lamp.set_property("Brightness", &PropertyValue::Int(3), &context).unwrap();
        assert_eq!(lamp.get_property("Brightness").unwrap(), PropertyValue::Float(3.0));

        let err = lamp.set_property("Brightness", &PropertyValue::Float(-1.0), &context).unwrap_err();
        assert!(matches!(err, PropertyError::Rejected(_)));
        assert_eq!(lamp.brightness, 3.0);
    }

    #[test]
    fn test_type_mismatch_and_unknown_name() {
        let resources = ResourceManager::new();
        let context = PropertyContext::new(&resources);
        let mut lamp = Lamp { brightness: 1.0 };

        let err = lamp
            .set_property("Brightness", &PropertyValue::Bool(true), &context)
            .unwrap_err();
        assert_eq!(
            err,
            PropertyError::TypeMismatch {
                expected: PropertyKind::Float,
                found: PropertyKind::Bool
            }
        );
        assert!(matches!(lamp.get_property("Color"), Err(PropertyError::UnknownProperty(_))));
        assert_eq!(lamp.property_info()[0].kind, PropertyKind::Float);
    }
}
