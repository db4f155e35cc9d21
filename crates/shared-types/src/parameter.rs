//! # Module Parameters
//!
//! Typed, named settings owned by a module. A parameter carries a current
//! value, an optional range and, for choice presentations, a list of
//! labels. The state tracker keeps a replica of every module's parameters.

use crate::errors::MessageError;
use crate::ids::ProcessId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of components of a vector parameter.
pub const MAX_DIMENSION: usize = 4;

/// Value kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    Unknown,
    Integer,
    Float,
    Vector,
    IntVector,
    String,
    Invalid,
}

/// How a parameter should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Presentation {
    #[default]
    Generic,
    Filename,
    Directory,
    ExistingFilename,
    NewFilename,
    Choice,
    Slider,
    Color,
    InvalidPresentation,
}

/// Which part of a parameter a value applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeType {
    #[default]
    Value,
    Minimum,
    Maximum,
}

/// Fixed-capacity vector with a runtime dimension.
///
/// Decoding rejects a dimension above [`MAX_DIMENSION`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawParamVector<T>",
    bound(deserialize = "T: Deserialize<'de> + Copy")
)]
pub struct ParamVector<T> {
    dim: usize,
    v: [T; MAX_DIMENSION],
}

#[derive(Deserialize)]
struct RawParamVector<T> {
    dim: usize,
    v: [T; MAX_DIMENSION],
}

impl<T> TryFrom<RawParamVector<T>> for ParamVector<T> {
    type Error = MessageError;

    fn try_from(raw: RawParamVector<T>) -> Result<Self, Self::Error> {
        if raw.dim > MAX_DIMENSION {
            return Err(MessageError::DimensionOutOfRange {
                dim: raw.dim,
                max: MAX_DIMENSION,
            });
        }
        Ok(Self {
            dim: raw.dim,
            v: raw.v,
        })
    }
}

impl<T: Copy + Default> ParamVector<T> {
    /// Build from up to [`MAX_DIMENSION`] components; extra components are dropped.
    #[must_use]
    pub fn new(values: &[T]) -> Self {
        let dim = values.len().min(MAX_DIMENSION);
        let mut v = [T::default(); MAX_DIMENSION];
        v[..dim].copy_from_slice(&values[..dim]);
        Self { dim, v }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim.min(MAX_DIMENSION)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.v[..self.dim()]
    }

    #[must_use]
    pub fn get(&self, i: usize) -> Option<T> {
        self.as_slice().get(i).copied()
    }
}

impl<T: Copy + Default> Default for ParamVector<T> {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Floating point vector parameter value.
pub type FloatVector = ParamVector<f64>;

/// Integer vector parameter value.
pub type IntVector = ParamVector<i64>;

/// A parameter value of any supported type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Vector(FloatVector),
    IntVector(IntVector),
    String(String),
}

impl ParamValue {
    #[must_use]
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::Integer(_) => ParameterType::Integer,
            Self::Float(_) => ParameterType::Float,
            Self::Vector(_) => ParameterType::Vector,
            Self::IntVector(_) => ParameterType::IntVector,
            Self::String(_) => ParameterType::String,
        }
    }

    /// Zero value of the given type; `None` for `Unknown` and `Invalid`.
    #[must_use]
    pub fn zero(ty: ParameterType) -> Option<Self> {
        match ty {
            ParameterType::Integer => Some(Self::Integer(0)),
            ParameterType::Float => Some(Self::Float(0.0)),
            ParameterType::Vector => Some(Self::Vector(FloatVector::default())),
            ParameterType::IntVector => Some(Self::IntVector(IntVector::default())),
            ParameterType::String => Some(Self::String(String::new())),
            ParameterType::Unknown | ParameterType::Invalid => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Vector(v) => write!(f, "{:?}", v.as_slice()),
            Self::IntVector(v) => write!(f, "{:?}", v.as_slice()),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// A module parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    module: ProcessId,
    name: String,
    description: String,
    group: String,
    presentation: Presentation,
    value: ParamValue,
    default: ParamValue,
    minimum: Option<ParamValue>,
    maximum: Option<ParamValue>,
    choices: Vec<String>,
}

impl Parameter {
    /// New parameter whose default and current value is `value`.
    #[must_use]
    pub fn new(module: ProcessId, name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            module,
            name: name.into(),
            description: String::new(),
            group: String::new(),
            presentation: Presentation::Generic,
            default: value.clone(),
            value,
            minimum: None,
            maximum: None,
            choices: Vec::new(),
        }
    }

    /// New parameter of `ty` holding its zero value.
    #[must_use]
    pub fn of_type(module: ProcessId, name: impl Into<String>, ty: ParameterType) -> Option<Self> {
        ParamValue::zero(ty).map(|v| Self::new(module, name, v))
    }

    #[must_use]
    pub fn module(&self) -> ProcessId {
        self.module
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameter_type(&self) -> ParameterType {
        self.value.parameter_type()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        self.group = group.into();
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn set_presentation(&mut self, presentation: Presentation) {
        self.presentation = presentation;
    }

    #[must_use]
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    #[must_use]
    pub fn default_value(&self) -> &ParamValue {
        &self.default
    }

    /// Value for the requested part of the parameter. An unset range bound
    /// reads as the current value.
    #[must_use]
    pub fn value_for(&self, range: RangeType) -> &ParamValue {
        match range {
            RangeType::Value => &self.value,
            RangeType::Minimum => self.minimum.as_ref().unwrap_or(&self.value),
            RangeType::Maximum => self.maximum.as_ref().unwrap_or(&self.value),
        }
    }

    /// Replace the current value. An initializing set also becomes the default.
    ///
    /// Returns `false` and leaves the parameter untouched on a type mismatch.
    pub fn set_value(&mut self, value: ParamValue, init: bool) -> bool {
        if value.parameter_type() != self.parameter_type() {
            return false;
        }
        if init {
            self.default = value.clone();
        }
        self.value = value;
        true
    }

    pub fn set_minimum(&mut self, value: ParamValue) -> bool {
        if value.parameter_type() != self.parameter_type() {
            return false;
        }
        self.minimum = Some(value);
        true
    }

    pub fn set_maximum(&mut self, value: ParamValue) -> bool {
        if value.parameter_type() != self.parameter_type() {
            return false;
        }
        self.maximum = Some(value);
        true
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn set_choices(&mut self, choices: Vec<String>) {
        self.choices = choices;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_vector_caps_dimension() {
        let v = FloatVector::new(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(v.dim(), MAX_DIMENSION);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v.get(4), None);
    }

    #[test]
    fn test_set_value_rejects_type_mismatch() {
        let mut p = Parameter::new(3, "iso", ParamValue::Float(0.5));
        assert!(!p.set_value(ParamValue::Integer(2), false));
        assert_eq!(p.value(), &ParamValue::Float(0.5));
    }

    #[test]
    fn test_init_updates_default() {
        let mut p = Parameter::new(3, "steps", ParamValue::Integer(1));
        assert!(p.set_value(ParamValue::Integer(4), false));
        assert_eq!(p.default_value(), &ParamValue::Integer(1));
        assert!(p.set_value(ParamValue::Integer(9), true));
        assert_eq!(p.default_value(), &ParamValue::Integer(9));
    }

    #[test]
    fn test_range_falls_back_to_value() {
        let mut p = Parameter::new(3, "steps", ParamValue::Integer(5));
        assert_eq!(p.value_for(RangeType::Minimum), &ParamValue::Integer(5));
        assert!(p.set_minimum(ParamValue::Integer(1)));
        assert_eq!(p.value_for(RangeType::Minimum), &ParamValue::Integer(1));
    }

    #[test]
    fn test_of_type() {
        assert!(Parameter::of_type(1, "x", ParameterType::Unknown).is_none());
        let p = Parameter::of_type(1, "x", ParameterType::IntVector).unwrap();
        assert_eq!(p.parameter_type(), ParameterType::IntVector);
    }
}
