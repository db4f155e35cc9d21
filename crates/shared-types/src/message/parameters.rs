//! Parameter announcement and update payloads.

use super::{ChoiceLabel, DescriptionText, ModuleName, ParamName, ParamString};
use crate::errors::MessageError;
use crate::ids::ProcessId;
use crate::parameter::{
    FloatVector, IntVector, ParamValue, Parameter, ParameterType, Presentation, RangeType,
};
use crate::MAX_CHOICES;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// A module created a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddParameter {
    pub name: ParamName,
    pub group: ParamName,
    pub module_name: ModuleName,
    pub description: DescriptionText,
    pub parameter_type: ParameterType,
    pub presentation: Presentation,
}

impl AddParameter {
    #[must_use]
    pub fn new(param: &Parameter, module_name: &str) -> Self {
        Self {
            name: ParamName::new(param.name()),
            group: ParamName::new(param.group()),
            module_name: ModuleName::new(module_name),
            description: DescriptionText::new(param.description()),
            parameter_type: param.parameter_type(),
            presentation: param.presentation(),
        }
    }

    /// Rebuild an empty parameter of the announced type for `module`.
    pub fn parameter(&self, module: ProcessId) -> Result<Parameter, MessageError> {
        let Some(mut param) = Parameter::of_type(module, self.name.as_str(), self.parameter_type)
        else {
            error!(
                module = %self.module_name,
                parameter = %self.name,
                parameter_type = ?self.parameter_type,
                "AddParameter: type not handled"
            );
            return Err(MessageError::UnsupportedParameterType(self.parameter_type));
        };
        param.set_description(self.description.as_str());
        param.set_group(self.group.as_str());
        param.set_presentation(self.presentation);
        Ok(param)
    }

    pub(super) fn truncated(&self) -> bool {
        self.name.is_truncated()
            || self.group.is_truncated()
            || self.module_name.is_truncated()
            || self.description.is_truncated()
    }
}

/// Inline form of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WireValue {
    Integer(i64),
    Float(f64),
    Vector(FloatVector),
    IntVector(IntVector),
    String(ParamString),
}

impl WireValue {
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

    #[must_use]
    pub fn to_value(&self) -> ParamValue {
        match self {
            Self::Integer(v) => ParamValue::Integer(*v),
            Self::Float(v) => ParamValue::Float(*v),
            Self::Vector(v) => ParamValue::Vector(*v),
            Self::IntVector(v) => ParamValue::IntVector(*v),
            Self::String(v) => ParamValue::String(v.as_str().to_string()),
        }
    }
}

impl From<&ParamValue> for WireValue {
    fn from(value: &ParamValue) -> Self {
        match value {
            ParamValue::Integer(v) => Self::Integer(*v),
            ParamValue::Float(v) => Self::Float(*v),
            ParamValue::Vector(v) => Self::Vector(*v),
            ParamValue::IntVector(v) => Self::IntVector(*v),
            ParamValue::String(v) => Self::String(ParamString::new(v)),
        }
    }
}

/// Set one part (value, minimum or maximum) of a module parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetParameter {
    pub module: ProcessId,
    pub name: ParamName,
    value: WireValue,
    range: RangeType,
    init: bool,
    reply: bool,
}

impl SetParameter {
    /// Set the current value of `name` on `module`.
    #[must_use]
    pub fn new(module: ProcessId, name: &str, value: &ParamValue) -> Self {
        Self {
            module,
            name: ParamName::new(name),
            value: WireValue::from(value),
            range: RangeType::Value,
            init: false,
            reply: false,
        }
    }

    /// Carry `range` of an existing parameter.
    #[must_use]
    pub fn from_parameter(module: ProcessId, param: &Parameter, range: RangeType) -> Self {
        let mut msg = Self::new(module, param.name(), param.value_for(range));
        msg.range = range;
        msg
    }

    #[must_use]
    pub fn integer(module: ProcessId, name: &str, v: i64) -> Self {
        Self::new(module, name, &ParamValue::Integer(v))
    }

    #[must_use]
    pub fn float(module: ProcessId, name: &str, v: f64) -> Self {
        Self::new(module, name, &ParamValue::Float(v))
    }

    #[must_use]
    pub fn vector(module: ProcessId, name: &str, v: FloatVector) -> Self {
        Self::new(module, name, &ParamValue::Vector(v))
    }

    #[must_use]
    pub fn int_vector(module: ProcessId, name: &str, v: IntVector) -> Self {
        Self::new(module, name, &ParamValue::IntVector(v))
    }

    #[must_use]
    pub fn string(module: ProcessId, name: &str, v: &str) -> Self {
        Self::new(module, name, &ParamValue::String(v.to_string()))
    }

    /// Mark as the initial value, which also becomes the default.
    pub fn set_init(&mut self) {
        self.init = true;
    }

    #[must_use]
    pub fn is_initialization(&self) -> bool {
        self.init
    }

    /// Mark as the owning module's confirmation of a change.
    pub fn set_reply(&mut self) {
        self.reply = true;
    }

    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.reply
    }

    pub fn set_range_type(&mut self, range: RangeType) {
        self.range = range;
    }

    #[must_use]
    pub fn range_type(&self) -> RangeType {
        self.range
    }

    #[must_use]
    pub fn parameter_type(&self) -> ParameterType {
        self.value.parameter_type()
    }

    #[must_use]
    pub fn value(&self) -> ParamValue {
        self.value.to_value()
    }

    #[must_use]
    pub fn integer_value(&self) -> Option<i64> {
        match self.value {
            WireValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn float_value(&self) -> Option<f64> {
        match self.value {
            WireValue::Float(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            WireValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Apply to `param`. A type mismatch is logged and rejected.
    pub fn apply(&self, param: &mut Parameter) -> bool {
        if self.parameter_type() != param.parameter_type() {
            warn!(
                module = param.module(),
                parameter = param.name(),
                expected = ?param.parameter_type(),
                found = ?self.parameter_type(),
                "SetParameter::apply: type mismatch"
            );
            return false;
        }
        let value = self.value();
        match (self.range, &self.value) {
            (RangeType::Value, _) => param.set_value(value, self.init),
            // strings carry no range
            (_, WireValue::String(_)) => true,
            (RangeType::Minimum, _) => param.set_minimum(value),
            (RangeType::Maximum, _) => param.set_maximum(value),
        }
    }

    pub(super) fn truncated(&self) -> bool {
        self.name.is_truncated() || matches!(&self.value, WireValue::String(s) if s.is_truncated())
    }
}

/// Replace the choice labels of a choice parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetParameterChoices {
    pub module: ProcessId,
    pub name: ParamName,
    num_choices: u32,
    list_truncated: bool,
    choices: [ChoiceLabel; MAX_CHOICES],
}

impl SetParameterChoices {
    /// Build from `choices`; anything past [`MAX_CHOICES`] is dropped with a warning.
    #[must_use]
    pub fn new<S: AsRef<str>>(module: ProcessId, name: &str, choices: &[S]) -> Self {
        let list_truncated = choices.len() > MAX_CHOICES;
        if list_truncated {
            warn!(
                module,
                parameter = name,
                requested = choices.len(),
                max = MAX_CHOICES,
                "SetParameterChoices: maximum number of choices exceeded, truncating"
            );
        }
        let mut labels = [ChoiceLabel::default(); MAX_CHOICES];
        for (slot, choice) in labels.iter_mut().zip(choices) {
            *slot = ChoiceLabel::new(choice.as_ref());
        }
        Self {
            module,
            name: ParamName::new(name),
            num_choices: choices.len().min(MAX_CHOICES) as u32,
            list_truncated,
            choices: labels,
        }
    }

    #[must_use]
    pub fn num_choices(&self) -> usize {
        (self.num_choices as usize).min(MAX_CHOICES)
    }

    pub fn choices(&self) -> impl Iterator<Item = &str> {
        self.choices[..self.num_choices()].iter().map(|c| c.as_str())
    }

    /// Were choices dropped to fit the message?
    #[must_use]
    pub fn list_truncated(&self) -> bool {
        self.list_truncated
    }

    /// Apply to an integer or string parameter presented as a choice.
    pub fn apply(&self, param: &mut Parameter) -> bool {
        if !matches!(
            param.parameter_type(),
            ParameterType::Integer | ParameterType::String
        ) {
            warn!(
                module = param.module(),
                parameter = param.name(),
                "SetParameterChoices::apply: parameter type not compatible with choice"
            );
            return false;
        }
        if param.presentation() != Presentation::Choice {
            warn!(
                module = param.module(),
                parameter = param.name(),
                "SetParameterChoices::apply: parameter presentation is not Choice"
            );
            return false;
        }
        param.set_choices(self.choices().map(str::to_string).collect());
        true
    }

    pub(super) fn truncated(&self) -> bool {
        self.list_truncated
            || self.name.is_truncated()
            || self.choices[..self.num_choices()]
                .iter()
                .any(|c| c.is_truncated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_fresh(value: ParamValue) -> ParamValue {
        let msg = SetParameter::new(9, "p", &value);
        let mut param = Parameter::of_type(9, "p", value.parameter_type()).unwrap();
        assert!(msg.apply(&mut param));
        param.value().clone()
    }

    #[test]
    fn test_apply_reproduces_value_per_type() {
        let values = [
            ParamValue::Integer(42),
            ParamValue::Float(2.5),
            ParamValue::Vector(FloatVector::new(&[1.0, 2.0, 3.0])),
            ParamValue::IntVector(IntVector::new(&[4, 5])),
            ParamValue::String("viridis".to_string()),
        ];
        for value in values {
            assert_eq!(apply_fresh(value.clone()), value);
        }
    }

    #[test]
    fn test_apply_type_mismatch_rejected() {
        let msg = SetParameter::float(9, "p", 1.0);
        let mut param = Parameter::new(9, "p", ParamValue::Integer(3));
        assert!(!msg.apply(&mut param));
        assert_eq!(param.value(), &ParamValue::Integer(3));
    }

    #[test]
    fn test_apply_range() {
        let mut param = Parameter::new(9, "p", ParamValue::Integer(3));
        let mut msg = SetParameter::integer(9, "p", 10);
        msg.set_range_type(RangeType::Maximum);
        assert!(msg.apply(&mut param));
        assert_eq!(param.value(), &ParamValue::Integer(3));
        assert_eq!(param.value_for(RangeType::Maximum), &ParamValue::Integer(10));
    }

    #[test]
    fn test_init_flag_sets_default() {
        let mut param = Parameter::new(9, "p", ParamValue::Integer(3));
        let mut msg = SetParameter::integer(9, "p", 7);
        msg.set_init();
        assert!(msg.apply(&mut param));
        assert_eq!(param.default_value(), &ParamValue::Integer(7));
    }

    #[test]
    fn test_from_parameter_carries_range() {
        let mut param = Parameter::new(9, "p", ParamValue::Float(0.5));
        param.set_minimum(ParamValue::Float(-1.0));
        let msg = SetParameter::from_parameter(9, &param, RangeType::Minimum);
        assert_eq!(msg.range_type(), RangeType::Minimum);
        assert_eq!(msg.float_value(), Some(-1.0));
    }

    #[test]
    fn test_choices_truncated_to_max() {
        let labels: Vec<String> = (0..40).map(|i| format!("choice{i}")).collect();
        let msg = SetParameterChoices::new(9, "mode", &labels);
        assert_eq!(msg.num_choices(), MAX_CHOICES);
        assert!(msg.list_truncated());
        assert!(msg.truncated());

        let mut param = Parameter::new(9, "mode", ParamValue::Integer(0));
        param.set_presentation(Presentation::Choice);
        assert!(msg.apply(&mut param));
        assert_eq!(param.choices().len(), MAX_CHOICES);
        assert_eq!(param.choices()[31], "choice31");
    }

    #[test]
    fn test_choices_require_choice_presentation() {
        let msg = SetParameterChoices::new(9, "mode", &["a", "b"]);
        let mut param = Parameter::new(9, "mode", ParamValue::Integer(0));
        assert!(!msg.apply(&mut param));

        let mut float_param = Parameter::new(9, "mode", ParamValue::Float(0.0));
        float_param.set_presentation(Presentation::Choice);
        assert!(!msg.apply(&mut float_param));
    }

    #[test]
    fn test_add_parameter_rebuilds() {
        let mut param = Parameter::new(3, "isovalue", ParamValue::Float(0.0));
        param.set_description("threshold");
        param.set_presentation(Presentation::Slider);
        let msg = AddParameter::new(&param, "IsoSurface");
        let rebuilt = msg.parameter(3).unwrap();
        assert_eq!(rebuilt.parameter_type(), ParameterType::Float);
        assert_eq!(rebuilt.description(), "threshold");
        assert_eq!(rebuilt.presentation(), Presentation::Slider);
    }
}
