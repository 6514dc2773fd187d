use derive_more::Display;
use serde::{
    Deserialize,
    Serialize,
};

/// A machine value type such as `i32`, `f64` or `v4f32`.
///
/// The rule model trusts type references; the only property it ever asks of a type is
/// whether it is floating point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
#[serde(transparent)]
pub struct ValueType(String);

impl ValueType {
    const FLOATING_POINT_ELEMENTS: &'static [&'static str] =
        &["f16", "bf16", "f32", "f64", "f80", "f128", "ppcf128"];

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns true for floating point scalars and for vectors with floating point elements.
    pub fn is_floating_point(&self) -> bool {
        Self::FLOATING_POINT_ELEMENTS.contains(&self.element_name())
    }

    /// Returns the element type name of a vector type (`v4f32` -> `f32`, `nxv2f64` -> `f64`),
    /// or the name itself for scalar types.
    pub fn element_name(&self) -> &str {
        let unscaled = self.0.strip_prefix("nx").unwrap_or(&self.0);
        match unscaled.strip_prefix('v') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                rest.trim_start_matches(|c: char| c.is_ascii_digit())
            }
            _ => &self.0,
        }
    }
}

impl From<&str> for ValueType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
