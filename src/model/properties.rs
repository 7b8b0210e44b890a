use std::collections::BTreeMap;

use crate::error::ConfigError;

/// A named property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Double(f64),
    Integer(i64),
    Bool(bool),
    Text(String),
}

/// A bag of named scalar properties, as exposed by the entity model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, PropertyValue>,
}

impl Properties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.set(name, value);
        self
    }

    /// Raw value lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Reads a numeric property. Integers are widened.
    ///
    /// # Errors
    ///
    /// Returns an error if the property exists but is not numeric.
    pub fn double(&self, name: &str) -> Result<Option<f64>, ConfigError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(PropertyValue::Double(v)) => Ok(Some(*v)),
            #[allow(clippy::cast_precision_loss)]
            Some(PropertyValue::Integer(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(type_mismatch(name, "a number", other)),
        }
    }

    /// Reads an integer property. Doubles with an integral value are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the property exists but is not an integer.
    pub fn integer(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(PropertyValue::Integer(v)) => Ok(Some(*v)),
            #[allow(clippy::cast_possible_truncation)]
            Some(PropertyValue::Double(v)) if v.fract() == 0.0 && v.is_finite() => {
                Ok(Some(*v as i64))
            }
            Some(other) => Err(type_mismatch(name, "an integer", other)),
        }
    }

    /// Reads a boolean property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property exists but is not a boolean.
    pub fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(PropertyValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(type_mismatch(name, "a boolean", other)),
        }
    }

    /// Reads a text property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property exists but is not text.
    pub fn text(&self, name: &str) -> Result<Option<&str>, ConfigError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(PropertyValue::Text(v)) => Ok(Some(v.as_str())),
            Some(other) => Err(type_mismatch(name, "text", other)),
        }
    }
}

fn type_mismatch(name: &str, expected: &str, found: &PropertyValue) -> ConfigError {
    ConfigError::InvalidProperty {
        name: name.to_owned(),
        reason: format!("expected {expected}, found {found:?}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads() {
        let props = Properties::new()
            .with("a", PropertyValue::Double(1.5))
            .with("b", PropertyValue::Integer(3))
            .with("c", PropertyValue::Bool(true))
            .with("d", PropertyValue::Text("Relative".into()));
        assert_eq!(props.double("a").unwrap(), Some(1.5));
        assert_eq!(props.double("b").unwrap(), Some(3.0));
        assert_eq!(props.integer("b").unwrap(), Some(3));
        assert_eq!(props.bool("c").unwrap(), Some(true));
        assert_eq!(props.text("d").unwrap(), Some("Relative"));
        assert_eq!(props.double("missing").unwrap(), None);
    }

    #[test]
    fn mismatch_names_property() {
        let props = Properties::new().with("flag", PropertyValue::Text("yes".into()));
        let err = props.bool("flag").unwrap_err();
        assert!(err.to_string().contains("'flag'"));
    }

    #[test]
    fn fractional_double_is_not_integer() {
        let props = Properties::new().with("n", PropertyValue::Double(2.5));
        assert!(props.integer("n").is_err());
    }
}
