//! Per-field validation rules.
//!
//! Rules are declared per step, not globally. A field with no declared spec
//! is never validated (valid by absence), which is what permits optional
//! fields to carry no rule set at all. Validation is side-effect free.

use std::collections::BTreeMap;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::fields::parse_optional_decimal;

/// A single constraint on a field's raw input.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// The field must be present and non-blank after trimming.
    Required,
    /// When a value is entered, it must match the pattern.
    Pattern { regex: Regex, message: String },
    /// When a value is entered, it must parse as a number >= the bound.
    Min(Decimal),
    /// When a value is entered, it must parse as a number <= the bound.
    Max(Decimal),
}

/// A field's identifier, display label and rule set within one step.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rules: Vec<FieldRule>,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            rules: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.rules.push(FieldRule::Required);
        self
    }

    /// Adds a pattern rule.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex; step definitions are
    /// compiled-in literals, so this is a programming error.
    pub fn pattern(mut self, pattern: &str, message: &str) -> Self {
        let regex = Regex::new(pattern).expect("field pattern must be a valid regex");
        self.rules.push(FieldRule::Pattern {
            regex,
            message: message.to_string(),
        });
        self
    }

    pub fn min(mut self, bound: Decimal) -> Self {
        self.rules.push(FieldRule::Min(bound));
        self
    }

    pub fn max(mut self, bound: Decimal) -> Self {
        self.rules.push(FieldRule::Max(bound));
        self
    }
}

/// A validation failure for one field, suitable for display next to the
/// offending input. Never sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(spec: &FieldSpec, message: impl Into<String>) -> Self {
        Self {
            field: spec.name.to_string(),
            message: message.into(),
        }
    }
}

/// Checks one field's raw input against its rule set.
///
/// `value` is the raw text as entered, or `None` when the field was never
/// touched. All rules except [`FieldRule::Required`] are skipped for blank
/// input: an optional field left empty is accepted as absent.
pub fn validate_field(spec: &FieldSpec, value: Option<&str>) -> Result<(), FieldError> {
    let entered = value.map(str::trim).filter(|v| !v.is_empty());

    for rule in &spec.rules {
        match rule {
            FieldRule::Required => {
                if entered.is_none() {
                    return Err(FieldError::new(spec, format!("{} is required", spec.label)));
                }
            }
            FieldRule::Pattern { regex, message } => {
                if let Some(v) = entered
                    && !regex.is_match(v)
                {
                    return Err(FieldError::new(spec, message.clone()));
                }
            }
            FieldRule::Min(bound) => {
                if let Some(v) = entered {
                    match parse_optional_decimal(v) {
                        Some(n) if n >= *bound => {}
                        Some(_) => {
                            return Err(FieldError::new(
                                spec,
                                format!("{} must be at least {}", spec.label, bound),
                            ));
                        }
                        None => {
                            return Err(FieldError::new(
                                spec,
                                format!("{} must be a number", spec.label),
                            ));
                        }
                    }
                }
            }
            FieldRule::Max(bound) => {
                if let Some(v) = entered {
                    match parse_optional_decimal(v) {
                        Some(n) if n <= *bound => {}
                        Some(_) => {
                            return Err(FieldError::new(
                                spec,
                                format!("{} must be at most {}", spec.label, bound),
                            ));
                        }
                        None => {
                            return Err(FieldError::new(
                                spec,
                                format!("{} must be a number", spec.label),
                            ));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Runs every rule-bearing field of a step against the raw input map.
///
/// Input keys with no matching spec are ignored. Returns all failures, not
/// just the first one.
pub fn validate_step(
    fields: &[FieldSpec],
    input: &BTreeMap<String, String>,
) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = fields
        .iter()
        .filter_map(|spec| {
            validate_field(spec, input.get(spec.name).map(String::as_str)).err()
        })
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
