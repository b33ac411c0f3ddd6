//! CID declaration validation
//!
//! Field constraints are split in two layers:
//!
//! - length limits are declared on the types with `validator` derives
//! - presence rules (non-blank strings, non-blank circumstance tags) are checked here
//!
//! Error messages are prefixed with the field path, e.g.
//! `person_b.policy_number: must not be blank`, and returned sorted so the
//! same declaration always produces the same message.

use validator::{Validate, ValidationErrors};

use crate::accident::AccidentDetails;
use crate::error::CidError;
use crate::person::PersonInfo;
use crate::submission::CidData;

/// Result of CID validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the declaration is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Adds an error to the result
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    /// Merges another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
    }

    /// Converts into `CidError::Validation` when invalid
    pub fn into_result(mut self) -> Result<(), CidError> {
        if self.is_valid {
            return Ok(());
        }
        self.errors.sort();
        self.errors.dedup();
        Err(CidError::Validation(self.errors))
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for CID declarations
pub struct CidValidator;

impl CidValidator {
    /// Validates both drivers and the accident details
    pub fn validate(data: &CidData) -> ValidationResult {
        let mut result = ValidationResult::ok();

        result.merge(Self::validate_person("person_a", &data.person_a));
        result.merge(Self::validate_person("person_b", &data.person_b));
        result.merge(Self::validate_accident("accident_details", &data.accident_details));

        result
    }

    fn validate_person(prefix: &str, person: &PersonInfo) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if let Err(errors) = person.validate() {
            Self::collect(prefix, &errors, &mut result);
        }

        for (field, value) in [
            ("name", &person.name),
            ("surname", &person.surname),
            ("license_plate", &person.license_plate),
            ("policy_number", &person.policy_number),
        ] {
            Self::require_not_blank(prefix, field, value, &mut result);
        }

        result
    }

    fn validate_accident(prefix: &str, accident: &AccidentDetails) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if let Err(errors) = accident.validate() {
            Self::collect(prefix, &errors, &mut result);
        }

        for (field, value) in [
            ("location", &accident.location),
            ("description", &accident.description),
            ("damage_description", &accident.damage_description),
        ] {
            Self::require_not_blank(prefix, field, value, &mut result);
        }

        for (index, tag) in accident.circumstances.iter().enumerate() {
            if tag.trim().is_empty() {
                result.add_error(format!("{prefix}.circumstances[{index}]: must not be blank"));
            }
        }

        result
    }

    fn require_not_blank(prefix: &str, field: &str, value: &str, result: &mut ValidationResult) {
        if value.trim().is_empty() {
            result.add_error(format!("{prefix}.{field}: must not be blank"));
        }
    }

    fn collect(prefix: &str, errors: &ValidationErrors, result: &mut ValidationResult) {
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                result.add_error(format!("{prefix}.{field}: {message}"));
            }
        }
    }
}
