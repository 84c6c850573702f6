//! Explicit request validation.
//!
//! Request DTOs implement [`Validate`] and report every failing field at once
//! through [`ValidationOutcome`]; handlers turn an `Invalid` outcome into
//! `ServiceError::ValidationError`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// One rejected field and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "quantity")]
    pub field: String,
    #[schema(example = "must be greater than zero")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<FieldError>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn into_result(self) -> Result<(), ServiceError> {
        match self {
            ValidationOutcome::Valid => Ok(()),
            ValidationOutcome::Invalid(errors) => Err(ServiceError::ValidationError(errors)),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> ValidationOutcome;
}

/// Collects failures while a DTO checks its fields.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn not_blank(&mut self, value: &str, field: &str, max_len: usize) -> &mut Self {
        let trimmed = value.trim();
        self.check(!trimmed.is_empty(), field, "must not be blank");
        self.check(
            trimmed.chars().count() <= max_len,
            field,
            &format!("must be at most {} characters", max_len),
        )
    }

    pub fn optional_len(&mut self, value: Option<&str>, field: &str, max_len: usize) -> &mut Self {
        if let Some(value) = value {
            self.check(
                value.chars().count() <= max_len,
                field,
                &format!("must be at most {} characters", max_len),
            );
        }
        self
    }

    pub fn positive(&mut self, value: Decimal, field: &str) -> &mut Self {
        self.check(value > Decimal::ZERO, field, "must be greater than zero")
    }

    pub fn non_negative(&mut self, value: Decimal, field: &str) -> &mut Self {
        self.check(value >= Decimal::ZERO, field, "must not be negative")
    }

    /// Quantities and costs are stored with four decimal places.
    pub fn max_scale(&mut self, value: Decimal, field: &str) -> &mut Self {
        self.check(
            value.normalize().scale() <= 4,
            field,
            "must have at most 4 decimal places",
        )
    }

    pub fn finish(&mut self) -> ValidationOutcome {
        if self.errors.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(std::mem::take(&mut self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn collects_every_failure() {
        let outcome = Checks::new()
            .not_blank("  ", "name", 10)
            .positive(dec!(0), "quantity")
            .non_negative(dec!(-1), "unit_cost")
            .finish();

        assert_matches!(outcome, ValidationOutcome::Invalid(errors) if errors.len() == 3);
    }

    #[test]
    fn valid_when_nothing_fails() {
        let outcome = Checks::new()
            .not_blank("Main", "name", 10)
            .positive(dec!(1.5), "quantity")
            .max_scale(dec!(1.2500), "quantity")
            .finish();
        assert!(outcome.is_valid());
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn rejects_more_than_four_decimals() {
        let outcome = Checks::new().max_scale(dec!(0.00001), "unit_cost").finish();
        assert_matches!(
            outcome.into_result(),
            Err(ServiceError::ValidationError(errors)) if errors[0].field == "unit_cost"
        );
    }
}
