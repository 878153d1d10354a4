//! Traits shared by the letter pipeline.

use super::validation::ValidationErrors;

/// Trait for validating request objects.
pub trait Validator {
    /// Validate the state of the object, collecting every failing field.
    fn validate(&self) -> Result<(), ValidationErrors>;
}
