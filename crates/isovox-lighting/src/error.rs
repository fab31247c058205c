use thiserror::Error;

/// Errors raised while configuring light propagation.
#[derive(Debug, Error)]
pub enum LightingError {
    /// The turning cost must be strictly positive and finite or the flood
    /// fill may never terminate.
    #[error("light step cost must be positive and finite, got {0}")]
    NonPositiveStepCost(f32),
}
