//! Classification of image generator failures.
//!
//! The upstream provider reports prompt refusals only in free-form error text,
//! so the default classifier matches on that text. Anything implementing
//! [`FailureClassifier`] (closures included) can replace it, e.g. one keyed on
//! a structured error code.

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// The provider refused the prompt under its content policy.
    ContentPolicy,
    /// Timeouts, auth, quota, malformed responses and everything else.
    Other,
}

pub trait FailureClassifier: Send + Sync {
    fn classify(&self, err: &Error) -> UpstreamFailure;
}

impl<F> FailureClassifier for F
where
    F: Fn(&Error) -> UpstreamFailure + Send + Sync,
{
    fn classify(&self, err: &Error) -> UpstreamFailure {
        self(err)
    }
}

/// Flags a refusal when the error text carries both a `400 Bad Request`
/// status and the provider's "safety system" marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetySystemClassifier;

impl SafetySystemClassifier {
    pub const STATUS_MARKER: &'static str = "400 Bad Request";
    pub const SAFETY_MARKER: &'static str = "safety system";
}

impl FailureClassifier for SafetySystemClassifier {
    fn classify(&self, err: &Error) -> UpstreamFailure {
        let text = err.to_string();
        if text.contains(Self::STATUS_MARKER) && text.contains(Self::SAFETY_MARKER) {
            UpstreamFailure::ContentPolicy
        } else {
            UpstreamFailure::Other
        }
    }
}
