//! Provenance wrapper for neutral-default results
//!
//! Indicator functions never fail on malformed input; they return a result
//! of the usual shape carrying neutral values. This wrapper keeps that
//! contract while letting callers tell "computed and happens to be neutral"
//! apart from "input was unusable, this is the documented default".

use serde::{Deserialize, Serialize};

/// A value that was either genuinely computed or substituted as a neutral
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Computed<T> {
    /// Computed from valid input
    Value(T),
    /// Neutral default substituted for malformed or empty input
    Neutral(T),
}

impl<T> Computed<T> {
    /// The inner value, regardless of provenance.
    pub fn value(&self) -> &T {
        match self {
            Self::Value(v) | Self::Neutral(v) => v,
        }
    }

    /// Consume the wrapper, keeping the inner value.
    pub fn into_value(self) -> T {
        match self {
            Self::Value(v) | Self::Neutral(v) => v,
        }
    }

    /// True when the value is a substituted default.
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral(_))
    }

    /// Map the inner value, preserving provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Computed<U> {
        match self {
            Self::Value(v) => Computed::Value(f(v)),
            Self::Neutral(v) => Computed::Neutral(f(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_survives_map() {
        let neutral = Computed::Neutral(50.0).map(|v| v / 2.0);
        assert!(neutral.is_neutral());
        assert_eq!(*neutral.value(), 25.0);

        let computed = Computed::Value(50.0).map(|v| v / 2.0);
        assert!(!computed.is_neutral());
    }
}
