use thiserror::Error;

use crate::stage::ElementId;

/// Errors raised by the element tree, layout setters and event dispatch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UiError {
    /// A required argument was missing or refers to something it may not
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A setter was given a value outside its accepted range
    #[error("invalid configuration: {name} = {value} ({reason})")]
    InvalidConfig {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    /// The operation exists on the generic element API but this widget manages its children itself
    #[error("unsupported operation `{operation}`, use `{use_instead}` instead")]
    Unsupported {
        operation: &'static str,
        use_instead: &'static str,
    },

    /// The handle does not refer to a live element of this stage
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    /// The element exists but its widget is not of the requested type
    #[error("element {id:?} does not hold a {expected}")]
    WidgetMismatch { id: ElementId, expected: &'static str },

    /// `end()` was called on a delayed-removal list without a matching `begin()`
    #[error("end() called without a matching begin()")]
    NotIterating,

    /// A structural mutation that cannot be deferred was attempted during iteration
    #[error("`{0}` is not allowed while the list is being iterated")]
    StructuralChangeWhileIterating(&'static str),
}

pub type UiResult<T> = Result<T, UiError>;

/// Rejects negative spacing and padding values
pub(crate) fn non_negative(name: &'static str, value: f32) -> UiResult<f32> {
    if value < 0.0 {
        Err(UiError::InvalidConfig {
            name,
            value,
            reason: "must be >= 0",
        })
    } else {
        Ok(value)
    }
}

/// Rejects fractions outside `[0, 1]`
pub(crate) fn unit_interval(name: &'static str, value: f32) -> UiResult<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(UiError::InvalidConfig {
            name,
            value,
            reason: "must be within [0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative("space", 0.0), Ok(0.0));
        assert!(matches!(
            non_negative("space", -1.0),
            Err(UiError::InvalidConfig { name: "space", .. })
        ));
    }

    #[test]
    fn test_unit_interval_bounds() {
        assert!(unit_interval("split", 0.0).is_ok());
        assert!(unit_interval("split", 1.0).is_ok());
        assert!(unit_interval("split", 1.01).is_err());
        assert!(unit_interval("split", -0.01).is_err());
    }

    #[test]
    fn test_messages() {
        let err = UiError::Unsupported {
            operation: "add_element",
            use_instead: "Container::set_element",
        };
        assert_eq!(
            err.to_string(),
            "unsupported operation `add_element`, use `Container::set_element` instead"
        );
    }
}
