use super::ObjectType;

/// Raised when serialized bytes do not describe a well formed object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    #[error("Unrecognized Object type: {0}")]
    UnrecognizedObjectType(String),

    #[error("Malformed {object} object: missing {field}")]
    MissingField {
        object: &'static str,
        field: &'static str,
    },

    #[error("Malformed {object} object: invalid {field} `{value}`")]
    InvalidField {
        object: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Malformed blob object: size declares {declared} bytes but {actual} follow")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("Not a valid object name: `{0}`")]
    InvalidSha(String),

    #[error("Expected a {expected} object but found a {found}")]
    TypeMismatch {
        expected: ObjectType,
        found: ObjectType,
    },
}

impl ObjectError {
    /// The name of the field that failed to parse.
    pub fn field(&self) -> &'static str {
        match self {
            ObjectError::UnrecognizedObjectType(_) | ObjectError::TypeMismatch { .. } => "type",
            ObjectError::MissingField { field, .. } | ObjectError::InvalidField { field, .. } => {
                field
            }
            ObjectError::SizeMismatch { .. } => "size",
            ObjectError::InvalidSha(_) => "digest",
        }
    }

    pub(crate) fn missing(object: &'static str, field: &'static str) -> Self {
        ObjectError::MissingField { object, field }
    }

    pub(crate) fn invalid(object: &'static str, field: &'static str, value: &[u8]) -> Self {
        ObjectError::InvalidField {
            object,
            field,
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}
