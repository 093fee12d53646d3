use thiserror::Error;

use crate::options::SpecType;

/// Errors produced while building the entity store or mapping schemas.
///
/// [`Error::Decoration`] is the only variant user input can trigger during
/// the build phase; it is reported by [`EntityStore::freeze`](crate::EntityStore::freeze)
/// so a misconfigured model fails before any document is generated.
#[derive(Debug, Error)]
pub enum Error {
    /// Misuse of a model declaration, e.g. a collection without an item type.
    #[error("{decorator}: {message}")]
    Decoration {
        decorator: &'static str,
        message: String,
    },

    /// A class id or name that the store does not know about.
    #[error("unknown class `{0}`")]
    UnknownClass(String),

    /// No mapper is registered under this name, for any spec type.
    #[error("no mapper registered under `{0}`")]
    UnknownMapper(String),

    /// A mapper received arguments of the wrong shape.
    #[error("mapper `{mapper}` received unexpected arguments (expected {expected})")]
    UnexpectedArguments {
        mapper: &'static str,
        expected: &'static str,
    },

    /// A generic label has no binding at the use site (strict mode only).
    #[error("generic label `{label}` of `{class}` has no binding")]
    UnboundGeneric { class: String, label: String },

    /// The requested document kind is not produced for this spec type.
    #[error("{0} documents are not supported by get_spec")]
    UnsupportedSpec(SpecType),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn decoration(decorator: &'static str, message: impl Into<String>) -> Self {
        Self::Decoration {
            decorator,
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
