use oxiri::IriParseError;

/// Error returned while translating between a SPARQL syntax tree and the algebra.
///
/// The message identifies the operator or update form involved and the violated condition.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct AlgebraError {
    #[from]
    kind: AlgebraErrorKind,
}

#[derive(Debug, thiserror::Error)]
enum AlgebraErrorKind {
    #[error("Unknown {family} type {found}")]
    UnexpectedNode { family: &'static str, found: String },
    #[error("The {operator} operator expects {expected} but {found} were given")]
    Arity {
        operator: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("The prefix {0}: has not been declared")]
    UnknownPrefix(String),
    #[error("error while resolving IRI '{iri}': {error}")]
    InvalidIri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    #[error("{0}")]
    Unsupported(String),
}

impl AlgebraError {
    /// A case analysis reached a node it does not know how to handle.
    pub(crate) fn unexpected_node(family: &'static str, found: impl ToString) -> Self {
        AlgebraErrorKind::UnexpectedNode {
            family,
            found: found.to_string(),
        }
        .into()
    }

    pub(crate) fn arity(operator: &'static str, expected: &'static str, found: usize) -> Self {
        AlgebraErrorKind::Arity {
            operator,
            expected,
            found,
        }
        .into()
    }

    pub(crate) fn unknown_prefix(prefix: impl Into<String>) -> Self {
        AlgebraErrorKind::UnknownPrefix(prefix.into()).into()
    }

    pub(crate) fn invalid_iri(iri: String, error: IriParseError) -> Self {
        AlgebraErrorKind::InvalidIri { iri, error }.into()
    }

    /// The input uses a combination of features the translation cannot express.
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        AlgebraErrorKind::Unsupported(msg.into()).into()
    }

    /// Checks if the error has been raised by a malformed construction.
    #[inline]
    pub fn is_arity_error(&self) -> bool {
        matches!(self.kind, AlgebraErrorKind::Arity { .. })
    }

    /// Checks if the error is about an input shape that is valid but not supported.
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.kind,
            AlgebraErrorKind::Unsupported(_)
                | AlgebraErrorKind::UnknownPrefix(_)
                | AlgebraErrorKind::InvalidIri { .. }
        )
    }
}
