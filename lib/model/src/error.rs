use oxiri::IriParseError;

/// An error in the federation configuration or in the way a query uses it.
///
/// Configuration errors are fatal: they abort a request before any store is contacted.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The schema does not know the requested type.
    #[error("The type '{0}' is not defined in the schema")]
    UnknownType(String),
    /// The type does not declare the requested field.
    #[error("The type '{type_name}' has no field '{field}'")]
    UnknownField {
        /// The type that was searched.
        type_name: String,
        /// The missing field.
        field: String,
    },
    /// The schema does not declare the requested root field.
    #[error("The query field '{0}' is not defined in the schema")]
    UnknownQueryField(String),
    /// The schema does not declare the requested mutation field.
    #[error("The mutation field '{0}' is not defined in the schema")]
    UnknownMutationField(String),
    /// Mutation fields are declared but no service accepts them.
    #[error("Mutation fields require a mutation service")]
    MissingMutationService,
    /// No root field returns the type written by a mutation, so its result cannot be read.
    #[error("No query field returns the type '{0}'")]
    UnreadableType(String),
    /// A field of a type has no service that could answer it.
    #[error("The field '{type_name}.{field}' has no assigned service")]
    UnassignedField {
        /// The type that declares the field.
        type_name: String,
        /// The field without service.
        field: String,
    },
    /// The schema references a service that is not configured.
    #[error("The service '{0}' is not configured")]
    UnknownService(String),
    /// Two services share the same id.
    #[error("The service id '{0}' is used more than once")]
    DuplicateService(String),
    /// An `order` argument with an unsupported value.
    #[error("Invalid order '{0}', expected ASCENDING or DESCENDING")]
    InvalidOrder(String),
    /// A field argument with a value of the wrong shape.
    #[error("Invalid value for argument '{argument}' of field '{field}': {reason}")]
    InvalidArgument {
        /// The field carrying the argument.
        field: String,
        /// The argument name.
        argument: String,
        /// What is wrong with the value.
        reason: String,
    },
    /// A string that should be an IRI is not a valid IRI.
    #[error("Invalid IRI '{iri}': {error}")]
    InvalidIri {
        /// The invalid IRI.
        iri: String,
        /// The parsing error.
        #[source]
        error: IriParseError,
    },
    /// An invalid execution setting.
    #[error("Invalid execution setting: {0}")]
    InvalidExecutionSetting(String),
    /// The configuration document could not be deserialized.
    #[error(transparent)]
    Document(#[from] serde_json::Error),
}

impl ConfigurationError {
    /// Creates an [`Self::InvalidArgument`] error.
    pub fn invalid_argument(
        field: &str,
        argument: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            field: field.to_owned(),
            argument: argument.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Validates that `iri` is an absolute IRI.
pub(crate) fn validate_iri(iri: &str) -> Result<(), ConfigurationError> {
    oxiri::Iri::parse(iri)
        .map(|_| ())
        .map_err(|error| ConfigurationError::InvalidIri {
            iri: iri.to_owned(),
            error,
        })
}
