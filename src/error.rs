use std::fmt;
use thiserror::Error as ThisError;

/// Different errors that the application can raise
#[derive(Debug, ThisError)]
pub enum RuntimeError {
    /// Error returned when the parameters are rejected before any remote call
    #[error("invalid experiment parameters: {0}")]
    Validation(#[from] ValidationError),
    /// Error returned when the experiment template cannot be created
    #[error("failed to create experiment template: {0}")]
    CreateTemplate(#[source] RemoteError),
    /// Error returned when the template exists but the experiment did not start.
    /// The template is left in place, start it again with its id.
    #[error("experiment template {template_id} was created but the experiment failed to start: {source}")]
    StartExperiment {
        /// Id of the template that was already created
        template_id: String,
        /// Remote failure of the start call
        #[source]
        source: RemoteError,
    },
    /// Error returned by the STS API while looking up the caller account
    #[error("failed to resolve caller identity: {0}")]
    CallerIdentity(#[from] aws_sdk_sts::Error),
    /// Error returned if the caller identity has no account id
    #[error("caller identity has no account id")]
    MissingAccount,
    /// Error returned if the launch report cannot be serialized
    #[error("failed to serialize launch report")]
    Report(#[from] serde_json::Error),
}

impl RuntimeError {
    /// Template id that already exists when the run failed, if any.
    pub fn created_template_id(&self) -> Option<&str> {
        match self {
            RuntimeError::StartExperiment { template_id, .. } => Some(template_id),
            _ => None,
        }
    }
}

/// Local validation failures, detected before anything is sent to FIS
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ValidationError {
    /// No Lambda function ARN was supplied
    #[error("at least one lambda function arn is required")]
    EmptyTargets,
    /// One of the Lambda function ARNs is blank
    #[error("lambda function arn at position {0} is empty")]
    BlankTarget(usize),
    /// The IAM role ARN is blank
    #[error("role arn is empty")]
    BlankRoleArn,
    /// The action id is blank
    #[error("action id is empty")]
    BlankActionId,
    /// The percentage is outside of [0, 100]
    #[error("percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(i32),
    /// The duration is not an ISO-8601 duration
    #[error("duration {0:?} is not an ISO-8601 duration such as PT2M")]
    InvalidDuration(String),
    /// A tag is not a KEY=VALUE pair
    #[error("tag {0:?} must be a KEY=VALUE pair")]
    InvalidTag(String),
}

/// Remote FIS operation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `CreateExperimentTemplate`
    CreateExperimentTemplate,
    /// `StartExperiment`
    StartExperiment,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateExperimentTemplate => f.write_str("CreateExperimentTemplate"),
            Operation::StartExperiment => f.write_str("StartExperiment"),
        }
    }
}

/// Broad class of a remote failure. None of them are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The caller is not allowed to perform the operation
    Authorization,
    /// The service rejected a role or resource reference
    MalformedReference,
    /// Throttling, internal service errors and transport failures
    Transient,
    /// The service answered without the identifiers we need
    InvalidResponse,
    /// Anything else
    Other,
}

impl RemoteErrorKind {
    /// Classify a remote error code.
    pub fn from_code(code: Option<&str>) -> RemoteErrorKind {
        match code {
            Some(
                "AccessDeniedException"
                | "AccessDenied"
                | "UnauthorizedException"
                | "UnrecognizedClientException"
                | "InvalidClientTokenId"
                | "InvalidSignatureException"
                | "ExpiredTokenException",
            ) => RemoteErrorKind::Authorization,
            Some("ValidationException" | "ResourceNotFoundException") => {
                RemoteErrorKind::MalformedReference
            }
            Some(
                "ThrottlingException"
                | "TooManyRequestsException"
                | "InternalServerException"
                | "InternalFailure"
                | "ServiceUnavailable"
                | "ServiceUnavailableException",
            ) => RemoteErrorKind::Transient,
            _ => RemoteErrorKind::Other,
        }
    }
}

/// Failure reported by the FIS API, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Operation that failed
    pub operation: Operation,
    /// Classified failure
    pub kind: RemoteErrorKind,
    /// Error code returned by the service, if any
    pub code: Option<String>,
    /// Error message returned by the service
    pub message: String,
}

impl RemoteError {
    /// Build an error from a service error code and message.
    pub fn service(operation: Operation, code: Option<String>, message: impl Into<String>) -> Self {
        RemoteError {
            operation,
            kind: RemoteErrorKind::from_code(code.as_deref()),
            code,
            message: message.into(),
        }
    }

    /// Build an error for a request that never got a service answer.
    pub fn transport(operation: Operation, message: impl Into<String>) -> Self {
        RemoteError {
            operation,
            kind: RemoteErrorKind::Transient,
            code: None,
            message: message.into(),
        }
    }

    /// Build an error for a request that could not be built locally.
    pub fn local(operation: Operation, message: impl Into<String>) -> Self {
        RemoteError {
            operation,
            kind: RemoteErrorKind::Other,
            code: None,
            message: message.into(),
        }
    }

    /// Build an error for a successful answer missing a required field.
    pub fn missing_field(operation: Operation, field: &str) -> Self {
        RemoteError {
            operation,
            kind: RemoteErrorKind::InvalidResponse,
            code: None,
            message: format!("response is missing {field}"),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} failed ({}): {}", self.operation, code, self.message),
            None => write!(f, "{} failed: {}", self.operation, self.message),
        }
    }
}

impl std::error::Error for RemoteError {}
