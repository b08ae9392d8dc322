use crate::adapters::AdapterError;
use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt;

/// Service error codes that signal a temporary condition on the AWS side.
const TRANSIENT_CODES: &[&str] = &[
    "InternalFailure",
    "InternalServerError",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "RequestTimeout",
    "RequestTimeoutException",
    "ServerException",
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "TransactionInProgressException",
];

const NOT_FOUND_CODES: &[&str] = &[
    "ClusterNotFoundException",
    "ResourceNotFoundException",
    "ServiceNotFoundException",
];

/// Maps an AWS service error code onto the adapter taxonomy.
pub fn classify_error_code(code: Option<&str>, message: String) -> AdapterError {
    match code {
        Some(code) if TRANSIENT_CODES.contains(&code) => AdapterError::transient(message),
        Some(code) if NOT_FOUND_CODES.contains(&code) => AdapterError::not_found(message),
        _ => AdapterError::rejected(message),
    }
}

/// Connection-level failures are always worth retrying; service errors go by their code.
pub(crate) fn classify_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> AdapterError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let message = format!("{} failed: {}", operation, DisplayErrorContext(&err));
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            AdapterError::transient(message)
        }
        SdkError::ServiceError(_) => {
            classify_error_code(err.as_service_error().and_then(|e| e.code()), message)
        }
        _ => AdapterError::rejected(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case::throttled(Some("ThrottlingException"), ErrorKind::Transient)]
    #[case::dynamo_capacity(Some("ProvisionedThroughputExceededException"), ErrorKind::Transient)]
    #[case::ecs_server(Some("ServerException"), ErrorKind::Transient)]
    #[case::logs_unavailable(Some("ServiceUnavailableException"), ErrorKind::Transient)]
    #[case::missing_cluster(Some("ClusterNotFoundException"), ErrorKind::NotFound)]
    #[case::missing_resource(Some("ResourceNotFoundException"), ErrorKind::NotFound)]
    #[case::bad_parameter(Some("InvalidParameterException"), ErrorKind::Rejected)]
    #[case::access_denied(Some("AccessDeniedException"), ErrorKind::Rejected)]
    #[case::no_code(None, ErrorKind::Rejected)]
    fn classifies_service_codes(#[case] code: Option<&str>, #[case] expected: ErrorKind) {
        let err = classify_error_code(code, "DescribeServices failed".to_string());

        assert_eq!(err.kind(), expected);
        assert_eq!(err.message(), "DescribeServices failed");
    }
}
