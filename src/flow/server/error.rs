// SPDX-License-Identifier: MIT

//! Mapping of application errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::{EngineError, ErrorInfo, RunFailure};
use crate::flow::error::FlowError;

/// Error returned by API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Workflow '{0}' not found")]
    WorkflowNotFound(String),

    #[error("Workflow '{0}' already exists")]
    WorkflowExists(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Flow(#[from] FlowError),

    /// A run halted; the response carries the partial execution
    #[error("{}", .0.error)]
    Run(Box<RunFailure>),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::WorkflowExists(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Run(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Flow(err) => flow_status(err),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::WorkflowNotFound(_) => "workflow_not_found",
            ApiError::WorkflowExists(_) => "workflow_exists",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Run(failure) => failure.error.kind(),
            ApiError::Flow(FlowError::Engine(err)) => err.kind(),
            ApiError::Flow(FlowError::UnknownKind(_)) => "unknown_kind",
            ApiError::Flow(FlowError::InvalidConfig { .. }) => "invalid_config",
            ApiError::Flow(FlowError::Condition { .. }) => "invalid_condition",
            ApiError::Flow(FlowError::Definition(_))
            | ApiError::Flow(FlowError::Json(_))
            | ApiError::Flow(FlowError::Yaml(_)) => "invalid_definition",
            ApiError::Flow(_) => "internal",
        }
    }

    fn node(&self) -> Option<&str> {
        match self {
            ApiError::Run(failure) => failure.error.node(),
            ApiError::Flow(FlowError::Engine(err)) => err.node(),
            ApiError::Flow(FlowError::InvalidConfig { node, .. })
            | ApiError::Flow(FlowError::Condition { node, .. }) => Some(node),
            _ => None,
        }
    }

    fn info(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind().to_string(),
            node: self.node().map(str::to_string),
            message: self.to_string(),
        }
    }
}

fn engine_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::UnknownNode { .. } => StatusCode::NOT_FOUND,
        EngineError::DuplicateIdentifier { .. } | EngineError::WorkflowLocked { .. } => {
            StatusCode::CONFLICT
        }
        EngineError::CycleDetected { .. } | EngineError::NoEntryPoint => StatusCode::BAD_REQUEST,
        EngineError::NodeFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn flow_status(err: &FlowError) -> StatusCode {
    match err {
        FlowError::Engine(e) => engine_status(e),
        FlowError::UnknownKind(_)
        | FlowError::InvalidConfig { .. }
        | FlowError::Condition { .. }
        | FlowError::Definition(_)
        | FlowError::Json(_)
        | FlowError::Yaml(_) => StatusCode::BAD_REQUEST,
        FlowError::Config(_) | FlowError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let info = self.info();
        if status.is_server_error() {
            log::error!("{}: {}", status, info.message);
        } else {
            log::warn!("{}: {}", status, info.message);
        }

        let body = match self {
            ApiError::Run(failure) => json!({ "error": info, "execution": failure.execution }),
            _ => json!({ "error": info }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self::Flow(FlowError::Engine(err))
    }
}

impl From<RunFailure> for ApiError {
    fn from(failure: RunFailure) -> Self {
        Self::Run(Box::new(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_status_codes() {
        let cases = [
            (EngineError::unknown("x"), StatusCode::NOT_FOUND),
            (EngineError::duplicate("x"), StatusCode::CONFLICT),
            (
                EngineError::WorkflowLocked {
                    workflow: "w".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                EngineError::CycleDetected {
                    path: vec!["a".to_string(), "a".to_string()],
                },
                StatusCode::BAD_REQUEST,
            ),
            (EngineError::NoEntryPoint, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_flow_status_codes() {
        assert_eq!(
            ApiError::from(FlowError::UnknownKind("python".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FlowError::invalid_config("n", "bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::WorkflowNotFound("w".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::WorkflowExists("w".to_string()).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_error_info() {
        let info = ApiError::from(FlowError::invalid_config("n", "bad")).info();
        assert_eq!(info.kind, "invalid_config");
        assert_eq!(info.node.as_deref(), Some("n"));

        let info = ApiError::from(EngineError::unknown("ghost")).info();
        assert_eq!(info.kind, "unknown_node");
        assert_eq!(info.node.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_messages_come_from_display() {
        let err = ApiError::WorkflowNotFound("w".to_string());
        assert_eq!(err.to_string(), "Workflow 'w' not found");
        assert_eq!(err.info().message, err.to_string());
        assert_eq!(err.info().kind, "workflow_not_found");

        let err = ApiError::from(EngineError::unknown("ghost"));
        assert_eq!(err.to_string(), EngineError::unknown("ghost").to_string());
        assert!(std::error::Error::source(&err).is_none());
    }
}
