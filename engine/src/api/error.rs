use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sdk::errors::{EngineError, ErrorClass, VivaErrorExt};
use serde::Serialize;

/// Error returned by every API handler
#[derive(Debug)]
pub struct ApiError(pub EngineError);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    pub hint: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0.class() {
            ErrorClass::Client => StatusCode::BAD_REQUEST,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorClass::Upstream => StatusCode::BAD_GATEWAY,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(EngineError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("API error: {}", self.0);
        } else {
            tracing::debug!("API error: {}", self.0);
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.code(),
                message: self.0.to_string(),
                hint: self.0.user_hint().to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EngineError::UnsupportedLanguage("xx".into()), StatusCode::BAD_REQUEST),
            (EngineError::SessionNotFound("id".into()), StatusCode::NOT_FOUND),
            (EngineError::LanguageNotFound("la".into()), StatusCode::NOT_FOUND),
            (EngineError::transition("pause", "PAUSED"), StatusCode::CONFLICT),
            (EngineError::NoKeyAvailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                EngineError::AllKeysExhausted {
                    provider: "openai".into(),
                    attempts: 2,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (EngineError::MalformedResponse("x".into()), StatusCode::BAD_GATEWAY),
            (EngineError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }
}
