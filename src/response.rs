//! Response envelopes shared by handlers and middleware.
//!
//! Success bodies are `{"data": ...}`; failures are
//! `{"error": {"code": ..., "message": ...}}`. Messages are localized, codes
//! are not.

use axum::{
    extract::Query,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// `{"data": T}`
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Message language. Presentation only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    /// Unknown or missing values fall back to English
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("vi") => Locale::Vi,
            _ => Locale::En,
        }
    }

    /// Locale from the `?locale=` parameter of a request URI
    pub fn from_uri(uri: &Uri) -> Self {
        Query::<LocaleQuery>::try_from_uri(uri)
            .map(|Query(query)| query.locale())
            .unwrap_or_default()
    }
}

/// Query parameters that only pick the message language
#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

impl LocaleQuery {
    pub fn locale(&self) -> Locale {
        Locale::parse(self.locale.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    InvalidCredentials,
    InvalidRequestBody,
    Unauthenticated,
    TooManyRequests,
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (ErrorCode::InvalidCredentials, Locale::En) => "Invalid username or password",
            (ErrorCode::InvalidCredentials, Locale::Vi) => {
                "Tên đăng nhập hoặc mật khẩu không đúng"
            }
            (ErrorCode::InvalidRequestBody, Locale::En) => "Request body is invalid",
            (ErrorCode::InvalidRequestBody, Locale::Vi) => "Dữ liệu yêu cầu không hợp lệ",
            (ErrorCode::Unauthenticated, Locale::En) => "Invalid or expired session",
            (ErrorCode::Unauthenticated, Locale::Vi) => {
                "Phiên đăng nhập không hợp lệ hoặc đã hết hạn"
            }
            (ErrorCode::TooManyRequests, Locale::En) => "Too many requests. Please slow down.",
            (ErrorCode::TooManyRequests, Locale::Vi) => {
                "Quá nhiều yêu cầu. Vui lòng thử lại sau."
            }
            (ErrorCode::InternalError, Locale::En) => "Internal server error",
            (ErrorCode::InternalError, Locale::Vi) => "Lỗi máy chủ nội bộ",
        }
    }
}

/// Client-facing error. Detail for operators belongs in logs, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub locale: Locale,
}

impl ApiError {
    pub fn new(code: ErrorCode, locale: Locale) -> Self {
        Self { code, locale }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code,
                message: self.code.message(self.locale),
            },
        };

        (self.code.status(), Json(body)).into_response()
    }
}
