use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::Response;
use serde::{Deserialize, Serialize};

/// The response body type used throughout the crate. The hosting loop boxes
/// hyper's `Incoming` into the same shape so handlers see one body type on
/// both sides.
pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Wire shape of [`error`] responses: `{"code": 404, "message": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

/// Build a JSON response: compact serialization, `Content-Type:
/// application/json`. A value that fails to serialize becomes a 500 carrying
/// the generic status text.
pub fn respond_json<T: Serialize>(status: StatusCode, value: &T) -> Response<BoxBody> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(full_body(body))
            .unwrap(),
        Err(e) => {
            tracing::error!("response: json serialization failed: {}", e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            Response::builder()
                .status(status)
                .body(full_body(status.canonical_reason().unwrap_or("error")))
                .unwrap()
        }
    }
}

/// Build a JSON error response with the standard `{code, message}` body.
pub fn error(status: StatusCode, message: &str) -> Response<BoxBody> {
    respond_json(
        status,
        &ApiError {
            code: status.as_u16(),
            message: message.to_string(),
        },
    )
}
