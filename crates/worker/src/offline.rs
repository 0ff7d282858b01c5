//! The synthesized response served when neither network nor cache can answer.

use http::StatusCode;
use http::header::{self, HeaderName, HeaderValue};
use pulse_core::Response;
use serde::{Deserialize, Serialize};

/// Marker header distinguishing a synthesized response from a real 503.
pub const OFFLINE_HEADER: &str = "x-sw-offline";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineBody {
    pub error: String,
    pub message: String,
    pub offline: bool,
}

pub fn offline_response(message: &str) -> Response {
    let body = OfflineBody { error: "Offline".to_string(), message: message.to_string(), offline: true };
    let json = serde_json::to_vec(&body).unwrap_or_default();

    Response::new(StatusCode::SERVICE_UNAVAILABLE, json)
        .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .with_header(HeaderName::from_static(OFFLINE_HEADER), HeaderValue::from_static("true"))
}

pub fn is_offline_response(response: &Response) -> bool {
    response.headers.get(OFFLINE_HEADER).is_some_and(|v| v == "true")
}
