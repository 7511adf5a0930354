//! Response relay: status mapping, body decoding and error redaction.

use crate::config::NotFoundHint;
use crate::connection::UpstreamResponse;
use crate::error::{Result, ToolError};
use base64::Engine as _;
use mime::Mime;
use serde_json::{Value, json};
use url::Url;

/// Map a non-2xx response onto the error taxonomy. 2xx responses pass through.
///
/// # Errors
///
/// `AuthenticationFailed` for 401/403, `NotFound` for 404 (with `hint`), `RateLimited` for 429
/// and `Upstream` for any other non-success status.
pub fn check_status(
    response: UpstreamResponse,
    hint: Option<&NotFoundHint>,
) -> Result<UpstreamResponse> {
    if response.status.is_success() {
        return Ok(response);
    }

    let status = response.status.as_u16();
    let body = body_value(&response);
    Err(match status {
        401 | 403 => ToolError::AuthenticationFailed { status, body },
        404 => ToolError::NotFound {
            status: Some(status),
            body,
            hint: hint.cloned(),
        },
        429 => ToolError::RateLimited { status, body },
        _ => ToolError::Upstream {
            status: Some(status),
            message: format!(
                "upstream returned {status} {}",
                response.status.canonical_reason().unwrap_or("Unknown")
            ),
            body: Some(body),
        },
    })
}

/// Decode a body: JSON when it parses, text when it is UTF-8, a base64 object otherwise.
#[must_use]
pub fn body_value(response: &UpstreamResponse) -> Value {
    if response.bytes.is_empty() {
        return Value::Null;
    }
    match std::str::from_utf8(&response.bytes) {
        Ok(s) => serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string())),
        Err(_) => json!({
            "encoding": "base64",
            "mimeType": response.content_type,
            "data": base64::engine::general_purpose::STANDARD.encode(&response.bytes),
        }),
    }
}

/// Body as text, lossy for non-UTF-8 payloads.
#[must_use]
pub fn body_text(response: &UpstreamResponse) -> String {
    String::from_utf8_lossy(&response.bytes).into_owned()
}

/// Asset envelope for binary downloads.
#[must_use]
pub fn asset_value(response: &UpstreamResponse, filename: &str) -> Value {
    let content_type = response
        .content_type
        .as_deref()
        .and_then(|ct| ct.parse::<Mime>().ok())
        .map_or_else(
            || "application/octet-stream".to_string(),
            |m| m.essence_str().to_string(),
        );
    json!({
        "content": base64::engine::general_purpose::STANDARD.encode(&response.bytes),
        "encoding": "base64",
        "content_type": content_type,
        "filename": filename,
        "size": response.bytes.len(),
    })
}

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Error text with any URL stripped of credentials and query string.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
#[must_use]
pub fn encode_component(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}
