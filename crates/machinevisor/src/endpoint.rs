//! Server base URL resolution and normalization.
//!
//! Precedence: saved user override > build-time default
//! (`MACHINEVISOR_SERVER_BASE_URL` at compile time) > [`FALLBACK_BASE_URL`].

use url::Url;

use crate::types::{VisorError, VisorResult};

/// Emulator loopback alias for the host machine.
pub const FALLBACK_BASE_URL: &str = "http://10.0.2.2:8000";

/// Base URL baked in at build time, if any.
pub fn build_default_base_url() -> Option<&'static str> {
    option_env!("MACHINEVISOR_SERVER_BASE_URL").filter(|s| !s.trim().is_empty())
}

/// Normalize a user-entered base URL.
///
/// Adds `http://` when no scheme is given and a trailing `/` when missing.
/// Returns an empty string when the input is rejected.
pub fn normalize_base_url(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }

    let mut candidate = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };

    match Url::parse(&candidate) {
        Ok(url) if !url.scheme().trim().is_empty() => {
            if url.host_str().map_or(true, |h| h.trim().is_empty()) {
                return String::new();
            }
        }
        _ => return String::new(),
    }

    if !candidate.ends_with('/') {
        candidate.push('/');
    }
    candidate
}

/// The raw, not yet validated base URL per the precedence rules.
pub fn effective_base_url(saved: Option<&str>) -> String {
    saved
        .filter(|s| !s.trim().is_empty())
        .or_else(|| build_default_base_url())
        .unwrap_or(FALLBACK_BASE_URL)
        .to_string()
}

/// Resolve and normalize the base URL used for the next request.
pub fn resolve_base_url(saved: Option<&str>) -> VisorResult<String> {
    let raw = effective_base_url(saved);
    let normalized = normalize_base_url(&raw);
    if normalized.is_empty() {
        tracing::warn!("Rejected server address: {raw:?}");
        return Err(VisorError::InvalidEndpoint(raw));
    }
    Ok(normalized)
}

/// Join a path onto a normalized base URL.
pub fn endpoint_url(base: &str, path: &str) -> VisorResult<Url> {
    Url::parse(base)
        .and_then(|b| b.join(path))
        .map_err(|_| VisorError::InvalidEndpoint(base.to_string()))
}
