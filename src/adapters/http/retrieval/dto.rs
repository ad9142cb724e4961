//! HTTP DTOs for the retrieval endpoints.
//!
//! Query parameters arrive as raw strings so that malformed values surface
//! through the domain's `InvalidRequest` error rather than an extractor
//! rejection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::cycle::MAX_FORECAST_OFFSET_HOURS;
use crate::domain::retrieval::{RetrievalError, SearchDirection};

/// Message returned when `time` is missing or unreadable.
pub const INVALID_TIME_MESSAGE: &str = "Invalid time, expecting ISO 8601 date";

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Query string of `GET /nearest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearestParams {
    /// Requested time, ISO 8601.
    #[serde(default)]
    pub time: Option<String>,
    /// Search limit in hours.
    #[serde(default)]
    pub limit: Option<String>,
    /// `backward` (default) or `forward`.
    #[serde(default)]
    pub direction: Option<String>,
}

impl NearestParams {
    pub fn target(&self) -> Result<DateTime<Utc>, RetrievalError> {
        self.time
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or_else(|| RetrievalError::invalid_request(INVALID_TIME_MESSAGE))
    }

    /// Parsed `limit`, or `default` when the parameter is absent.
    ///
    /// Limits past the largest forecast offset are rejected.
    pub fn limit_hours(&self, default: u32) -> Result<u32, RetrievalError> {
        let raw = match self.limit.as_deref().map(str::trim) {
            None | Some("") => return Ok(default),
            Some(raw) => raw,
        };
        match raw.parse::<u32>() {
            Ok(hours) if hours <= MAX_FORECAST_OFFSET_HOURS => Ok(hours),
            _ => Err(RetrievalError::invalid_request(format!(
                "Invalid limit '{}', expecting a whole number of hours up to {}",
                raw, MAX_FORECAST_OFFSET_HOURS
            ))),
        }
    }

    pub fn direction(&self) -> Result<SearchDirection, RetrievalError> {
        match self.direction.as_deref() {
            None | Some("") => Ok(SearchDirection::default()),
            Some(raw) => raw
                .parse()
                .map_err(|e: crate::domain::foundation::ValidationError| {
                    RetrievalError::invalid_request(e.to_string())
                }),
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC assumed) and `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
