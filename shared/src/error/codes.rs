//! Unified error codes for the dashboard engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Dashboard configuration errors
//! - 4xxx: Widget data errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire so the renderer can switch on it
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Dashboard configuration ====================
    /// Stored configuration could not be read
    ConfigMalformed = 3002,
    /// Persisting a configuration failed
    ConfigSaveFailed = 3003,
    /// Widget catalog could not be loaded
    CatalogUnavailable = 3005,
    /// Catalog item not found
    CatalogItemNotFound = 3006,
    /// Per-user overrides could not be loaded
    OverridesUnavailable = 3008,

    // ==================== 4xxx: Widget data ====================
    /// Widget backend request failed
    WidgetFetchFailed = 4001,
    /// Widget backend returned an unusable payload
    WidgetPayloadInvalid = 4002,
    /// Widget fetch was superseded by a newer resolution
    WidgetFetchCancelled = 4003,
    /// Widget has no data source
    WidgetNoDataSource = 4004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Dashboard configuration
            ErrorCode::ConfigMalformed => "Dashboard configuration is malformed",
            ErrorCode::ConfigSaveFailed => "Failed to save dashboard configuration",
            ErrorCode::CatalogUnavailable => "Widget catalog is unavailable",
            ErrorCode::CatalogItemNotFound => "Catalog item not found",
            ErrorCode::OverridesUnavailable => "User permission overrides are unavailable",

            // Widget data
            ErrorCode::WidgetFetchFailed => "Failed to fetch widget data",
            ErrorCode::WidgetPayloadInvalid => "Widget data payload is invalid",
            ErrorCode::WidgetFetchCancelled => "Widget fetch was superseded",
            ErrorCode::WidgetNoDataSource => "Widget has no data source",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Dashboard configuration
            3002 => Ok(ErrorCode::ConfigMalformed),
            3003 => Ok(ErrorCode::ConfigSaveFailed),
            3005 => Ok(ErrorCode::CatalogUnavailable),
            3006 => Ok(ErrorCode::CatalogItemNotFound),
            3008 => Ok(ErrorCode::OverridesUnavailable),

            // Widget data
            4001 => Ok(ErrorCode::WidgetFetchFailed),
            4002 => Ok(ErrorCode::WidgetPayloadInvalid),
            4003 => Ok(ErrorCode::WidgetFetchCancelled),
            4004 => Ok(ErrorCode::WidgetNoDataSource),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
