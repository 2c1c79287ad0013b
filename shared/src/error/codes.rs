//! Unified error codes for the kitchen platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: User errors
//! - 4xxx: Cart / order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu and review errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the web client can
/// switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// No credentials were presented
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is malformed or its signature does not verify
    TokenInvalid = 1004,
    /// Token could not be signed (secret unavailable)
    TokenSigningFailed = 1008,

    // ==================== 2xxx: Permission ====================
    /// Caller may not act on this resource
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: User ====================
    /// User not found
    UserNotFound = 3001,

    // ==================== 4xxx: Cart / Order ====================
    /// Cart item not found
    CartItemNotFound = 4001,
    /// Payment references no cart items
    CartEmpty = 4002,
    /// A payment with this transaction id is already recorded
    PaymentAlreadyRecorded = 4003,
    /// Payment recorded but some referenced cart items were not removed
    SettlementIncomplete = 4004,

    // ==================== 5xxx: Payment ====================
    /// Amount is not a positive number
    PaymentInvalidAmount = 5002,
    /// Payment processor rejected the request or is unreachable
    PaymentProcessorError = 5003,

    // ==================== 6xxx: Menu / Review ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item has an invalid price
    MenuItemInvalidPrice = 6002,
    /// Review rating out of range
    ReviewInvalidRating = 6101,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::RequiredField => "Required field missing",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::TokenSigningFailed => "Token could not be issued",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Admin role required",

            // User
            ErrorCode::UserNotFound => "User not found",

            // Cart / Order
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::CartEmpty => "Payment references no cart items",
            ErrorCode::PaymentAlreadyRecorded => "Payment already recorded",
            ErrorCode::SettlementIncomplete => "Payment recorded with incomplete cart cleanup",

            // Payment
            ErrorCode::PaymentInvalidAmount => "Invalid payment amount",
            ErrorCode::PaymentProcessorError => "Payment processor error",

            // Menu / Review
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemInvalidPrice => "Menu item price must be positive",
            ErrorCode::ReviewInvalidRating => "Rating must be between 0 and 5",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
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
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1008 => Ok(ErrorCode::TokenSigningFailed),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // User
            3001 => Ok(ErrorCode::UserNotFound),

            // Cart / Order
            4001 => Ok(ErrorCode::CartItemNotFound),
            4002 => Ok(ErrorCode::CartEmpty),
            4003 => Ok(ErrorCode::PaymentAlreadyRecorded),
            4004 => Ok(ErrorCode::SettlementIncomplete),

            // Payment
            5002 => Ok(ErrorCode::PaymentInvalidAmount),
            5003 => Ok(ErrorCode::PaymentProcessorError),

            // Menu / Review
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemInvalidPrice),
            6101 => Ok(ErrorCode::ReviewInvalidRating),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
