use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine-readable error codes returned in the API's error body.
///
/// The interesting property of a code is how the session layer must react
/// to it: recoverable codes are resolved by a single token refresh, while
/// terminal codes end the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The access token's exp claim has passed.
    TokenExpired,

    /// The access token failed signature or shape validation.
    TokenInvalid,

    /// The refresh token's exp claim has passed.
    RefreshTokenExpired,

    /// The refresh token failed signature or shape validation.
    RefreshTokenInvalid,

    /// The token's subject no longer maps to an account.
    UserNotFound,

    /// The Google code exchange was rejected upstream.
    GoogleAuthFailed,

    /// The request body failed validation.
    ValidationError,

    /// The server failed internally.
    InternalError,

    /// Any code this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    /// True if a single access-token refresh can resolve this failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorCode::TokenExpired | ErrorCode::TokenInvalid)
    }

    /// True if this failure ends the session: credentials must be cleared
    /// and the client sent back to login.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ErrorCode::RefreshTokenExpired
                | ErrorCode::RefreshTokenInvalid
                | ErrorCode::UserNotFound
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            ErrorCode::TokenInvalid => write!(f, "TOKEN_INVALID"),
            ErrorCode::RefreshTokenExpired => write!(f, "REFRESH_TOKEN_EXPIRED"),
            ErrorCode::RefreshTokenInvalid => write!(f, "REFRESH_TOKEN_INVALID"),
            ErrorCode::UserNotFound => write!(f, "USER_NOT_FOUND"),
            ErrorCode::GoogleAuthFailed => write!(f, "GOOGLE_AUTH_FAILED"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
            ErrorCode::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Error returned when parsing an unrecognized error code string.
#[derive(Debug)]
pub struct ErrorCodeParseError {
    /// The string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for ErrorCodeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown error code: {}", self.invalid_value)
    }
}

impl std::error::Error for ErrorCodeParseError {}

impl FromStr for ErrorCode {
    type Err = ErrorCodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TOKEN_EXPIRED" => Ok(ErrorCode::TokenExpired),
            "TOKEN_INVALID" => Ok(ErrorCode::TokenInvalid),
            "REFRESH_TOKEN_EXPIRED" => Ok(ErrorCode::RefreshTokenExpired),
            "REFRESH_TOKEN_INVALID" => Ok(ErrorCode::RefreshTokenInvalid),
            "USER_NOT_FOUND" => Ok(ErrorCode::UserNotFound),
            "GOOGLE_AUTH_FAILED" => Ok(ErrorCode::GoogleAuthFailed),
            "VALIDATION_ERROR" => Ok(ErrorCode::ValidationError),
            "INTERNAL_ERROR" => Ok(ErrorCode::InternalError),
            _ => Err(ErrorCodeParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization() {
        let code = ErrorCode::TokenExpired;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, r#""TOKEN_EXPIRED""#);

        let code = ErrorCode::RefreshTokenInvalid;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, r#""REFRESH_TOKEN_INVALID""#);
    }

    #[test]
    fn deserialization() {
        let json = r#""TOKEN_INVALID""#;
        let code: ErrorCode = serde_json::from_str(json).unwrap();
        assert_eq!(code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn unrecognized_code_deserializes_to_unknown() {
        let json = r#""QUOTA_EXCEEDED""#;
        let code: ErrorCode = serde_json::from_str(json).unwrap();
        assert_eq!(code, ErrorCode::Unknown);
    }

    #[test]
    fn classification() {
        assert!(ErrorCode::TokenExpired.is_recoverable());
        assert!(ErrorCode::TokenInvalid.is_recoverable());
        assert!(!ErrorCode::TokenExpired.is_terminal());

        assert!(ErrorCode::RefreshTokenExpired.is_terminal());
        assert!(ErrorCode::RefreshTokenInvalid.is_terminal());
        assert!(ErrorCode::UserNotFound.is_terminal());
        assert!(!ErrorCode::RefreshTokenExpired.is_recoverable());

        assert!(!ErrorCode::Unknown.is_recoverable());
        assert!(!ErrorCode::Unknown.is_terminal());
    }

    #[test]
    fn from_str_round_trip() {
        let code: ErrorCode = "USER_NOT_FOUND".parse().unwrap();
        assert_eq!(code, ErrorCode::UserNotFound);
        assert!("NOT_A_CODE".parse::<ErrorCode>().is_err());
    }
}
