//! HTTP status classification.
//!
//! Only 2xx counts as success. Every other registered status becomes an
//! [`Error::Status`]. Codes with no registered meaning are let through
//! without an error, so an unmapped code never fails a call on its own.

use crate::Error;
use http::StatusCode;
use std::fmt;

/// The family a status code belongs to, by its hundreds digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFamily {
    /// 1xx
    Informational,
    /// 2xx
    Success,
    /// 3xx
    Redirection,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// Anything outside 100..=599.
    Unrecognized,
}

impl StatusFamily {
    /// Buckets `code` by `code / 100`.
    pub fn of(code: u16) -> Self {
        match code / 100 {
            1 => StatusFamily::Informational,
            2 => StatusFamily::Success,
            3 => StatusFamily::Redirection,
            4 => StatusFamily::ClientError,
            5 => StatusFamily::ServerError,
            _ => StatusFamily::Unrecognized,
        }
    }
}

impl fmt::Display for StatusFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusFamily::Informational => "informational",
            StatusFamily::Success => "success",
            StatusFamily::Redirection => "redirection",
            StatusFamily::ClientError => "client error",
            StatusFamily::ServerError => "server error",
            StatusFamily::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// The verdict for a single status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOutcome {
    /// The numeric code as returned by the transport.
    pub code: u16,
    /// The family derived from the hundreds digit.
    pub family: StatusFamily,
    /// The registered reason phrase, if the code is a known one.
    pub reason: Option<&'static str>,
}

impl StatusOutcome {
    /// Whether the code is a 2xx.
    pub fn is_success(&self) -> bool {
        self.family == StatusFamily::Success
    }

    /// Whether the code has a registered meaning.
    pub fn is_recognized(&self) -> bool {
        self.reason.is_some()
    }

    /// Converts a failing outcome into an error.
    ///
    /// Returns `None` for 2xx codes and for unrecognized codes; callers treat
    /// both as "no error signal" and go on to decode the body.
    pub fn into_error(self, raw_response: impl Into<String>) -> Option<Error> {
        if self.is_success() || !self.is_recognized() {
            return None;
        }

        let status = StatusCode::from_u16(self.code).ok()?;
        Some(Error::Status {
            status,
            raw_response: raw_response.into(),
        })
    }
}

/// Classifies a numeric status code.
///
/// # Examples
///
/// ```
/// use netcall::status::{classify, StatusFamily};
///
/// let outcome = classify(404);
/// assert_eq!(outcome.family, StatusFamily::ClientError);
/// assert!(!outcome.is_success());
/// assert_eq!(outcome.reason, Some("Not Found"));
/// ```
pub fn classify(code: u16) -> StatusOutcome {
    let reason = StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason());

    StatusOutcome {
        code,
        family: StatusFamily::of(code),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_iff_hundreds_digit_is_two() {
        for code in 0..=1000u16 {
            assert_eq!(classify(code).is_success(), code / 100 == 2, "code {}", code);
        }
    }

    #[test]
    fn test_boundaries() {
        assert!(classify(200).is_success());
        assert!(classify(299).is_success());
        assert!(!classify(199).is_success());
        assert!(!classify(300).is_success());
        assert!(!classify(404).is_success());
        assert!(!classify(500).is_success());
    }

    #[test]
    fn test_families() {
        assert_eq!(classify(101).family, StatusFamily::Informational);
        assert_eq!(classify(204).family, StatusFamily::Success);
        assert_eq!(classify(301).family, StatusFamily::Redirection);
        assert_eq!(classify(429).family, StatusFamily::ClientError);
        assert_eq!(classify(503).family, StatusFamily::ServerError);
        assert_eq!(classify(99).family, StatusFamily::Unrecognized);
        assert_eq!(classify(600).family, StatusFamily::Unrecognized);
    }

    #[test]
    fn test_failing_codes_carry_status() {
        match classify(404).into_error("missing") {
            Some(Error::Status { status, raw_response }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(raw_response, "missing");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }

        let server = classify(500).into_error("").unwrap();
        assert_eq!(server.status(), Some(500));

        let redirect = classify(302).into_error("").unwrap();
        assert_eq!(redirect.status(), Some(302));
    }

    #[test]
    fn test_success_has_no_error() {
        assert!(classify(200).into_error("").is_none());
        assert!(classify(201).into_error("").is_none());
    }

    #[test]
    fn test_unrecognized_codes_pass_through() {
        for code in [199, 299, 499, 599, 600, 999, 42] {
            let outcome = classify(code);
            assert!(!outcome.is_recognized(), "code {}", code);
            assert!(outcome.into_error("").is_none(), "code {}", code);
        }
    }
}
