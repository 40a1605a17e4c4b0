//! Dataplane status codes and selective suppression
//!
//! The numeric meaning of a code belongs to the dataplane service. Callers
//! name the codes they can tolerate on a given call with [`Ignore`]; any
//! other non-zero code becomes a [`StatusError`].

use crate::error::{DataplaneError, Result, StatusError};
use fabric_api::dpservice;
use tracing::debug;

// Codes the dataplane may answer with. Only some are tolerated by callers;
// the rest are listed so errors can be matched by name.
pub const BAD_REQUEST: u32 = 101;
pub const NOT_FOUND: u32 = 201;
pub const ALREADY_EXISTS: u32 = 202;
pub const WRONG_TYPE: u32 = 203;
pub const BAD_IPVER: u32 = 204;
pub const NO_VM: u32 = 205;
pub const NO_VNI: u32 = 206;
pub const OUT_OF_MEMORY: u32 = 208;
pub const LIMIT_REACHED: u32 = 209;
pub const NO_LB: u32 = 215;
pub const NO_BACKIP: u32 = 216;
pub const ROUTE_EXISTS: u32 = 301;
pub const ROUTE_NOT_FOUND: u32 = 302;
pub const ROUTE_INSERT: u32 = 303;

/// Allow-list of backend status codes treated as success for one call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ignore(&'static [u32]);

impl Ignore {
    pub const NONE: Ignore = Ignore(&[]);

    pub const fn codes(codes: &'static [u32]) -> Self {
        Ignore(codes)
    }

    pub fn contains(&self, code: u32) -> bool {
        self.0.contains(&code)
    }
}

/// Convert a response status into a result.
///
/// An absent status is the protobuf default and therefore success.
pub(crate) fn check(status: Option<&dpservice::Status>) -> Result<()> {
    match status {
        Some(status) if status.error != 0 => {
            Err(StatusError::new(status.error, status.message.clone()).into())
        }
        _ => Ok(()),
    }
}

/// Like [`check`], but codes in `ignore` are treated as success
pub(crate) fn check_ignoring(
    operation: &'static str,
    status: Option<&dpservice::Status>,
    ignore: Ignore,
) -> Result<()> {
    match check(status) {
        Err(DataplaneError::Status(err)) if ignore.contains(err.code()) => {
            debug!("Ignoring dataplane status for {}: {}", operation, err);
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(error: u32) -> dpservice::Status {
        dpservice::Status {
            error,
            message: format!("code {}", error),
        }
    }

    #[test]
    fn test_check_success() {
        assert!(check(None).is_ok());
        assert!(check(Some(&status(0))).is_ok());
    }

    #[test]
    fn test_check_converts_non_zero_code() {
        let err = check(Some(&status(ROUTE_EXISTS))).unwrap_err();
        assert_eq!(err.status_code(), Some(ROUTE_EXISTS));
        assert_eq!(err.to_string(), "[error code 301] code 301");
        match err {
            DataplaneError::Status(status) => assert_eq!(status.message(), "code 301"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_check_ignoring_listed_codes() {
        let ignore = Ignore::codes(&[NO_VNI, ROUTE_NOT_FOUND]);
        assert!(check_ignoring("delete route", Some(&status(0)), ignore).is_ok());
        assert!(check_ignoring("delete route", Some(&status(ROUTE_NOT_FOUND)), ignore).is_ok());
        assert!(check_ignoring("delete route", Some(&status(NO_VNI)), ignore).is_ok());

        let err = check_ignoring("delete route", Some(&status(ROUTE_EXISTS)), ignore).unwrap_err();
        assert!(matches!(err, DataplaneError::Status(_)));
        assert_eq!(err.status_code(), Some(ROUTE_EXISTS));
    }

    #[test]
    fn test_ignore_none() {
        assert!(!Ignore::NONE.contains(0));
        assert!(!Ignore::default().contains(ALREADY_EXISTS));
    }
}
