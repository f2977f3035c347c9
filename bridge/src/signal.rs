//! Collapse [Error]s into values a string/numeric-only boundary can carry.
//!
//! Three surfaces exist:
//!
//! * **Owned strings** ([owned]): operations that produce bytes return their hex payload on
//!   success or one of the fixed error messages on failure. A message is never returned on
//!   success.
//! * **Constant strings** ([verdict]): verification operations return `"true"`, `"false"`, or
//!   one of the fixed error messages. A proof that fails to verify and a verification that could
//!   not be performed are only distinguishable by the string content, so callers must match on
//!   the exact message rather than on "falsiness".
//! * **Composite codes** ([composite]): loading raw trusted setup points returns a 32-bit value
//!   that is zero on success and otherwise holds the primary [Code] in bits `[0, 16)` and the
//!   [SettingsError] detail (or zero) in bits `[16, 32)`.

use crate::{Code, Error, SettingsError};
use tracing::debug;

/// Returned when an argument is malformed or the trusted setup is not loaded.
pub const INVALID_ARGUMENT: &str = "invalid argument";

/// Returned when memory could not be acquired.
pub const ALLOCATION_FAILURE: &str = "unable to allocate memory";

/// Returned for any other failure.
pub const INTERNAL_ERROR: &str = "internal error";

/// Returned when a proof verifies.
pub const TRUE: &str = "true";

/// Returned when a proof does not verify.
pub const FALSE: &str = "false";

/// Returns the fixed message for a failed [Code] (or `None` for [Code::Ok]).
pub fn message(code: Code) -> Option<&'static str> {
    match code {
        Code::Ok => None,
        Code::BadArguments => Some(INVALID_ARGUMENT),
        Code::AllocationFailure => Some(ALLOCATION_FAILURE),
        Code::InternalError => Some(INTERNAL_ERROR),
    }
}

fn failure(err: &Error) -> &'static str {
    debug!(error = %err, "operation failed");
    message(err.code()).unwrap_or(INTERNAL_ERROR)
}

/// Returns the payload on success or the fixed error message on failure.
pub fn owned(result: Result<String, Error>) -> String {
    match result {
        Ok(payload) => payload,
        Err(err) => failure(&err).to_string(),
    }
}

/// Returns `"true"`/`"false"` on success or the fixed error message on failure.
pub fn verdict(result: Result<bool, Error>) -> &'static str {
    match result {
        Ok(true) => TRUE,
        Ok(false) => FALSE,
        Err(err) => failure(&err),
    }
}

/// Packs a primary code and optional detail into one 32-bit value.
///
/// [Code::Ok] always packs to zero.
pub fn pack(code: Code, detail: Option<SettingsError>) -> u32 {
    if code == Code::Ok {
        return 0;
    }
    let detail = detail.map_or(0, |detail| detail as u32 & 0xFFFF);
    (code as u32) | (detail << 16)
}

/// Splits a 32-bit value produced by [pack] into its primary code and detail.
pub fn unpack(value: u32) -> (Code, Option<SettingsError>) {
    let code = Code::from_u16((value & 0xFFFF) as u16);
    if code == Code::Ok {
        return (code, None);
    }
    (code, SettingsError::from_u16((value >> 16) as u16))
}

/// Returns the composite code for the result of an operation.
pub fn composite<T>(result: &Result<T, Error>) -> u32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            debug!(error = %err, "operation failed");
            pack(err.code(), err.detail())
        }
    }
}

/// Interprets a string returned by [verdict].
pub fn parse_verdict(value: &str) -> Result<bool, Code> {
    match value {
        TRUE => Ok(true),
        FALSE => Ok(false),
        INVALID_ARGUMENT => Err(Code::BadArguments),
        ALLOCATION_FAILURE => Err(Code::AllocationFailure),
        _ => Err(Code::InternalError),
    }
}

/// Returns the [Code] an owned-string result represents ([Code::Ok] for a payload).
pub fn classify(value: &str) -> Code {
    match value {
        INVALID_ARGUMENT => Code::BadArguments,
        ALLOCATION_FAILURE => Code::AllocationFailure,
        INTERNAL_ERROR => Code::InternalError,
        _ => Code::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex;

    #[test]
    fn test_owned() {
        assert_eq!(owned(Ok("AB".to_string())), "AB");
        assert_eq!(owned(Err(Error::Rejected)), INVALID_ARGUMENT);
        assert_eq!(owned(Err(Error::Allocation)), ALLOCATION_FAILURE);
        assert_eq!(owned(Err(Error::Internal)), INTERNAL_ERROR);
        assert_eq!(owned(Err(hex::Error::OddLength(3).into())), INVALID_ARGUMENT);
    }

    #[test]
    fn test_verdict() {
        assert_eq!(verdict(Ok(true)), TRUE);
        assert_eq!(verdict(Ok(false)), FALSE);
        assert_eq!(verdict(Err(Error::NotLoaded)), INVALID_ARGUMENT);
        assert_eq!(verdict(Err(Error::Allocation)), ALLOCATION_FAILURE);
        assert_eq!(verdict(Err(Error::Internal)), INTERNAL_ERROR);
    }

    #[test]
    fn test_parse_verdict() {
        for result in [
            Ok(true),
            Ok(false),
            Err(Code::BadArguments),
            Err(Code::AllocationFailure),
            Err(Code::InternalError),
        ] {
            let value = match result {
                Ok(ok) => verdict(Ok(ok)),
                Err(code) => message(code).unwrap(),
            };
            assert_eq!(parse_verdict(value), result);
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("C0FFEE"), Code::Ok);
        assert_eq!(classify(INVALID_ARGUMENT), Code::BadArguments);
        assert_eq!(classify(ALLOCATION_FAILURE), Code::AllocationFailure);
        assert_eq!(classify(INTERNAL_ERROR), Code::InternalError);
    }

    #[test]
    fn test_pack() {
        assert_eq!(pack(Code::Ok, Some(SettingsError::BadLagrange)), 0);
        assert_eq!(pack(Code::BadArguments, None), 1);
        assert_eq!(
            pack(Code::BadArguments, Some(SettingsError::BadG2MonomialLength)),
            1 | (5 << 16)
        );
        assert_eq!(
            pack(Code::AllocationFailure, Some(SettingsError::BadFk20Init)),
            3 | (12 << 16)
        );
    }

    #[test]
    fn test_unpack() {
        assert_eq!(unpack(0), (Code::Ok, None));
        assert_eq!(unpack(0xFFFF_0000), (Code::Ok, None));
        assert_eq!(unpack(2), (Code::InternalError, None));
        assert_eq!(
            unpack(1 | (9 << 16)),
            (Code::BadArguments, Some(SettingsError::BadLagrange))
        );
        let packed = pack(Code::BadArguments, Some(SettingsError::BadPrecompute));
        assert_eq!(
            unpack(packed),
            (Code::BadArguments, Some(SettingsError::BadPrecompute))
        );
    }

    #[test]
    fn test_composite() {
        assert_eq!(composite(&Ok::<(), Error>(())), 0);
        assert_eq!(composite::<()>(&Err(Error::Rejected)), 1);
        assert_eq!(
            composite::<()>(&Err(Error::Setup(
                Code::BadArguments,
                SettingsError::BadG1Lagrange
            ))),
            1 | (7 << 16)
        );
    }
}
