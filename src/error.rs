//! Error handling for the decode path.
//!
//! The public contract (see [`crate::decode16`], [`crate::decode32`],
//! [`crate::decode64`]) is a plain `bool`: a single error kind, "decode
//! failed", with no sub-causes surfaced to the caller. Internally, helpers
//! return [`DResult`] so `?` reads the same way `AxResult` does in
//! `axerrno`-based crates; each fallible site additionally logs its specific
//! sub-cause at `trace!` level since decode failure is an expected,
//! high-frequency outcome when scanning arbitrary byte ranges, not a warning
//! condition.

use core::fmt;

/// The single error kind this crate ever returns: the byte sequence does not
/// decode to a valid instruction in the requested mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError;

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("decode failed")
    }
}

pub type DResult<T> = Result<T, DecodeError>;

/// Shorthand mirroring `axerrno`'s `ax_err!` macro: log a `trace!` of the
/// sub-cause, then return `Err(DecodeError)`.
macro_rules! decode_err {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
        return Err($crate::error::DecodeError);
    }};
}

pub(crate) use decode_err;
