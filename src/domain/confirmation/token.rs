//! Confirmation token value object.
//!
//! Tokens are one-time bearer credentials for privileged actions, so they are
//! drawn from the operating system CSPRNG and never from a seeded generator.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes in a token (128 bits).
pub const TOKEN_BYTES: usize = 16;

/// Length of the rendered token in hex characters.
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// A single-use confirmation token, rendered as lowercase hex.
///
/// `Debug` output is redacted so tokens do not leak into log lines that
/// format whole structs; `Display` renders the full value for the caller.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    /// Generates a fresh token from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Returns the token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `candidate` has the shape of an issued token.
    ///
    /// Used only to short-circuit obviously malformed input; a well-formed
    /// value still has to be present in a tracker to be redeemed.
    pub fn is_well_formed(candidate: &str) -> bool {
        candidate.len() == TOKEN_HEX_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfirmationToken").field(&"[redacted]").finish()
    }
}

impl AsRef<str> for ConfirmationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
