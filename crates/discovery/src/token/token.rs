use crate::{Error, Result};
use core::{fmt, str::FromStr};

/// Number of random bytes behind every token.
pub const TOKEN_BYTES: usize = 16;

/// Length of a token's hex encoding.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// An opaque cluster discovery identifier.
///
/// A `Token` is always exactly [`TOKEN_LEN`] lowercase hex characters. The
/// empty string is never a token, so an empty value can't be mistaken for a
/// freshly generated one or be used to address the registry root.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(String);

impl Token {
    /// Encodes raw random bytes as a token.
    pub fn from_bytes(bytes: [u8; TOKEN_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parses a token received from outside the process.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if `s` is empty, has the wrong length, or
    ///   contains anything other than lowercase hex digits.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::invalid_argument("no token given"));
        }
        if s.len() != TOKEN_LEN {
            return Err(Error::invalid_argument(format!(
                "token must be {TOKEN_LEN} characters, got {}",
                s.len()
            )));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(Error::invalid_argument(
                "token must contain only lowercase hex digits",
            ));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
