#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{EntropySource, OsEntropy, Result, TOKEN_BYTES, Token};

/// Produces fresh discovery tokens.
///
/// Uniqueness is probabilistic: every token carries 128 bits drawn from the
/// entropy source and no coordination happens between generators. The store
/// remains the arbiter of collisions, since namespace creation is
/// create-if-absent.
#[derive(Default, Clone, Debug)]
pub struct TokenGenerator<R = OsEntropy>
where
    R: EntropySource,
{
    rng: R,
}

impl TokenGenerator<OsEntropy> {
    /// Creates a generator reading from the operating system CSPRNG.
    pub fn os() -> Self {
        Self::new(OsEntropy)
    }
}

impl<R> TokenGenerator<R>
where
    R: EntropySource,
{
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Returns a new token.
    ///
    /// # Errors
    /// - [`crate::Error::GenerationFailed`] if the entropy source fails. No
    ///   placeholder token is ever returned in that case.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> Result<Token> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng.try_fill(&mut bytes)?;
        Ok(Token::from_bytes(bytes))
    }
}
