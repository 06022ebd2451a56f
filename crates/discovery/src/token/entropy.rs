use rand::{TryRngCore, rngs::OsRng};

/// The entropy source could not fill the requested buffer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("entropy source unavailable: {0}")]
pub struct EntropyError(pub String);

/// A trait for sources of random bytes.
///
/// This abstraction allows you to plug in the operating system CSPRNG or a
/// mocked source in tests. Unlike an infallible RNG, implementations must
/// report exhaustion or unavailability instead of handing back zeroed or
/// partial output.
///
/// # Example
/// ```
/// use discovery::{EntropyError, EntropySource};
///
/// struct FixedEntropy;
/// impl EntropySource for FixedEntropy {
///     fn try_fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
///         dest.fill(0xab);
///         Ok(())
///     }
/// }
///
/// let mut buf = [0u8; 4];
/// FixedEntropy.try_fill(&mut buf).unwrap();
/// assert_eq!(buf, [0xab; 4]);
/// ```
pub trait EntropySource {
    /// Fills `dest` entirely with random bytes.
    ///
    /// # Errors
    /// - Returns [`EntropyError`] if the source cannot supply enough bytes.
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// An [`EntropySource`] backed by the operating system CSPRNG.
///
/// This type holds no state; each call reads directly from the OS, so it is
/// freely shareable across threads and tasks.
#[derive(Default, Clone, Copy, Debug)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError(e.to_string()))
    }
}
