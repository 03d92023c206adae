//! # Credential Generator
//!
//! Produces random passwords from a configurable character set.
//!
//! Every character is an independent, uniform draw from the alphabet. Indices
//! are sampled by rejection over 32-bit values: a draw `v` is only accepted
//! when it falls below the largest multiple of the alphabet size that fits in
//! 2^32, so `v % n` carries no modulo bias.

use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// Uppercase ASCII letters (always included)
pub const CHAR_UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Lowercase ASCII letters (always included)
pub const CHAR_LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
/// Decimal digits (always included)
pub const CHAR_DIGITS: &str = "0123456789";
/// Symbols added when `includeSymbols` is set
pub const CHAR_SYMBOLS: &str = "~!@#$%^&*()_+`-={}|[]\\:\"<>?,./";

/// Longest password the generator will produce
pub const MAX_PASSWORD_LENGTH: usize = 4096;

/// Size of the space each sample is drawn from
const SAMPLE_SPACE: u64 = 1 << 32;

/// Failure of the underlying random source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("secure random source unavailable: {0}")]
pub struct EntropyError(pub String);

impl From<getrandom::Error> for EntropyError {
    fn from(err: getrandom::Error) -> Self {
        Self(err.to_string())
    }
}

/// Errors returned by [`CredentialGenerator::generate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Zero length or empty alphabet. Not retryable without a policy change.
    #[error("invalid generator input: {0}")]
    InvalidInput(String),
    /// The random source failed. Retryable.
    #[error(transparent)]
    EntropySource(#[from] EntropyError),
}

/// Source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync {
    /// Fill `buf` entirely with random bytes
    ///
    /// # Errors
    /// Returns [`EntropyError`] if the source cannot produce bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError>;
}

/// Operating system CSPRNG via `getrandom`
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(buf)?;
        Ok(())
    }
}

/// Alphabet a password is drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSet {
    chars: Vec<u8>,
}

impl CharacterSet {
    /// Build from explicit groups. Non-ASCII bytes are ignored so every
    /// sampled index maps to exactly one character.
    #[must_use]
    pub fn from_groups(groups: &[&str]) -> Self {
        let chars = groups
            .iter()
            .flat_map(|group| group.bytes())
            .filter(u8::is_ascii)
            .collect();
        Self { chars }
    }

    /// Letters and digits, plus [`CHAR_SYMBOLS`] when `include_symbols`
    #[must_use]
    pub fn standard(include_symbols: bool) -> Self {
        if include_symbols {
            Self::from_groups(&[CHAR_UPPER, CHAR_LOWER, CHAR_DIGITS, CHAR_SYMBOLS])
        } else {
            Self::from_groups(&[CHAR_UPPER, CHAR_LOWER, CHAR_DIGITS])
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        u8::try_from(c).is_ok_and(|b| self.chars.contains(&b))
    }
}

/// Freshly generated credential
///
/// Move-only, wiped on drop, and redacted in `Debug`.
pub struct GeneratedSecret(Zeroizing<String>);

impl GeneratedSecret {
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// Borrow the plaintext. Callers must not log or retain it.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for GeneratedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GeneratedSecret").field(&"***").finish()
    }
}

/// Password generator backed by an [`EntropySource`]
pub struct CredentialGenerator {
    entropy: Box<dyn EntropySource>,
}

impl fmt::Debug for CredentialGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGenerator").finish_non_exhaustive()
    }
}

impl Default for CredentialGenerator {
    fn default() -> Self {
        Self::new(OsEntropy)
    }
}

impl CredentialGenerator {
    pub fn new(entropy: impl EntropySource + 'static) -> Self {
        Self {
            entropy: Box::new(entropy),
        }
    }

    /// Generate a password of `length` characters from the standard alphabet.
    ///
    /// # Errors
    /// [`GenerationError::InvalidInput`] for a zero or oversized length,
    /// [`GenerationError::EntropySource`] if the random source fails.
    pub fn generate(
        &self,
        length: usize,
        include_symbols: bool,
    ) -> Result<GeneratedSecret, GenerationError> {
        self.generate_from(&CharacterSet::standard(include_symbols), length)
    }

    /// Generate a password of `length` characters from `charset`.
    ///
    /// # Errors
    /// [`GenerationError::InvalidInput`] for a zero or oversized length or an
    /// empty alphabet, [`GenerationError::EntropySource`] if the random source
    /// fails.
    pub fn generate_from(
        &self,
        charset: &CharacterSet,
        length: usize,
    ) -> Result<GeneratedSecret, GenerationError> {
        if charset.is_empty() || length == 0 {
            return Err(GenerationError::InvalidInput(format!(
                "empty character set or invalid length (alphabet size {}, length {length})",
                charset.len()
            )));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(GenerationError::InvalidInput(format!(
                "length {length} exceeds maximum of {MAX_PASSWORD_LENGTH}"
            )));
        }

        let mut password = Zeroizing::new(String::with_capacity(length));
        for _ in 0..length {
            let index = self.sample_index(charset.len())?;
            password.push(char::from(charset.chars[index]));
        }

        Ok(GeneratedSecret(password))
    }

    /// Uniform index in `[0, n)` by rejection sampling. `n` must be non-zero.
    fn sample_index(&self, n: usize) -> Result<usize, EntropyError> {
        let n = n as u64;
        let zone = SAMPLE_SPACE - SAMPLE_SPACE % n;

        let mut buf = Zeroizing::new([0u8; 4]);
        loop {
            self.entropy.fill(buf.as_mut_slice())?;
            let value = u64::from(u32::from_le_bytes(*buf));
            if value < zone {
                // value % n < n <= usize::MAX
                return Ok((value % n) as usize);
            }
        }
    }
}
