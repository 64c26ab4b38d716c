//! Credential Verifier
//! Mission: Compare presented passwords against stored bcrypt hashes

use bcrypt::BcryptError;
use thiserror::Error;

/// Outcome of a failed verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The password does not reproduce the stored hash.
    #[error("credential mismatch")]
    Mismatch,
    /// Anything else: malformed hash, unsupported cost, bcrypt failure.
    #[error("verifier fault: {0}")]
    VerifierFault(String),
}

impl From<BcryptError> for CredentialError {
    fn from(err: BcryptError) -> Self {
        CredentialError::VerifierFault(err.to_string())
    }
}

/// Verify `presented` against `stored_hash`.
///
/// Cost and salt come from the stored hash. The final comparison is bcrypt's
/// constant-time one.
pub fn verify_password(stored_hash: &str, presented: &str) -> Result<(), CredentialError> {
    if bcrypt::verify(presented, stored_hash)? {
        Ok(())
    } else {
        Err(CredentialError::Mismatch)
    }
}

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, CredentialError> {
    Ok(bcrypt::hash(plain, cost)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the tests fast
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_then_verify_succeeds() {
        for password in ["correct-secret", "pässwörd", " ", "a-much-longer-passphrase-with-spaces in it"] {
            let hash = hash_password(password, TEST_COST).unwrap();
            assert_eq!(verify_password(&hash, password), Ok(()));
        }
    }

    #[test]
    fn test_wrong_password_is_mismatch() {
        let hash = hash_password("correct-secret", TEST_COST).unwrap();
        assert_eq!(
            verify_password(&hash, "wrong-secret"),
            Err(CredentialError::Mismatch)
        );
        assert_eq!(
            verify_password(&hash, "correct-secreT"),
            Err(CredentialError::Mismatch)
        );
    }

    #[test]
    fn test_empty_password_fails_to_match() {
        let hash = hash_password("correct-secret", TEST_COST).unwrap();
        assert_eq!(verify_password(&hash, ""), Err(CredentialError::Mismatch));
    }

    #[test]
    fn test_malformed_hash_is_fault() {
        let result = verify_password("not-a-bcrypt-hash", "anything");
        assert!(matches!(result, Err(CredentialError::VerifierFault(_))));

        let result = verify_password("", "anything");
        assert!(matches!(result, Err(CredentialError::VerifierFault(_))));
    }

    #[test]
    fn test_unsupported_cost_is_fault() {
        assert!(matches!(
            hash_password("pw", 3),
            Err(CredentialError::VerifierFault(_))
        ));
        assert!(matches!(
            hash_password("pw", 32),
            Err(CredentialError::VerifierFault(_))
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same", TEST_COST).unwrap();
        let b = hash_password("same", TEST_COST).unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "same").is_ok());
        assert!(verify_password(&b, "same").is_ok());
    }
}
