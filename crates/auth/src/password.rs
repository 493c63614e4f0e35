//! Password hashing seam.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hashes and verifies user passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Salted SHA-256, stored as `salt$hexdigest`.
///
/// A development placeholder: deployments are expected to inject a slow KDF
/// behind [`PasswordHasher`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SaltedSha256Hasher;

impl SaltedSha256Hasher {
    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl PasswordHasher for SaltedSha256Hasher {
    fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, password);
        format!("{salt}${digest}")
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match hash.split_once('$') {
            Some((salt, digest)) => Self::digest(salt, password) == digest,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let h = SaltedSha256Hasher;
        let a = h.hash("hunter22");
        let b = h.hash("hunter22");
        assert_ne!(a, b);
        assert!(h.verify("hunter22", &a));
        assert!(h.verify("hunter22", &b));
        assert!(!h.verify("hunter23", &a));
        assert!(!h.verify("hunter22", "garbage"));
    }
}
