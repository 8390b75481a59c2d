use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Salted SHA-256 digest of a password.
///
/// The account store is an external concern; this digest only exists so the in-memory
/// directory never holds plaintext and comparisons run in constant time.
#[derive(Clone)]
pub struct PasswordDigest {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

impl PasswordDigest {
    pub fn new(password: &str) -> Self {
        let salt = *Uuid::new_v4().as_bytes();
        Self {
            salt,
            digest: digest(&salt, password),
        }
    }

    pub fn verify(&self, candidate: &str) -> bool {
        let candidate = digest(&self.salt, candidate);
        candidate[..].ct_eq(&self.digest[..]).into()
    }
}

fn digest(salt: &[u8; 16], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
