//! Password hashing.
//!
//! Credentials are stored as `<salt>$<hex(pbkdf2)>`. The salt is a single
//! process-wide value from configuration, so two users with the same password
//! share the same stored credential.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 1000;

/// Length of the derived key in bytes.
pub const DERIVED_KEY_LEN: usize = 64;

/// Separator between the salt and the derived key.
const SEPARATOR: char = '$';

/// Derive the stored credential for a plaintext password.
pub fn hash_password(plaintext: &str, salt: &str) -> String {
    let mut derived = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha512>(
        plaintext.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut derived,
    );
    format!("{salt}{SEPARATOR}{}", hex::encode(derived))
}

/// Check a plaintext password against a stored credential.
pub fn verify_password(plaintext: &str, salt: &str, stored: &str) -> bool {
    hash_password(plaintext, salt) == stored
}
