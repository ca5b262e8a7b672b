//! Salted, slow password hashing (PBKDF2-HMAC-SHA256).
//!
//! Stored form: `pbkdf2_sha256$<iterations>$<salt b64>$<hash b64>`.
//! The iteration count travels with the hash, so the configured cost can
//! change without invalidating existing accounts.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

pub const DEFAULT_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;

const SCHEME: &str = "pbkdf2_sha256";

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check a password against a stored hash in constant time.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored string
/// is not a hash this module produced.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(CryptoError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    if iterations == 0 {
        return Err(CryptoError::MalformedHash);
    }
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(hash)
        .map_err(|_| CryptoError::MalformedHash)?;
    if expected.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }

    let actual = derive(password, &salt, iterations);
    Ok(actual[..].ct_eq(&expected[..]).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password("s3cret!", FAST);
        assert!(verify_password("s3cret!", &stored).unwrap());
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("s3cret!", FAST);
        assert!(!verify_password("S3cret!", &stored).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let h1 = hash_password("password", FAST);
        let h2 = hash_password("password", FAST);
        assert_ne!(h1, h2);
        assert!(verify_password("password", &h1).unwrap());
        assert!(verify_password("password", &h2).unwrap());
    }

    #[test]
    fn iteration_count_is_embedded() {
        let stored = hash_password("pw", 1234);
        assert!(stored.starts_with("pbkdf2_sha256$1234$"));
    }

    #[test]
    fn malformed_hashes_are_errors() {
        for bad in ["", "plaintext", "bcrypt$10$abc$def", "pbkdf2_sha256$x$abc$def", "pbkdf2_sha256$0$AA$AA"] {
            assert!(verify_password("pw", bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn generate_salt_is_random() {
        let s1 = generate_salt();
        let s2 = generate_salt();
        assert_ne!(s1, s2);
    }

    #[test]
    #[ignore = "slow: full production cost"]
    fn default_cost_takes_meaningful_time() {
        let start = std::time::Instant::now();
        let _ = hash_password("test_password", DEFAULT_ITERATIONS);
        let elapsed = start.elapsed();
        assert!(
            elapsed.as_millis() > 100,
            "PBKDF2 too fast: {}ms: brute force protection insufficient",
            elapsed.as_millis()
        );
    }
}
