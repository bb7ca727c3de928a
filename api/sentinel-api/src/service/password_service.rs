//! Salted HMAC-SHA256 credential hashes, stored as `sha256$<salt-hex>$<mac-hex>`.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "sha256";

pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with_salt(password, &hex::encode(salt))
}

pub fn hash_with_salt(password: &str, salt_hex: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(salt_hex.as_bytes())
        .map_err(|e| format!("hmac init failed: {e}"))?;
    mac.update(password.as_bytes());
    Ok(format!(
        "{SCHEME}${salt_hex}${}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(SCHEME), Some(salt_hex), Some(mac_hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(expected) = hex::decode(mac_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(salt_hex.as_bytes()) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let stored = hash_password("secret").expect("hash");
        assert!(stored.starts_with("sha256$"));
        assert!(verify_password("secret", &stored));
        assert!(!verify_password("Secret", &stored));
    }

    #[test]
    fn fresh_salts_differ() {
        let a = hash_password("secret").expect("hash");
        let b = hash_password("secret").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("secret", "plaintext"));
        assert!(!verify_password("secret", "md5$aa$bb"));
        assert!(!verify_password("secret", "sha256$aa$not-hex"));
    }
}
