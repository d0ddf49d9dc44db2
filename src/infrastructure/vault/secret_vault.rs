//! AES-256-GCM secret vault keyed by the process-wide master key

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::credentials::{EncryptedSecret, SecretValue};
use crate::domain::DomainError;

/// Environment variable holding the master key
pub const MASTER_KEY_ENV: &str = "GATEWAY_MASTER_KEY";

const KEY_LEN: usize = 32;
const IV_LEN: usize = 12;

/// Encrypts and decrypts short secrets with a single master key
///
/// The key is fixed at construction and never leaves this type. Every
/// encryption draws a fresh 96-bit IV from the OS CSPRNG.
pub struct SecretVault {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault")
            .field("master_key", &"[hidden]")
            .finish()
    }
}

impl SecretVault {
    /// Create a vault from raw key bytes (must be 32 bytes)
    pub fn new(master_key: &[u8]) -> Result<Self, DomainError> {
        if master_key.len() != KEY_LEN {
            return Err(DomainError::configuration(format!(
                "Master key must be {} bytes, got {}",
                KEY_LEN,
                master_key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(master_key)
            .map_err(|e| DomainError::configuration(format!("Invalid master key: {}", e)))?;

        Ok(Self { cipher })
    }

    /// Create a vault from a base64 or 64-character hex encoded key
    pub fn from_encoded(encoded: &str) -> Result<Self, DomainError> {
        let encoded = encoded.trim();

        let bytes = if encoded.len() == KEY_LEN * 2 && encoded.chars().all(|c| c.is_ascii_hexdigit())
        {
            hex::decode(encoded)
                .map_err(|e| DomainError::configuration(format!("Invalid hex master key: {}", e)))?
        } else {
            STANDARD.decode(encoded).map_err(|e| {
                DomainError::configuration(format!("Master key is neither hex nor base64: {}", e))
            })?
        };

        Self::new(&bytes)
    }

    /// Read the master key from the environment, failing if it is absent
    pub fn from_env() -> Result<Self, DomainError> {
        let encoded = std::env::var(MASTER_KEY_ENV).map_err(|_| {
            DomainError::configuration(format!("{} is not set", MASTER_KEY_ENV))
        })?;

        Self::from_encoded(&encoded)
    }

    /// Encrypt a plaintext secret under a fresh random IV
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret, DomainError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| DomainError::internal(format!("Secret encryption failed: {}", e)))?;

        Ok(EncryptedSecret::new(STANDARD.encode(ciphertext), STANDARD.encode(iv)))
    }

    /// Decrypt a sealed secret; fails on any authentication mismatch
    pub fn decrypt(&self, secret: &EncryptedSecret) -> Result<SecretValue, DomainError> {
        let ciphertext = STANDARD
            .decode(secret.ciphertext())
            .map_err(|_| DomainError::decryption("Stored ciphertext is not valid base64"))?;
        let iv = STANDARD
            .decode(secret.iv())
            .map_err(|_| DomainError::decryption("Stored iv is not valid base64"))?;

        if iv.len() != IV_LEN {
            return Err(DomainError::decryption(format!(
                "Stored iv must be {} bytes, got {}",
                IV_LEN,
                iv.len()
            )));
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
            .map_err(|_| DomainError::decryption("Authentication tag mismatch"))?;

        String::from_utf8(plaintext)
            .map(SecretValue::new)
            .map_err(|_| DomainError::decryption("Decrypted secret is not valid UTF-8"))
    }
}

/// Generate a new base64 encoded master key from the OS CSPRNG
pub fn generate_master_key() -> String {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    STANDARD.encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn vault() -> SecretVault {
        SecretVault::new(&[7u8; KEY_LEN]).unwrap()
    }

    fn flip_bit(encoded: &str, index: usize) -> String {
        let mut bytes = STANDARD.decode(encoded).unwrap();
        bytes[index] ^= 0x01;
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_round_trip() {
        let vault = vault();

        for plaintext in ["sk-live-abc123", "", "ключ-🔑"] {
            let sealed = vault.encrypt(plaintext).unwrap();
            assert_eq!(vault.decrypt(&sealed).unwrap().expose(), plaintext);
        }
    }

    #[test]
    fn test_iv_is_96_bits() {
        let sealed = vault().encrypt("secret").unwrap();
        assert_eq!(STANDARD.decode(sealed.iv()).unwrap().len(), 12);
    }

    #[test]
    fn test_iv_never_repeats() {
        let vault = vault();
        let ivs: HashSet<String> = (0..2_000)
            .map(|_| vault.encrypt("same plaintext").unwrap().iv().to_string())
            .collect();

        assert_eq!(ivs.len(), 2_000);
    }

    #[test]
    fn test_tampered_ciphertext_fails_closed() {
        let vault = vault();
        let sealed = vault.encrypt("sk-live-abc123").unwrap();
        let len = STANDARD.decode(sealed.ciphertext()).unwrap().len();

        for index in 0..len {
            let tampered = EncryptedSecret::new(flip_bit(sealed.ciphertext(), index), sealed.iv());
            assert!(matches!(
                vault.decrypt(&tampered),
                Err(DomainError::Decryption { .. })
            ));
        }
    }

    #[test]
    fn test_tampered_iv_fails_closed() {
        let vault = vault();
        let sealed = vault.encrypt("sk-live-abc123").unwrap();

        for index in 0..IV_LEN {
            let tampered = EncryptedSecret::new(sealed.ciphertext(), flip_bit(sealed.iv(), index));
            assert!(vault.decrypt(&tampered).is_err());
        }
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let sealed = vault().encrypt("sk-live-abc123").unwrap();
        let other = SecretVault::new(&[8u8; KEY_LEN]).unwrap();

        assert!(matches!(
            other.decrypt(&sealed),
            Err(DomainError::Decryption { .. })
        ));
    }

    #[test]
    fn test_malformed_columns_fail_closed() {
        let vault = vault();

        assert!(vault.decrypt(&EncryptedSecret::new("not base64!", "AAAA")).is_err());
        assert!(vault.decrypt(&EncryptedSecret::new("AAAA", "AAAA")).is_err());
    }

    #[test]
    fn test_from_encoded_accepts_hex_and_base64() {
        assert!(SecretVault::from_encoded(&"ab".repeat(32)).is_ok());
        assert!(SecretVault::from_encoded(&generate_master_key()).is_ok());
        assert!(SecretVault::from_encoded("too-short").is_err());
        assert!(matches!(
            SecretVault::from_encoded(&STANDARD.encode([1u8; 16])),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let output = format!("{:?}", vault());
        assert!(output.contains("[hidden]"));
    }
}
