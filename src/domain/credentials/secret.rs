//! Secret material types

use serde::{Deserialize, Serialize};

/// Ciphertext/iv pair produced by the secret vault, both base64 encoded
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    ciphertext: String,
    iv: String,
}

impl EncryptedSecret {
    pub fn new(ciphertext: impl Into<String>, iv: impl Into<String>) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            iv: iv.into(),
        }
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn iv(&self) -> &str {
        &self.iv
    }
}

impl std::fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("ciphertext", &"[hidden]")
            .field("iv", &"[hidden]")
            .finish()
    }
}

/// Decrypted secret held only for the duration of a resolve-and-use cycle
///
/// Has no `Display` and a redacting `Debug`; the plaintext is reachable only
/// through [`SecretValue::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue([hidden])")
    }
}
