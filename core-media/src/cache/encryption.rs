//! Payload encryption for sensitive media
//!
//! Raw media bytes are sealed with AES-256-GCM under a per-item key. Each call
//! draws a fresh 96-bit IV that must be stored next to the ciphertext. Signed
//! URLs never pass through here.

use crate::error::{MediaError, Result};
use bridge_traits::MediaDescriptor;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::{debug, warn};

/// Length of the GCM nonce in bytes.
pub const IV_LEN: usize = 12;

/// Length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

const KEY_LEN: usize = 32;

/// AES-256 key for one media item.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKey {
    #[serde(with = "hex_serde")]
    key_bytes: Vec<u8>,
}

impl EncryptionKey {
    /// Generate a new random key.
    #[cfg(feature = "encryption")]
    pub fn generate() -> Result<Self> {
        use aes_gcm::aead::OsRng;
        use aes_gcm::KeyInit;

        let key = aes_gcm::Aes256Gcm::generate_key(&mut OsRng);
        Ok(Self {
            key_bytes: key.to_vec(),
        })
    }

    #[cfg(not(feature = "encryption"))]
    pub fn generate() -> Result<Self> {
        Err(disabled())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(MediaError::EncryptionError(format!(
                "Invalid key length {}, expected {} bytes for AES-256",
                bytes.len(),
                KEY_LEN
            )));
        }

        Ok(Self { key_bytes: bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.key_bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| MediaError::EncryptionError(format!("Invalid hex key: {}", e)))?;

        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key_bytes", &"[REDACTED]")
            .finish()
    }
}

/// Ciphertext (tag included) plus the IV it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ciphertext: Bytes,
    pub iv: [u8; IV_LEN],
}

impl EncryptedPayload {
    /// Storage form: IV followed by ciphertext.
    pub fn to_packed(&self) -> Bytes {
        let mut packed = BytesMut::with_capacity(IV_LEN + self.ciphertext.len());
        packed.put_slice(&self.iv);
        packed.put_slice(&self.ciphertext);
        packed.freeze()
    }

    /// Split a packed buffer produced by [`to_packed`](Self::to_packed).
    pub fn from_packed(packed: &[u8]) -> Result<Self> {
        if packed.len() < IV_LEN + TAG_LEN {
            return Err(MediaError::IntegrityFailure(format!(
                "Packed payload too short ({} bytes)",
                packed.len()
            )));
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&packed[..IV_LEN]);
        Ok(Self {
            ciphertext: Bytes::copy_from_slice(&packed[IV_LEN..]),
            iv,
        })
    }
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
#[cfg(feature = "encryption")]
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> Result<EncryptedPayload> {
    use aes_gcm::aead::rand_core::RngCore;
    use aes_gcm::aead::{Aead, KeyInit, OsRng};
    use aes_gcm::{Aes256Gcm, Nonce};

    let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| MediaError::EncryptionError(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedPayload {
        ciphertext: Bytes::from(ciphertext),
        iv,
    })
}

#[cfg(not(feature = "encryption"))]
pub fn encrypt(_plaintext: &[u8], _key: &EncryptionKey) -> Result<EncryptedPayload> {
    Err(disabled())
}

/// Decrypt and authenticate `ciphertext` sealed with `iv` under `key`.
///
/// Any modification of the ciphertext, tag or IV, and any wrong key, yields
/// [`MediaError::IntegrityFailure`].
#[cfg(feature = "encryption")]
pub fn decrypt(ciphertext: &[u8], iv: &[u8], key: &EncryptionKey) -> Result<Bytes> {
    use aes_gcm::aead::{Aead, KeyInit};
    use aes_gcm::{Aes256Gcm, Nonce};

    if iv.len() != IV_LEN {
        return Err(MediaError::IntegrityFailure(format!(
            "IV must be {} bytes, got {}",
            IV_LEN,
            iv.len()
        )));
    }

    if ciphertext.len() < TAG_LEN {
        return Err(MediaError::IntegrityFailure(
            "Ciphertext shorter than authentication tag".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| MediaError::IntegrityFailure("Authentication tag mismatch".to_string()))?;

    Ok(Bytes::from(plaintext))
}

#[cfg(not(feature = "encryption"))]
pub fn decrypt(_ciphertext: &[u8], _iv: &[u8], _key: &EncryptionKey) -> Result<Bytes> {
    Err(disabled())
}

#[cfg(not(feature = "encryption"))]
fn disabled() -> MediaError {
    MediaError::EncryptionError("Encryption not enabled. Enable 'encryption' feature.".to_string())
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn content_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compare `bytes` against an expected hex SHA-256 (case-insensitive).
pub fn verify_checksum(bytes: &[u8], expected: &str) -> Result<()> {
    let actual = content_checksum(bytes);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(MediaError::IntegrityFailure(format!(
            "Checksum mismatch: expected {}, got {}",
            expected, actual
        )))
    }
}

/// Seals and opens media payloads according to their descriptor.
///
/// Items whose descriptor is not flagged `encrypted` pass through untouched;
/// the checksum, when present, is verified either way.
pub struct MediaEncryptor {
    key: EncryptionKey,
}

impl MediaEncryptor {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Produce the stored form of `plaintext`.
    pub fn seal(&self, descriptor: &MediaDescriptor, plaintext: &[u8]) -> Result<Bytes> {
        if !descriptor.encrypted {
            return Ok(Bytes::copy_from_slice(plaintext));
        }

        let payload = encrypt(plaintext, &self.key)?;
        debug!(
            media_id = %descriptor.id,
            bytes = plaintext.len(),
            "Sealed media payload"
        );
        Ok(payload.to_packed())
    }

    /// Recover plaintext from the stored form and verify its checksum.
    pub fn open(&self, descriptor: &MediaDescriptor, stored: &[u8]) -> Result<Bytes> {
        let plaintext = if descriptor.encrypted {
            let payload = EncryptedPayload::from_packed(stored)?;
            decrypt(&payload.ciphertext, &payload.iv, &self.key)?
        } else {
            Bytes::copy_from_slice(stored)
        };

        if let Some(expected) = descriptor.checksum.as_deref() {
            if let Err(e) = verify_checksum(&plaintext, expected) {
                warn!(media_id = %descriptor.id, "Payload failed checksum verification");
                return Err(e);
            }
        }

        Ok(plaintext)
    }
}

mod hex_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != super::KEY_LEN {
            return Err(serde::de::Error::invalid_length(
                bytes.len(),
                &"32 key bytes",
            ));
        }
        Ok(bytes)
    }
}
