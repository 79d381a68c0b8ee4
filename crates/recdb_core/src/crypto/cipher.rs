//! AES-256-GCM cipher and key handling.

use crate::error::{CoreError, CoreResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encryption key for the table files.
///
/// The key is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generates a new random encryption key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CoreError::invalid_key_size(bytes.len(), KEY_SIZE));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Don't log or persist the result anywhere other than the server
    /// `KEY` file.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derives a key from a passphrase using HKDF-SHA256.
    ///
    /// The salt must be unique per server root and stored alongside
    /// the data (the server keeps it in the `SALT` file).
    pub fn derive_from_passphrase(passphrase: &[u8], salt: &[u8]) -> CoreResult<Self> {
        use hkdf::Hkdf;
        use sha2::Sha256;

        let hk = Hkdf::<Sha256>::new(Some(salt), passphrase);

        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(b"recdb-table-key-v1", &mut bytes)
            .map_err(|_| CoreError::key_derivation_failed("HKDF expand failed"))?;

        Ok(Self { bytes })
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypts and decrypts serialized record sets.
///
/// Uses AES-256-GCM authenticated encryption. The ciphertext layout is
/// `nonce (12 bytes) || ciphertext || tag (16 bytes)`; a fresh random
/// nonce is drawn per encryption, so encrypting the same plaintext
/// twice yields different bytes.
pub struct CryptoManager {
    cipher: Aes256Gcm,
}

impl CryptoManager {
    /// Creates a new crypto manager with the given key.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        // Infallible: EncryptionKey.bytes is always exactly KEY_SIZE
        // bytes, matching AES-256's key size.
        let key_array = GenericArray::from_slice(key.as_bytes());
        let cipher = Aes256Gcm::new(key_array);
        Self { cipher }
    }

    /// Encrypts a plaintext, prepending the nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CoreError::encryption_failed("encryption error"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);

        Ok(result)
    }

    /// Decrypts data produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DecryptionFailed`] on a wrong key, a
    /// truncated file, or any tampering with the ciphertext.
    pub fn decrypt(&self, ciphertext: &[u8]) -> CoreResult<Vec<u8>> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CoreError::decryption_failed("ciphertext too short"));
        }

        let nonce = Nonce::from_slice(&ciphertext[..NONCE_SIZE]);
        let encrypted = &ciphertext[NONCE_SIZE..];

        self.cipher
            .decrypt(nonce, encrypted)
            .map_err(|_| CoreError::decryption_failed("decryption error"))
    }
}

impl std::fmt::Debug for CryptoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoManager")
            .field("cipher", &"Aes256Gcm")
            .finish()
    }
}
