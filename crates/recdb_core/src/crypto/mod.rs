//! Encryption-at-rest boundary.
//!
//! The record store treats encryption as an opaque capability: it
//! hands [`CryptoManager::encrypt`] a serialized record set and writes
//! whatever comes back; reads go through [`CryptoManager::decrypt`]
//! before deserialization. The cipher is stateless and reentrant, so
//! no locking happens here; the table's own lock is sufficient.

mod cipher;

pub use cipher::{CryptoManager, EncryptionKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
