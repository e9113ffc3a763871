/*
    encryption.rs - At-rest encryption for stored values

    Encrypts values using AES-256-GCM.
    Keys are derived from a user passphrase with Argon2id.

    Record layout: [nonce: 12 bytes][ciphertext + tag]
*/

use super::{StorageError, StorageResult};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Argon2, Params};
use zeroize::Zeroizing;

/// Salt length for Argon2 KDF (16 bytes = 128 bits)
pub const SALT_LEN: usize = 16;

/// Nonce length for AES-GCM (12 bytes = 96 bits)
const NONCE_LEN: usize = 12;

/// AEAD tag length
const TAG_LEN: usize = 16;

/// Encrypts and decrypts individual values
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Create a cipher with a random key (nothing written with it survives the process)
    pub fn random() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        Cipher {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Derive the key from a passphrase and salt
    pub fn from_passphrase(passphrase: &str, salt: &[u8]) -> StorageResult<Self> {
        let key = derive_key_from_passphrase(passphrase, salt)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| StorageError::Encryption(format!("Invalid key: {}", e)))?;
        Ok(Cipher { cipher })
    }

    /// Generate a fresh random salt
    pub fn generate_salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    /// Encrypt data, prepending the random nonce
    pub fn encrypt(&self, plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| StorageError::Encryption(e.to_string()))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt data produced by [`Cipher::encrypt`]
    pub fn decrypt(&self, data: &[u8]) -> StorageResult<Vec<u8>> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(StorageError::Decryption("Invalid ciphertext length".to_string()));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        // AEAD tag mismatch = wrong passphrase or corrupted record
        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| StorageError::Decryption("authentication tag mismatch".to_string()))
    }
}

/// Derive 256-bit encryption key from passphrase using Argon2id
fn derive_key_from_passphrase(passphrase: &str, salt: &[u8]) -> StorageResult<Zeroizing<Vec<u8>>> {
    let params = Params::new(
        19 * 1024, // 19 MiB memory cost
        2,         // 2 iterations
        1,         // 1 lane
        Some(32),  // 256-bit output
    )
    .map_err(|e| StorageError::Encryption(format!("Invalid Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = Zeroizing::new(vec![0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, key.as_mut_slice())
        .map_err(|e| StorageError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}
