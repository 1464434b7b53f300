//! Per-database secret lifecycle.
//!
//! Each database owns one randomly generated 32-byte secret, persisted in a
//! key file laid out as `salt (16) ‖ iv (16) ‖ AES-256-CBC ciphertext`. Two
//! distinct derivation contracts are in play and must not be conflated:
//!
//! - **Secret at rest**: the key-file key is derived from the engine
//!   passphrase via PBKDF2-HMAC-SHA256 with the salt persisted in the file.
//!   Decryption always re-reads the stored salt, which is what makes
//!   [`KeyVault::reveal_secret`] deterministic.
//! - **Rows at rest**: the row key is SHA-256 over the raw, still-encrypted
//!   key-file bytes. Row access therefore never needs the passphrase, and
//!   the key is stable for as long as the key file is unchanged.
//!
//! The passphrase layer protects the key file from casual tampering only:
//! anyone who can read the key file can recompute the row key regardless of
//! the passphrase.

use crate::error::{StoreError, StoreResult};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the database secret in bytes.
pub const SECRET_SIZE: usize = 32;
/// Size of the key-file salt in bytes.
pub const SALT_SIZE: usize = 16;
/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;
/// Size of the derived AES-256 keys in bytes.
pub const KEY_SIZE: usize = 32;
/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// The symmetric key used to encrypt and decrypt table rows.
///
/// Derived from the key-file bytes; zeroized on drop. The row-encryption IV
/// is the first [`IV_SIZE`] bytes of the key. Reusing key material as the IV
/// is a deliberate simplification of this design: identical rows under the
/// same key always produce identical ciphertext.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RowKey {
    bytes: [u8; KEY_SIZE],
}

impl RowKey {
    /// Returns the key as a byte array.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Returns the IV used for row encryption under this key.
    #[must_use]
    pub fn iv(&self) -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&self.bytes[..IV_SIZE]);
        iv
    }
}

impl std::fmt::Debug for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowKey").field("bytes", &"[REDACTED]").finish()
    }
}

/// Generates, persists, and recovers per-database secrets.
pub struct KeyVault {
    passphrase: Zeroizing<Vec<u8>>,
    iterations: u32,
}

impl KeyVault {
    /// Creates a vault over the given engine passphrase.
    ///
    /// The iteration count feeds PBKDF2 and must stay constant for the
    /// lifetime of the store's key files.
    pub fn new(passphrase: &[u8], iterations: u32) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.to_vec()),
            iterations,
        }
    }

    /// Generates a fresh secret and persists it encrypted at `key_file`.
    ///
    /// The file is written as `salt ‖ iv ‖ ciphertext` and then marked
    /// read-only. Fails with [`StoreError::AlreadyExists`] if the key file
    /// is already present.
    pub fn create_secret(&self, key_file: &Path) -> StoreResult<()> {
        if key_file.exists() {
            return Err(StoreError::already_exists(key_file.display().to_string()));
        }

        let mut rng = rand::thread_rng();
        let mut secret = Zeroizing::new([0u8; SECRET_SIZE]);
        rng.fill_bytes(&mut *secret);
        let mut salt = [0u8; SALT_SIZE];
        rng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut iv);

        let key = self.derive_file_key(&salt);
        let ciphertext =
            Aes256CbcEnc::new(&(*key).into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(&*secret);

        let mut contents = Vec::with_capacity(SALT_SIZE + IV_SIZE + ciphertext.len());
        contents.extend_from_slice(&salt);
        contents.extend_from_slice(&iv);
        contents.extend_from_slice(&ciphertext);
        fs::write(key_file, &contents)?;

        // Guards against accidental overwrite, not against a privileged attacker.
        let mut permissions = fs::metadata(key_file)?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(key_file, permissions)?;

        Ok(())
    }

    /// Decrypts and returns the database secret stored at `key_file`.
    ///
    /// Re-derives the key-file key from the salt persisted in the file, so
    /// two calls always return the same bytes.
    pub fn reveal_secret(&self, key_file: &Path) -> StoreResult<Zeroizing<Vec<u8>>> {
        let contents = self.read_key_file(key_file)?;

        let salt = &contents[..SALT_SIZE];
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&contents[SALT_SIZE..SALT_SIZE + IV_SIZE]);
        let ciphertext = &contents[SALT_SIZE + IV_SIZE..];

        let key = self.derive_file_key(salt);
        let secret = Aes256CbcDec::new(&(*key).into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| {
                StoreError::crypto("secret decryption failed (wrong passphrase or damaged key file)")
            })?;

        Ok(Zeroizing::new(secret))
    }

    /// Derives the row-encryption key for the database owning `key_file`.
    ///
    /// The key is SHA-256 over the raw key-file bytes. It is recoverable by
    /// anyone who can read the key file, independent of the passphrase.
    pub fn row_key(&self, key_file: &Path) -> StoreResult<RowKey> {
        if !key_file.exists() {
            return Err(StoreError::not_found(key_file.display().to_string()));
        }
        let contents = fs::read(key_file)?;
        let digest = Sha256::digest(&contents);

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&digest);
        Ok(RowKey { bytes })
    }

    /// Reads and structurally validates the key file.
    fn read_key_file(&self, key_file: &Path) -> StoreResult<Vec<u8>> {
        if !key_file.exists() {
            return Err(StoreError::not_found(key_file.display().to_string()));
        }
        let contents = fs::read(key_file)?;

        let header = SALT_SIZE + IV_SIZE;
        if contents.len() < header + BLOCK_SIZE {
            return Err(StoreError::corrupt_record("key file too short"));
        }
        if (contents.len() - header) % BLOCK_SIZE != 0 {
            return Err(StoreError::corrupt_record(
                "key file ciphertext is not block-aligned",
            ));
        }
        Ok(contents)
    }

    /// PBKDF2-HMAC-SHA256 over the passphrase with the given salt.
    fn derive_file_key(&self, salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE]> {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        pbkdf2::pbkdf2_hmac::<Sha256>(&self.passphrase, salt, self.iterations, &mut *key);
        key
    }
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVault")
            .field("passphrase", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_ITERATIONS: u32 = 16;

    fn vault() -> KeyVault {
        KeyVault::new(b"test passphrase", TEST_ITERATIONS)
    }

    #[test]
    fn secret_roundtrip_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("database.key");

        let vault = vault();
        vault.create_secret(&key_file).unwrap();

        let first = vault.reveal_secret(&key_file).unwrap();
        let second = vault.reveal_secret(&key_file).unwrap();
        assert_eq!(first.as_slice(), second.as_slice());
        assert_eq!(first.len(), SECRET_SIZE);
    }

    #[test]
    fn create_twice_fails() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("database.key");

        let vault = vault();
        vault.create_secret(&key_file).unwrap();

        assert!(matches!(
            vault.create_secret(&key_file),
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn key_file_is_read_only() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("database.key");

        vault().create_secret(&key_file).unwrap();

        let metadata = fs::metadata(&key_file).unwrap();
        assert!(metadata.permissions().readonly());
    }

    #[test]
    fn wrong_passphrase_fails() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("database.key");

        vault().create_secret(&key_file).unwrap();

        let wrong = KeyVault::new(b"other passphrase", TEST_ITERATIONS);
        assert!(matches!(
            wrong.reveal_secret(&key_file),
            Err(StoreError::Crypto { .. })
        ));
    }

    #[test]
    fn missing_key_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("database.key");

        let vault = vault();
        assert!(matches!(
            vault.reveal_secret(&key_file),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            vault.row_key(&key_file),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn truncated_key_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("database.key");

        fs::write(&key_file, [0u8; SALT_SIZE + IV_SIZE + 3]).unwrap();

        assert!(matches!(
            vault().reveal_secret(&key_file),
            Err(StoreError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn row_key_is_stable_and_unique_per_database() {
        let dir = TempDir::new().unwrap();
        let key_a = dir.path().join("a.key");
        let key_b = dir.path().join("b.key");

        let vault = vault();
        vault.create_secret(&key_a).unwrap();
        vault.create_secret(&key_b).unwrap();

        let first = vault.row_key(&key_a).unwrap();
        let second = vault.row_key(&key_a).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());

        let other = vault.row_key(&key_b).unwrap();
        assert_ne!(first.as_bytes(), other.as_bytes());
    }

    #[test]
    fn iv_is_key_prefix() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("database.key");

        let vault = vault();
        vault.create_secret(&key_file).unwrap();
        let key = vault.row_key(&key_file).unwrap();

        assert_eq!(&key.iv(), &key.as_bytes()[..IV_SIZE]);
    }
}
