//! Reversible, password-keyed mnemonic encryption.
//!
//! Deliberately NOT an authenticated cipher: decrypting with the wrong
//! password returns a deterministic wrong string instead of failing.
//! Authentication is the password hasher's job (`auth.rs`); this transform
//! only protects the seed phrase at rest. Callers must never treat a
//! non-error decrypt as proof the password was correct.
//!
//! Layout of the ciphertext string: hex(nonce[16] || plaintext XOR keystream)
//! where key = PBKDF2-HMAC-SHA256(password, nonce) and the keystream is
//! HMAC-SHA256(key, block_counter) blocks.

use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::VaultError;

const NONCE_LEN: usize = 16;
const KDF_ITERATIONS: u32 = 100_000;

fn derive_key(password: &str, nonce: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), nonce, KDF_ITERATIONS, &mut key);
    key
}

/// XOR `data` in place with an HMAC-SHA256 counter keystream.
fn apply_keystream(key: &[u8; 32], data: &mut [u8]) -> Result<(), VaultError> {
    for (block_index, chunk) in data.chunks_mut(32).enumerate() {
        let mut mac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|e| VaultError::KeyDerivationFailed(e.to_string()))?;
        mac.update(&(block_index as u64).to_be_bytes());
        let block = mac.finalize().into_bytes();
        for (byte, key_byte) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= key_byte;
        }
    }
    Ok(())
}

/// Encrypt a mnemonic under a password.
pub fn encrypt_mnemonic(mnemonic: &str, password: &str) -> Result<String, VaultError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &nonce);
    let mut data = mnemonic.as_bytes().to_vec();
    apply_keystream(&key, &mut data)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + data.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&data);
    Ok(hex::encode(blob))
}

/// Decrypt a mnemonic ciphertext.
///
/// Errors only on malformed input (bad hex, missing nonce). A wrong
/// password produces a different keystream and therefore a wrong — but
/// valid — string, recovered lossily from the garbage bytes.
pub fn decrypt_mnemonic(ciphertext: &str, password: &str) -> Result<String, VaultError> {
    let blob = hex::decode(ciphertext)
        .map_err(|e| VaultError::MalformedCiphertext(e.to_string()))?;
    if blob.len() < NONCE_LEN {
        return Err(VaultError::MalformedCiphertext(
            "ciphertext shorter than nonce".to_string(),
        ));
    }

    let (nonce, body) = blob.split_at(NONCE_LEN);
    let key = derive_key(password, nonce);
    let mut data = body.to_vec();
    apply_keystream(&key, &mut data)?;

    Ok(String::from_utf8_lossy(&data).into_owned())
}
