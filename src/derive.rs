//! Wallet derivation from a seed phrase.
//!
//! The vault stores and releases mnemonics; turning one into a usable
//! signer is the job of this collaborator, behind a trait so the extension
//! host can plug in a chain-specific deriver.

use async_trait::async_trait;
use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use tiny_hderive::bip32::ExtendedPrivKey;

use crate::error::VaultError;

/// Derivation path for the default signing key.
const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// A usable signer derived from a mnemonic.
pub struct DerivedWallet {
    pub mnemonic: String,
    pub public_key: String,
    signing_key: SigningKey,
}

impl DerivedWallet {
    pub fn sign(&self, message: &[u8]) -> ed25519_dalek::Signature {
        self.signing_key.sign(message)
    }

    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.sign(message).to_bytes())
    }
}

#[async_trait]
pub trait WalletDeriver: Send + Sync {
    async fn derive_wallet(&self, mnemonic: &str) -> Result<DerivedWallet, VaultError>;
}

/// Default deriver: BIP-39 seed, BIP-32 path, Ed25519 signing key.
pub struct Bip39Deriver;

#[async_trait]
impl WalletDeriver for Bip39Deriver {
    async fn derive_wallet(&self, mnemonic: &str) -> Result<DerivedWallet, VaultError> {
        let parsed = Mnemonic::parse_in_normalized(Language::English, mnemonic)
            .map_err(|e| VaultError::InvalidMnemonic(e.to_string()))?;
        let seed = parsed.to_seed("");

        let ext_key = ExtendedPrivKey::derive(&seed, DERIVATION_PATH)
            .map_err(|_| VaultError::KeyDerivationFailed(DERIVATION_PATH.to_string()))?;
        let signing_key = SigningKey::from_bytes(&ext_key.secret());

        Ok(DerivedWallet {
            mnemonic: mnemonic.to_string(),
            public_key: hex::encode(signing_key.verifying_key().to_bytes()),
            signing_key,
        })
    }
}

/// Generate a fresh English mnemonic. 16 bytes of entropy gives 12 words,
/// 32 bytes gives 24.
pub fn generate_mnemonic(words: usize) -> Result<String, VaultError> {
    let entropy_len = match words {
        12 => 16,
        24 => 32,
        _ => {
            return Err(VaultError::InvalidMnemonic(format!(
                "unsupported word count: {}",
                words
            )))
        }
    };
    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy[..entropy_len])
        .map_err(|e| VaultError::InvalidMnemonic(e.to_string()))?;
    Ok(mnemonic.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    const MNEMONIC: &str =
        "legal winner thank year wave sausage worth useful legal winner thank yellow";

    #[tokio::test]
    async fn test_derivation_is_deterministic() {
        let a = Bip39Deriver.derive_wallet(MNEMONIC).await.unwrap();
        let b = Bip39Deriver.derive_wallet(MNEMONIC).await.unwrap();
        assert_eq!(a.public_key, b.public_key);
        assert_eq!(a.mnemonic, MNEMONIC);
    }

    #[tokio::test]
    async fn test_invalid_mnemonic_rejected() {
        let result = Bip39Deriver.derive_wallet("not a mnemonic").await;
        assert!(matches!(result, Err(VaultError::InvalidMnemonic(_))));
    }

    #[tokio::test]
    async fn test_signatures_verify() {
        let wallet = Bip39Deriver.derive_wallet(MNEMONIC).await.unwrap();
        let sig = wallet.sign(b"hello");
        let pubkey_bytes: [u8; 32] = hex::decode(&wallet.public_key)
            .unwrap()
            .try_into()
            .unwrap();
        let verifying = ed25519_dalek::VerifyingKey::from_bytes(&pubkey_bytes).unwrap();
        assert!(verifying.verify(b"hello", &sig).is_ok());
    }

    #[tokio::test]
    async fn test_generated_mnemonics_derive() {
        for words in [12, 24] {
            let mnemonic = generate_mnemonic(words).unwrap();
            assert_eq!(mnemonic.split_whitespace().count(), words);
            Bip39Deriver.derive_wallet(&mnemonic).await.unwrap();
        }
        assert!(generate_mnemonic(13).is_err());
    }
}
