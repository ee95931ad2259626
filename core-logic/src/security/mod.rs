//! # Signing Secret Handling
//!
//! Holds the raw `PRIVATE_KEY` value and turns it into ethers wallets.
//! The value is zeroized on drop and never printed.

use crate::error::WalletError;
use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const PRIVATE_KEY_HEX_LEN: usize = 64;

/// What kind of material a [`SigningSecret`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    PrivateKey,
    Mnemonic,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret(String);

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningSecret")
            .field(&"***REDACTED***")
            .finish()
    }
}

impl SigningSecret {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        let trimmed = raw.trim().to_string();
        raw.zeroize();
        Self(trimmed)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A phrase of whitespace-separated words is a mnemonic, anything else a key.
    pub fn kind(&self) -> SecretKind {
        if self.0.split_whitespace().nth(1).is_some() {
            SecretKind::Mnemonic
        } else {
            SecretKind::PrivateKey
        }
    }

    /// Derive the signing wallets for this secret.
    ///
    /// A raw private key always yields exactly one wallet. A mnemonic yields
    /// `count` wallets on the standard `m/44'/60'/0'/0/{i}` path starting at
    /// `first_index`.
    pub fn derive_wallets(
        &self,
        first_index: u32,
        count: u32,
    ) -> Result<Vec<LocalWallet>, WalletError> {
        match self.kind() {
            SecretKind::PrivateKey => Ok(vec![parse_private_key(&self.0)?]),
            SecretKind::Mnemonic => {
                let end = first_index.checked_add(count).ok_or_else(|| {
                    WalletError::InvalidMnemonic {
                        reason: format!("derivation index overflow at {}", first_index),
                    }
                })?;
                (first_index..end)
                    .map(|index| derive_from_mnemonic(&self.0, index))
                    .collect()
            }
        }
    }
}

fn parse_private_key(raw: &str) -> Result<LocalWallet, WalletError> {
    let hex_part = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    if hex_part.len() != PRIVATE_KEY_HEX_LEN {
        return Err(WalletError::InvalidKeyLength {
            length: hex_part.len(),
        });
    }

    let mut bytes = hex::decode(hex_part).map_err(|_| WalletError::InvalidKeyFormat)?;
    let wallet = LocalWallet::from_bytes(&bytes).map_err(|_| WalletError::InvalidKeyFormat);
    bytes.zeroize();
    wallet
}

fn derive_from_mnemonic(phrase: &str, index: u32) -> Result<LocalWallet, WalletError> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .index(index)
        .and_then(|builder| builder.build())
        .map_err(|e| WalletError::InvalidMnemonic {
            reason: e.to_string(),
        })
}
