//! Recipient identity resolution
//!
//! The feed source keys feeds by an opaque identity string. In CAIP mode that
//! is a chain-qualified `eip155:<chain_id>:<address>`; otherwise the raw
//! wallet address is used unchanged. Resolution is a pure function of the
//! wallet context so the controller can memoize on the result.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

use crate::EVM_NAMESPACE;

static EVM_ADDRESS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap());

/// Errors from identity resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("no wallet account connected")]
    MissingAccount,

    #[error("malformed address for chain {chain_id}: {address}")]
    MalformedAddress { address: String, chain_id: u64 },
}

/// Read-only snapshot of the external wallet collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletContext {
    /// Connected account address, absent while disconnected
    pub account: Option<String>,
    /// Chain the wallet is currently on
    pub chain_id: u64,
}

impl WalletContext {
    pub fn connected(account: &str, chain_id: u64) -> Self {
        Self {
            account: Some(account.to_string()),
            chain_id,
        }
    }

    pub fn disconnected(chain_id: u64) -> Self {
        Self {
            account: None,
            chain_id,
        }
    }
}

/// Canonical recipient key in the feed source's namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the feed identity for a wallet context
///
/// Deterministic: identical inputs always yield the same identity. The
/// address is validated in both modes; only the output format differs.
pub fn resolve_identity(wallet: &WalletContext, caip: bool) -> Result<Identity, IdentityError> {
    let account = wallet
        .account
        .as_deref()
        .ok_or(IdentityError::MissingAccount)?;

    if !EVM_ADDRESS_REGEX.is_match(account) {
        return Err(IdentityError::MalformedAddress {
            address: account.to_string(),
            chain_id: wallet.chain_id,
        });
    }

    let identity = if caip {
        format!("{}:{}:{}", EVM_NAMESPACE, wallet.chain_id, account)
    } else {
        account.to_string()
    };

    Ok(Identity(identity))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x51908F598A5e0d8F1A3bAbFa6DF76F9704daD072";

    #[test]
    fn test_resolve_raw_address() {
        let wallet = WalletContext::connected(ADDRESS, 1);
        let identity = resolve_identity(&wallet, false).unwrap();
        assert_eq!(identity.as_str(), ADDRESS);
    }

    #[test]
    fn test_resolve_caip_address() {
        let wallet = WalletContext::connected(ADDRESS, 11155111);
        let identity = resolve_identity(&wallet, true).unwrap();
        assert_eq!(
            identity.as_str(),
            format!("eip155:11155111:{ADDRESS}")
        );
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let wallet = WalletContext::connected(ADDRESS, 5);
        let first = resolve_identity(&wallet, true).unwrap();
        let second = resolve_identity(&wallet, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_account() {
        let wallet = WalletContext::disconnected(1);
        assert_eq!(
            resolve_identity(&wallet, false),
            Err(IdentityError::MissingAccount)
        );
    }

    #[test]
    fn test_malformed_address() {
        for bad in ["0x1234", "51908F598A5e0d8F1A3bAbFa6DF76F9704daD072", "0xZZ08F598A5e0d8F1A3bAbFa6DF76F9704daD072"] {
            let wallet = WalletContext::connected(bad, 1);
            let err = resolve_identity(&wallet, true).unwrap_err();
            assert!(matches!(err, IdentityError::MalformedAddress { .. }));
        }
    }
}
