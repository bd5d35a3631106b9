//! Ledger account address type with `cncd_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypeError;

/// A Concord ledger account address, always prefixed with `cncd_`.
///
/// Accounts fund and authorize the votes cast by the nodes they back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// The standard prefix for all Concord account addresses.
    pub const PREFIX: &'static str = "cncd_";

    /// Create an account address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `cncd_`. Use [`Self::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with cncd_");
        Self(s)
    }

    /// Parse an address arriving over the wire, validating the prefix.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypeError> {
        let s = raw.into();
        if s.starts_with(Self::PREFIX) && s.len() > Self::PREFIX.len() {
            Ok(Self(s))
        } else {
            Err(TypeError::InvalidAddress(s))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefixed_address() {
        let addr = AccountAddress::parse("cncd_1a2b3c").unwrap();
        assert_eq!(addr.as_str(), "cncd_1a2b3c");
        assert!(addr.is_valid());
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        assert!(AccountAddress::parse("brst_1a2b3c").is_err());
        assert!(AccountAddress::parse("").is_err());
    }

    #[test]
    fn parse_rejects_bare_prefix() {
        assert!(AccountAddress::parse("cncd_").is_err());
    }
}
