//! Scope and domain identifiers.
//!
//! Both are opaque string keys compared by exact equality. `Scope::parse`
//! additionally checks CAIP-2 shape (`namespace:reference`) for values that
//! come from configuration; `Scope::new` accepts anything.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScopeMuxError};

/// Namespace-less scope addressing the wallet itself.
pub const WALLET_SCOPE: &str = "wallet";

/// Chain scope (routing key for middleware dispatch).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Wrap a raw string without validation.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Parse a CAIP-2 chain id (`eip155:1`), `wallet`, or `wallet:<namespace>`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == WALLET_SCOPE {
            return Ok(Self::new(raw));
        }

        let (ns, reference) = raw.split_once(':').ok_or_else(|| {
            ScopeMuxError::InvalidScope(format!("{raw} (expected namespace:reference)"))
        })?;

        if !is_namespace(ns) {
            return Err(ScopeMuxError::InvalidScope(format!("{raw} (bad namespace)")));
        }

        let ok = if ns == WALLET_SCOPE {
            is_namespace(reference)
        } else {
            is_reference(reference)
        };
        if !ok {
            return Err(ScopeMuxError::InvalidScope(format!("{raw} (bad reference)")));
        }

        Ok(Self::new(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace part (`eip155` for `eip155:1`), if the scope has one.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(':').map(|(ns, _)| ns)
    }

    /// Reference part (`1` for `eip155:1`), if the scope has one.
    pub fn reference(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, r)| r)
    }
}

// [-a-z0-9]{3,8}
fn is_namespace(s: &str) -> bool {
    (3..=8).contains(&s.len())
        && s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

// [-_a-zA-Z0-9]{1,32}
fn is_reference(s: &str) -> bool {
    (1..=32).contains(&s.len())
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl Borrow<str> for Scope {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Consuming domain (reference-counting unit, never a routing key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Domain {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parse_accepts_caip2_and_wallet() {
        for ok in [
            "eip155:1",
            "eip155:59144",
            "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
            "bip122:000000000019d6689c085ae165831e93",
            "wallet",
            "wallet:eip155",
        ] {
            assert!(Scope::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in [
            "",
            "eip155",
            "EIP155:1",
            "ab:1",
            "eip155:",
            "toolongnamespace:1",
            "eip155:0x/1",
        ] {
            let err = Scope::parse(bad).unwrap_err();
            assert!(matches!(err, ScopeMuxError::InvalidScope(_)), "{bad}");
        }
    }

    #[test]
    fn parts() {
        let s = Scope::new("eip155:137");
        assert_eq!(s.namespace(), Some("eip155"));
        assert_eq!(s.reference(), Some("137"));
        assert_eq!(Scope::new("wallet").namespace(), None);
    }
}
