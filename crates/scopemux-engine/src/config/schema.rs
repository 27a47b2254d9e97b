use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use scopemux_core::error::{Result, ScopeMuxError};
use scopemux_core::protocol::Scope;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub version: u32,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub scopes: Vec<ScopeConfig>,

    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ScopeMuxError::UnsupportedVersion);
        }
        if self.scopes.is_empty() {
            return Err(ScopeMuxError::BadRequest("scopes must not be empty".into()));
        }

        let mut known = HashSet::new();
        for s in &self.scopes {
            Scope::parse(&s.scope)?;
            if !known.insert(s.scope.as_str()) {
                return Err(ScopeMuxError::BadRequest(format!("duplicate scope: {}", s.scope)));
            }
        }

        for sess in &self.sessions {
            if sess.domain.is_empty() {
                return Err(ScopeMuxError::BadRequest("sessions[].domain must not be empty".into()));
            }
            for scope in &sess.scopes {
                if !known.contains(scope.as_str()) {
                    return Err(ScopeMuxError::BadRequest(format!(
                        "session {} refers to unconfigured scope: {scope}",
                        sess.domain
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn scope(&self, scope: &str) -> Option<&ScopeConfig> {
        self.scopes.iter().find(|s| s.scope == scope)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default)]
    pub release_policy: ReleasePolicy,
}

/// What to do when a domain releases a scope it never registered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleasePolicy {
    /// Return `UnregisteredRelease`.
    #[default]
    Strict,
    /// Log and ignore.
    Lenient,
}

/// Static middleware for one scope: `method -> result`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    pub scope: String,
    #[serde(default)]
    pub results: BTreeMap<String, Value>,
}

/// A domain connected at startup.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    pub domain: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}
