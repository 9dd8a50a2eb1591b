//! Deployment environment and feed configuration
//!
//! Both are supplied by the embedding application and passed explicitly into
//! the resolver, fetcher, and controller; nothing here is read from globals.

use serde::{Deserialize, Serialize};

/// Deployment stage of the external feed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Prod,
    #[default]
    Staging,
    Dev,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Staging => "staging",
            Environment::Dev => "dev",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Prod),
            "staging" => Ok(Environment::Staging),
            "dev" => Ok(Environment::Dev),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Environment context handed to the resolver and fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvConfig {
    /// Deployment stage of the feed source
    pub environment: Environment,
    /// Whether identities are chain-qualified (CAIP) or raw addresses
    pub caip: bool,
}

impl EnvConfig {
    pub fn new(environment: Environment, caip: bool) -> Self {
        Self { environment, caip }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_round_trip() {
        for env in [Environment::Prod, Environment::Staging, Environment::Dev] {
            let parsed: Environment = env.as_str().parse().unwrap();
            assert_eq!(parsed, env);
        }
    }

    #[test]
    fn test_environment_rejects_unknown() {
        assert!("testnet".parse::<Environment>().is_err());
    }
}
