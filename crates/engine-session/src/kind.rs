//! Engine roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role an engine plays in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Full-strength analytical engine (Stockfish).
    Strong,
    /// Engine trained to predict human moves (Maia). Always optional.
    HumanLike,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::Strong, EngineKind::HumanLike];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Strong => "strong",
            EngineKind::HumanLike => "human-like",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strong" => Ok(EngineKind::Strong),
            "human-like" => Ok(EngineKind::HumanLike),
            other => Err(format!(
                "Unknown engine kind '{}' (expected 'strong' or 'human-like')",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for kind in EngineKind::ALL {
            assert_eq!(kind.to_string().parse::<EngineKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "maia".parse::<EngineKind>().unwrap_err();
        assert!(err.contains("maia"));
        assert!("Strong".parse::<EngineKind>().is_err());
    }
}
