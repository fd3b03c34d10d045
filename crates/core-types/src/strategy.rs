use serde::{Deserialize, Serialize};
use std::fmt;

use crate::StrategyId;

/// The family a strategy belongs to. Each kind has its own confidence range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Fast, short-horizon strategies.
    Scalping,
    /// Slower, session-based strategies.
    Session,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Scalping => write!(f, "scalping"),
            StrategyKind::Session => write!(f, "session"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub id: StrategyId,
    #[serde(default = "default_kind")]
    pub kind: StrategyKind,
}

fn default_kind() -> StrategyKind {
    StrategyKind::Session
}
