//! Bot macro-state
//!
//! The high-level behavioral mode of the automation. Owned by the external
//! bot state machine; the camera only reads it.

use serde::{Deserialize, Serialize};

/// High-level behavioral mode reported by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MacroState {
    /// Bot is starting up
    #[default]
    Init,
    /// Looking for something to engage
    Searching,
    /// Walking toward a destination
    Navigating,
    /// Engaged in combat
    Killing,
    /// Repairing equipment
    Repairing,
    /// Moving items to storage
    Stashing,
}

impl MacroState {
    /// All states in declaration order
    pub const ALL: [MacroState; 6] = [
        Self::Init,
        Self::Searching,
        Self::Navigating,
        Self::Killing,
        Self::Repairing,
        Self::Stashing,
    ];

    /// Lowercase name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Searching => "searching",
            Self::Navigating => "navigating",
            Self::Killing => "killing",
            Self::Repairing => "repairing",
            Self::Stashing => "stashing",
        }
    }
}

impl std::fmt::Display for MacroState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MacroState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "init" => Ok(Self::Init),
            "searching" | "search" => Ok(Self::Searching),
            "navigating" | "navigate" => Ok(Self::Navigating),
            "killing" | "kill" | "combat" => Ok(Self::Killing),
            "repairing" | "repair" => Ok(Self::Repairing),
            "stashing" | "stash" => Ok(Self::Stashing),
            _ => Err(format!("Unknown macro state: {}", s)),
        }
    }
}

/// Read-only view of the bot's current macro-state
pub trait MacroStateSource: Send + Sync {
    /// Current macro-state
    fn current_state(&self) -> MacroState;
}
