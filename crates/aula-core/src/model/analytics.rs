// ── Statistics and analytics domain types ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Summary counters for the statistics panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_logs: u64,
    pub active_users: u64,
    pub changes_today: u64,
    /// Entry count per level name (`INFO`, `WARNING`, `ERROR`, ...).
    pub events_by_level: BTreeMap<String, u64>,
}

impl Statistics {
    pub fn count_for(&self, level: &str) -> u64 {
        self.events_by_level.get(level).copied().unwrap_or(0)
    }

    pub fn errors(&self) -> u64 {
        self.count_for("ERROR")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub user: String,
    pub total_actions: u64,
    pub last_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeUsage {
    /// Mode label as recorded (`"CINE 3D"`).
    pub mode: String,
    pub total_uses: u64,
    pub distinct_users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeChange {
    pub timestamp: String,
    pub user: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEvents {
    pub day: String,
    pub total: u64,
    pub errors: u64,
    pub warnings: u64,
}
