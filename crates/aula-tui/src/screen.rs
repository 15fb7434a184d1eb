//! Screen identifiers and their admin-panel mapping.

use std::fmt;

use aula_core::AdminTab;

/// The five top-level screens, navigable with the number keys 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Dashboard,
    Users,
    Audit,
    Analytics,
    Settings,
}

impl ScreenId {
    /// Tab-bar order.
    pub const ALL: [ScreenId; 5] = [
        Self::Dashboard,
        Self::Users,
        Self::Audit,
        Self::Analytics,
        Self::Settings,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Users => 2,
            Self::Audit => 3,
            Self::Analytics => 4,
            Self::Settings => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Users => "Users",
            Self::Audit => "Audit",
            Self::Analytics => "Analytics",
            Self::Settings => "Settings",
        }
    }

    /// Admin panels whose first load this screen triggers. The dashboard
    /// carries the statistics summary.
    pub fn tabs(self) -> &'static [AdminTab] {
        match self {
            Self::Dashboard => &[AdminTab::Statistics],
            Self::Users => &[AdminTab::Users],
            Self::Audit => &[AdminTab::Audit],
            Self::Analytics => &[AdminTab::Analytics],
            Self::Settings => &[AdminTab::Settings],
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
