//! Pages and the role-filtered navigation menu.

use crate::model::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::WardError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Dashboard,
    Patients,
    Summaries,
    Staff,
    Analytics,
    Rooms,
    Schedule,
    Settings,
}

impl Page {
    pub fn id(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Patients => "patients",
            Page::Summaries => "summaries",
            Page::Staff => "staff",
            Page::Analytics => "analytics",
            Page::Rooms => "rooms",
            Page::Schedule => "schedule",
            Page::Settings => "settings",
        }
    }

    /// Pages that only render a "coming soon" placeholder.
    pub fn is_placeholder(self) -> bool {
        matches!(
            self,
            Page::Analytics | Page::Rooms | Page::Schedule | Page::Settings
        )
    }

    /// Parses a page id, falling back to the dashboard for anything unknown.
    pub fn from_id_or_default(id: &str) -> Self {
        id.parse().unwrap_or_default()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Page {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MENU.iter()
            .map(|entry| entry.page)
            .find(|page| page.id() == s)
            .ok_or_else(|| WardError::InvalidInput(format!("unknown page '{s}'")))
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub page: Page,
    pub label: &'static str,
    pub roles: &'static [Role],
}

impl MenuEntry {
    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

const EVERYONE: &[Role] = &[Role::Doctor, Role::Nurse, Role::JuniorDoctor];

pub static MENU: [MenuEntry; 8] = [
    MenuEntry {
        page: Page::Dashboard,
        label: "Dashboard",
        roles: EVERYONE,
    },
    MenuEntry {
        page: Page::Patients,
        label: "Patients",
        roles: EVERYONE,
    },
    MenuEntry {
        page: Page::Summaries,
        label: "Summaries",
        roles: EVERYONE,
    },
    MenuEntry {
        page: Page::Staff,
        label: "Staff Management",
        roles: &[Role::Doctor],
    },
    MenuEntry {
        page: Page::Analytics,
        label: "Analytics",
        roles: &[Role::Doctor],
    },
    MenuEntry {
        page: Page::Rooms,
        label: "Room Management",
        roles: &[Role::Doctor, Role::Nurse],
    },
    MenuEntry {
        page: Page::Schedule,
        label: "Schedule",
        roles: EVERYONE,
    },
    MenuEntry {
        page: Page::Settings,
        label: "Settings",
        roles: EVERYONE,
    },
];

/// Menu entries visible to `role`, in menu order. No role sees nothing.
pub fn menu_for(role: Option<Role>) -> Vec<&'static MenuEntry> {
    match role {
        Some(role) => MENU.iter().filter(|entry| entry.permits(role)).collect(),
        None => Vec::new(),
    }
}
