//! Roles and the role configuration table.
//!
//! Each role's behavior differences (team, night action, infection response)
//! live in one static `RoleSpec` table rather than in per-role types, so the
//! night-action view can be a single component parameterized by the local
//! player's role.

use serde::{Deserialize, Serialize};

/// The fixed role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Survivor,
    Infector,
    Investigator,
    Healer,
    Mutant,
}

/// Win-condition team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    Survivors,
    Infected,
}

/// Night actions a role may perform, at most one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NightAction {
    Infect,
    Investigate,
    Heal,
}

/// Static per-role configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSpec {
    pub role: Role,
    pub display_name: &'static str,
    pub team: Team,
    pub night_action: Option<NightAction>,
    /// A mutant joins the infected team when infected instead of dying.
    pub converts_on_infection: bool,
}

const ROLE_SPECS: [RoleSpec; 5] = [
    RoleSpec {
        role: Role::Survivor,
        display_name: "Survivor",
        team: Team::Survivors,
        night_action: None,
        converts_on_infection: false,
    },
    RoleSpec {
        role: Role::Infector,
        display_name: "Infector",
        team: Team::Infected,
        night_action: Some(NightAction::Infect),
        converts_on_infection: false,
    },
    RoleSpec {
        role: Role::Investigator,
        display_name: "Investigator",
        team: Team::Survivors,
        night_action: Some(NightAction::Investigate),
        converts_on_infection: false,
    },
    RoleSpec {
        role: Role::Healer,
        display_name: "Healer",
        team: Team::Survivors,
        night_action: Some(NightAction::Heal),
        converts_on_infection: false,
    },
    RoleSpec {
        role: Role::Mutant,
        display_name: "Mutant",
        team: Team::Survivors,
        night_action: None,
        converts_on_infection: true,
    },
];

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Survivor,
        Role::Infector,
        Role::Investigator,
        Role::Healer,
        Role::Mutant,
    ];

    pub fn spec(self) -> &'static RoleSpec {
        &ROLE_SPECS[self as usize]
    }

    pub fn team(self) -> Team {
        self.spec().team
    }

    pub fn night_action(self) -> Option<NightAction> {
        self.spec().night_action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_table_rows_match_their_role() {
        for role in Role::ALL {
            assert_eq!(role.spec().role, role);
        }
    }

    #[test]
    fn only_the_infector_is_infected_at_start() {
        let infected: Vec<_> = Role::ALL
            .iter()
            .filter(|r| r.team() == Team::Infected)
            .collect();
        assert_eq!(infected, vec![&Role::Infector]);
    }

    #[test]
    fn mutant_converts_instead_of_acting() {
        let spec = Role::Mutant.spec();
        assert!(spec.converts_on_infection);
        assert!(spec.night_action.is_none());
    }
}
