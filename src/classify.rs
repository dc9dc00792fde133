use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::events::{BallRecoveryDetail, DribbleDetail, DuelDetail, PassDetail, RawEvent, Tag};
use crate::team_resolver::ResolvedTeams;

/// Outcomes that leave a shot on target.
static ON_TARGET_OUTCOMES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["goal", "saved", "saved to post", "post"]));

/// Outcomes that put a shot off target.
static OFF_TARGET_OUTCOMES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["off t", "wayward", "blocked", "saved off target"]));

/// Outcomes where the keeper got a hand to the shot; these feed the other
/// side's save count.
static SAVED_OUTCOMES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["saved", "saved to post", "saved off target"]));

/// Duel outcomes that count a tackle as won.
static TACKLE_SUCCESS_OUTCOMES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["won", "success", "success in play", "success out"]));

/// Restart pass types excluded from the pass denominator entirely.
static RESTART_PASS_TYPES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["throw-in", "goal kick", "corner", "kick off"]));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamRole {
    Ours,
    Opponent,
}

impl TeamRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamRole::Ours => "our_team",
            TeamRole::Opponent => "opponent_team",
        }
    }

    pub fn other(self) -> TeamRole {
        match self {
            TeamRole::Ours => TeamRole::Opponent,
            TeamRole::Opponent => TeamRole::Ours,
        }
    }
}

/// A raw event annotated with the resolved team-roles. Derived once per
/// ingestion, never persisted on its own.
#[derive(Debug, Clone)]
pub struct ClassifiedEvent {
    pub role: TeamRole,
    pub possession_role: Option<TeamRole>,
    pub event: RawEvent,
}

impl ClassifiedEvent {
    pub fn in_shootout(&self) -> bool {
        self.event.in_shootout()
    }
}

/// Single pass over the batch: attach the acting team-role and the
/// possession team-role to every event. Shoot-out events are retained here
/// and filtered by every downstream aggregate.
pub fn classify_events(events: Vec<RawEvent>, teams: &ResolvedTeams) -> Vec<ClassifiedEvent> {
    events
        .into_iter()
        .map(|event| {
            let role = if event.team.id == teams.ours.id {
                TeamRole::Ours
            } else {
                TeamRole::Opponent
            };
            let possession_role = event.possession_team.as_ref().and_then(|t| {
                if t.id == teams.ours.id {
                    Some(TeamRole::Ours)
                } else if t.id == teams.opponent.id {
                    Some(TeamRole::Opponent)
                } else {
                    None
                }
            });
            ClassifiedEvent {
                role,
                possession_role,
                event,
            }
        })
        .collect()
}

fn outcome_in(outcome: Option<&Tag>, set: &HashSet<&'static str>) -> bool {
    outcome.is_some_and(|tag| set.contains(tag.name.trim().to_ascii_lowercase().as_str()))
}

pub fn shot_is_goal(outcome: Option<&Tag>) -> bool {
    outcome.is_some_and(|tag| tag.is("Goal"))
}

pub fn shot_on_target(outcome: Option<&Tag>) -> bool {
    outcome_in(outcome, &ON_TARGET_OUTCOMES)
}

pub fn shot_off_target(outcome: Option<&Tag>) -> bool {
    outcome_in(outcome, &OFF_TARGET_OUTCOMES)
}

pub fn shot_saved(outcome: Option<&Tag>) -> bool {
    outcome_in(outcome, &SAVED_OUTCOMES)
}

/// Restart passes (throw-ins, goal kicks, corners) never enter the pass
/// denominator.
pub fn pass_is_restart(detail: &PassDetail) -> bool {
    detail
        .pass_type
        .as_ref()
        .is_some_and(|tag| RESTART_PASS_TYPES.contains(tag.name.trim().to_ascii_lowercase().as_str()))
}

/// A pass without a failure outcome is complete.
pub fn pass_completed(detail: &PassDetail) -> bool {
    detail.outcome.is_none()
}

pub fn dribble_completed(detail: &DribbleDetail) -> bool {
    detail.outcome.as_ref().is_some_and(|tag| tag.is("Complete"))
}

pub fn duel_is_tackle(detail: &DuelDetail) -> bool {
    detail
        .duel_type
        .as_ref()
        .is_some_and(|tag| tag.name.to_ascii_lowercase().contains("tackle"))
}

pub fn tackle_won(detail: &DuelDetail) -> bool {
    outcome_in(detail.outcome.as_ref(), &TACKLE_SUCCESS_OUTCOMES)
}

pub fn recovery_counts(detail: &BallRecoveryDetail) -> bool {
    !detail.recovery_failure
}
