use crate::classify::{ClassifiedEvent, TeamRole};
use crate::error::{StatsError, Step};
use crate::events::{EventPayload, LineupDetail, RawEvent};
use crate::team_resolver::TeamSide;

/// Declared starting lineup size per side.
pub const LINEUP_SIZE: usize = 11;

/// Pulls the two sides named by the batch's starting-lineup events, before
/// any team-role is known. Exactly two lineup events from two distinct teams
/// are required.
pub fn lineup_sides(events: &[RawEvent]) -> Result<[TeamSide; 2], StatsError> {
    let mut sides: Vec<TeamSide> = Vec::with_capacity(2);
    for event in events {
        if !matches!(event.payload, EventPayload::StartingLineup(_)) {
            continue;
        }
        if sides.iter().any(|s| s.id == event.team.id) {
            return Err(StatsError::validation(
                Step::ResolveTeams,
                format!(
                    "duplicate starting lineup for team '{}'",
                    event.team.name
                ),
            ));
        }
        sides.push(TeamSide {
            id: event.team.id,
            name: event.team.name.clone(),
        });
    }
    match <[TeamSide; 2]>::try_from(sides) {
        Ok(pair) => Ok(pair),
        Err(found) => Err(StatsError::validation(
            Step::ResolveTeams,
            format!("expected 2 starting lineups, found {}", found.len()),
        )),
    }
}

/// The one starting lineup declared for `role`, validated to list exactly
/// [`LINEUP_SIZE`] players. The step tag tells the caller which side failed.
pub fn lineup_for_role<'a>(
    events: &'a [ClassifiedEvent],
    role: TeamRole,
    step: Step,
) -> Result<&'a LineupDetail, StatsError> {
    let mut found: Option<&LineupDetail> = None;
    let mut count = 0usize;
    for ev in events {
        if ev.role != role {
            continue;
        }
        if let EventPayload::StartingLineup(detail) = &ev.event.payload {
            count += 1;
            found = Some(detail);
        }
    }
    if count != 1 {
        return Err(StatsError::validation(
            step,
            format!(
                "expected 1 starting lineup for {}, found {count}",
                role.as_str()
            ),
        ));
    }
    let detail = found.expect("count == 1 implies a lineup");
    if detail.lineup.len() != LINEUP_SIZE {
        return Err(StatsError::validation(
            step,
            format!(
                "starting lineup for {} lists {} players, expected {LINEUP_SIZE}",
                role.as_str(),
                detail.lineup.len()
            ),
        ));
    }
    Ok(detail)
}
