use strsim::jaro_winkler;

use crate::error::{StatsError, Step};

/// Similarity a fuzzy candidate must exceed before it can win.
pub const FUZZY_ACCEPT_RATIO: f64 = 0.80;

/// One of the two anonymous sides found in the batch's starting lineups.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSide {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    StoredId,
    Exact,
    Substring,
    Fuzzy,
}

#[derive(Debug, Clone)]
pub struct ResolvedTeams {
    pub ours: TeamSide,
    pub opponent: TeamSide,
    pub matched_by: MatchRule,
}

/// Decides which of the two sides is our club. Priority: a previously
/// persisted team id, case-insensitive exact name, substring in either
/// direction, then similarity ratio above [`FUZZY_ACCEPT_RATIO`] taking the
/// larger of the two candidates.
pub fn resolve_teams(
    club_name: &str,
    stored_team_id: Option<i64>,
    sides: [TeamSide; 2],
) -> Result<ResolvedTeams, StatsError> {
    let [a, b] = sides;

    if let Some(stored) = stored_team_id {
        if a.id == stored {
            return Ok(resolved(a, b, MatchRule::StoredId));
        }
        if b.id == stored {
            return Ok(resolved(b, a, MatchRule::StoredId));
        }
    }

    let club = normalize(club_name);
    let name_a = normalize(&a.name);
    let name_b = normalize(&b.name);

    if club == name_a {
        return Ok(resolved(a, b, MatchRule::Exact));
    }
    if club == name_b {
        return Ok(resolved(b, a, MatchRule::Exact));
    }

    if contains_either_way(&club, &name_a) {
        return Ok(resolved(a, b, MatchRule::Substring));
    }
    if contains_either_way(&club, &name_b) {
        return Ok(resolved(b, a, MatchRule::Substring));
    }

    let ratio_a = jaro_winkler(&club, &name_a);
    let ratio_b = jaro_winkler(&club, &name_b);
    if ratio_a > FUZZY_ACCEPT_RATIO && ratio_a > ratio_b {
        return Ok(resolved(a, b, MatchRule::Fuzzy));
    }
    if ratio_b > FUZZY_ACCEPT_RATIO && ratio_b > ratio_a {
        return Ok(resolved(b, a, MatchRule::Fuzzy));
    }

    Err(StatsError::validation(
        Step::ResolveTeams,
        format!(
            "no resolvable team for club '{club_name}': saw '{}' and '{}'",
            a.name, b.name
        ),
    ))
}

fn resolved(ours: TeamSide, opponent: TeamSide, matched_by: MatchRule) -> ResolvedTeams {
    ResolvedTeams {
        ours,
        opponent,
        matched_by,
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn contains_either_way(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}
