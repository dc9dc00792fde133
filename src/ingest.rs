use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction};
use serde::Serialize;

use crate::classify::{self, TeamRole};
use crate::error::{StatsError, Step};
use crate::events::{MatchMetadata, RawEvent};
use crate::goals::{self, GoalEvent};
use crate::lineups;
use crate::match_stats;
use crate::player_stats::{self, PlayerMatchLine};
use crate::ratings;
use crate::season;
use crate::store;
use crate::team_resolver;

/// Season recomputes for one club (and its players) must never race, so
/// each club name hands out a single lock held for the whole run.
#[derive(Default)]
pub struct EntityLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_club(&self, club_name: &str) -> Arc<Mutex<()>> {
        let key = club_name.trim().to_lowercase();
        let mut guard = self.inner.lock().expect("entity lock registry poisoned");
        guard.entry(key).or_default().clone()
    }
}

/// What the caller gets back from a committed run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub match_id: i64,
    pub events_inserted: usize,
    pub goals_recorded: usize,
    pub players_updated: usize,
    pub warnings: Vec<String>,
}

/// Ingests one uploaded match as a single atomic unit. Every write happens
/// inside one transaction; any step failure rolls the whole run back and
/// surfaces the step name through the error.
pub fn ingest_match(
    conn: &mut Connection,
    locks: &EntityLocks,
    club_name: &str,
    meta: &MatchMetadata,
    events: Vec<RawEvent>,
) -> Result<IngestSummary, StatsError> {
    let lock = locks.for_club(club_name);
    let _serialized = lock.lock().expect("club ingest lock poisoned");

    let started_at = Utc::now().to_rfc3339();
    info!(
        "ingesting match vs '{}' at {} for club '{club_name}' ({} events)",
        meta.opponent_name,
        meta.kickoff_utc,
        events.len()
    );

    let (club_id, summary) = {
        let tx = conn
            .transaction()
            .map_err(StatsError::storage(Step::ResolveTeams))?;
        // The club row itself is part of the run: a failed first upload must
        // not leave a half-created club behind.
        let club = store::get_or_create_club(&tx, club_name)
            .map_err(StatsError::storage(Step::ResolveTeams))?;
        let summary = run_pipeline(&tx, &club, meta, events)?;
        tx.commit()
            .map_err(StatsError::storage(Step::RecomputePlayerSeason))?;
        (club.club_id, summary)
    };

    if let Err(err) = store::record_ingest_run(
        conn,
        club_id,
        summary.match_id,
        &started_at,
        summary.events_inserted,
        summary.goals_recorded,
        summary.players_updated,
        &summary.warnings,
    ) {
        warn!("failed to record ingest audit row: {err}");
    }

    info!(
        "match {} committed: {} events, {} goals, {} player profiles touched",
        summary.match_id, summary.events_inserted, summary.goals_recorded, summary.players_updated
    );
    Ok(summary)
}

fn run_pipeline(
    tx: &Transaction<'_>,
    club: &store::ClubRow,
    meta: &MatchMetadata,
    events: Vec<RawEvent>,
) -> Result<IngestSummary, StatsError> {
    // resolve-teams
    let sides = lineups::lineup_sides(&events)?;
    let resolved = team_resolver::resolve_teams(&club.name, club.provider_team_id, sides)?;
    debug!(
        "resolved our team '{}' (id {}) vs '{}' (id {})",
        resolved.ours.name, resolved.ours.id, resolved.opponent.name, resolved.opponent.id
    );
    if club.provider_team_id != Some(resolved.ours.id) {
        store::set_club_provider_team_id(tx, club.club_id, resolved.ours.id)
            .map_err(StatsError::storage(Step::ResolveTeams))?;
    }
    let classified = classify::classify_events(events, &resolved);

    // get-or-create-opponent
    let opponent = store::get_or_create_opponent(tx, &meta.opponent_name)
        .map_err(StatsError::storage(Step::GetOrCreateOpponent))?;

    // create-match-record: duplicate check plus the fatal declared-vs-derived
    // score cross-check.
    let goal_list = goals::extract_goals(&classified);
    if store::match_exists(tx, club.club_id, &meta.kickoff_utc)
        .map_err(StatsError::storage(Step::CreateMatchRecord))?
    {
        return Err(StatsError::conflict(format!(
            "match for club '{}' at {} already ingested",
            club.name, meta.kickoff_utc
        )));
    }
    let derived_our = goals::goal_count(&goal_list, TeamRole::Ours) as u32;
    let derived_opponent = goals::goal_count(&goal_list, TeamRole::Opponent) as u32;
    check_declared_score(meta, derived_our, derived_opponent)?;
    let match_id = store::insert_match(
        tx,
        club.club_id,
        opponent.opponent_id,
        &meta.kickoff_utc,
        meta.home,
        derived_our,
        derived_opponent,
        meta.score_text.as_deref(),
    )
    .map_err(StatsError::storage(Step::CreateMatchRecord))?;

    // extract-our-lineup / extract-opponent-lineup
    let our_lineup = lineups::lineup_for_role(&classified, TeamRole::Ours, Step::ExtractOurLineup)?;
    let opponent_lineup =
        lineups::lineup_for_role(&classified, TeamRole::Opponent, Step::ExtractOpponentLineup)?;

    // build-lineup-rows
    let mut players_updated = 0usize;
    let mut by_ref: HashMap<i64, i64> = HashMap::new();
    let mut by_name: HashMap<String, i64> = HashMap::new();
    let mut lineup_rows = Vec::with_capacity(lineups::LINEUP_SIZE * 2);
    for (idx, slot) in our_lineup.lineup.iter().enumerate() {
        let profile = store::resolve_club_player(
            tx,
            club.club_id,
            slot.player_id,
            &slot.player_name,
            slot.jersey,
            slot.position.as_deref(),
        )
        .map_err(StatsError::storage(Step::BuildLineupRows))?;
        if profile.created || profile.updated {
            players_updated += 1;
        }
        if let Some(provider_ref) = slot.player_id {
            by_ref.insert(provider_ref, profile.id);
        }
        by_name.insert(slot.player_name.trim().to_lowercase(), profile.id);
        lineup_rows.push(store::LineupRowInsert {
            role: TeamRole::Ours,
            slot: idx as u32,
            player_name: slot.player_name.clone(),
            jersey: slot.jersey,
            position: slot.position.clone(),
            player_id: Some(profile.id),
            opponent_player_id: None,
        });
    }
    for (idx, slot) in opponent_lineup.lineup.iter().enumerate() {
        let profile = store::resolve_opponent_player(
            tx,
            opponent.opponent_id,
            slot.player_id,
            &slot.player_name,
            slot.jersey,
            slot.position.as_deref(),
        )
        .map_err(StatsError::storage(Step::BuildLineupRows))?;
        lineup_rows.push(store::LineupRowInsert {
            role: TeamRole::Opponent,
            slot: idx as u32,
            player_name: slot.player_name.clone(),
            jersey: slot.jersey,
            position: slot.position.clone(),
            player_id: None,
            opponent_player_id: Some(profile.id),
        });
    }
    store::insert_lineup_rows(tx, match_id, &lineup_rows)
        .map_err(StatsError::storage(Step::BuildLineupRows))?;

    // bulk-insert-events
    let events_inserted = store::bulk_insert_events(tx, match_id, &classified)
        .map_err(StatsError::storage(Step::BulkInsertEvents))?;

    // extract-goals
    store::insert_goals(tx, match_id, &goal_list)
        .map_err(StatsError::storage(Step::ExtractGoals))?;

    // compute-match-statistics
    let (our_line, opponent_line) = match_stats::compute_match_statistics(&classified);
    store::insert_match_stat_line(tx, match_id, TeamRole::Ours, &our_line)
        .map_err(StatsError::storage(Step::ComputeMatchStatistics))?;
    store::insert_match_stat_line(tx, match_id, TeamRole::Opponent, &opponent_line)
        .map_err(StatsError::storage(Step::ComputeMatchStatistics))?;

    // compute-player-statistics
    let player_lines = player_stats::compute_player_statistics(&classified, &goal_list, our_lineup);
    let mut roster_ids = Vec::with_capacity(player_lines.len());
    for line in &player_lines {
        let player_id = resolve_line_player(
            tx,
            club.club_id,
            line,
            &by_ref,
            &by_name,
            &mut players_updated,
        )?;
        store::insert_player_match_line(tx, match_id, player_id, line)
            .map_err(StatsError::storage(Step::ComputePlayerStatistics))?;
        roster_ids.push(player_id);
    }

    // recompute-club-season
    recompute_club_season(tx, club.club_id)?;

    // recompute-player-season
    for player_id in &roster_ids {
        recompute_player_season(tx, *player_id)?;
    }

    Ok(IngestSummary {
        match_id,
        events_inserted,
        goals_recorded: goal_list.len(),
        players_updated,
        warnings: collect_warnings(meta, &goal_list),
    })
}

/// Full season recompute from match-level truth; the overwrite makes a
/// second call with no new matches byte-identical.
pub fn recompute_club_season(
    conn: &Connection,
    club_id: i64,
) -> Result<season::ClubSeasonTotals, StatsError> {
    if !store::club_exists(conn, club_id)
        .map_err(StatsError::storage(Step::RecomputeClubSeason))?
    {
        return Err(StatsError::not_found(
            Step::RecomputeClubSeason,
            format!("club {club_id}"),
        ));
    }
    let rows = store::load_club_match_rows(conn, club_id)
        .map_err(StatsError::storage(Step::RecomputeClubSeason))?;
    let totals = season::aggregate_club_season(&rows);
    store::upsert_club_season(conn, club_id, &totals)
        .map_err(StatsError::storage(Step::RecomputeClubSeason))?;
    Ok(totals)
}

pub fn recompute_player_season(
    conn: &Connection,
    player_id: i64,
) -> Result<season::PlayerSeasonTotals, StatsError> {
    if !store::player_exists(conn, player_id)
        .map_err(StatsError::storage(Step::RecomputePlayerSeason))?
    {
        return Err(StatsError::not_found(
            Step::RecomputePlayerSeason,
            format!("player {player_id}"),
        ));
    }
    let rows = store::load_player_match_lines(conn, player_id)
        .map_err(StatsError::storage(Step::RecomputePlayerSeason))?;
    let totals = season::aggregate_player_season(&rows);
    let ratings = ratings::compute_attribute_ratings(&totals);
    store::upsert_player_season(conn, player_id, &totals, &ratings)
        .map_err(StatsError::storage(Step::RecomputePlayerSeason))?;
    Ok(totals)
}

fn check_declared_score(
    meta: &MatchMetadata,
    derived_our: u32,
    derived_opponent: u32,
) -> Result<(), StatsError> {
    let declared_our = meta.declared_our_score();
    let declared_opponent = meta.declared_opponent_score();
    if declared_our != derived_our {
        return Err(StatsError::validation(
            Step::CreateMatchRecord,
            format!(
                "declared our-side score {declared_our} does not match derived goal count {derived_our}"
            ),
        ));
    }
    if declared_opponent != derived_opponent {
        return Err(StatsError::validation(
            Step::CreateMatchRecord,
            format!(
                "declared opponent score {declared_opponent} does not match derived goal count {derived_opponent}"
            ),
        ));
    }
    Ok(())
}

fn resolve_line_player(
    tx: &Transaction<'_>,
    club_id: i64,
    line: &PlayerMatchLine,
    by_ref: &HashMap<i64, i64>,
    by_name: &HashMap<String, i64>,
    players_updated: &mut usize,
) -> Result<i64, StatsError> {
    if let Some(provider_ref) = line.provider_player_id {
        if let Some(player_id) = by_ref.get(&provider_ref) {
            return Ok(*player_id);
        }
    }
    if let Some(player_id) = by_name.get(&line.player_name.trim().to_lowercase()) {
        return Ok(*player_id);
    }
    // Participants who were not in the starting lineup (substitutes) still
    // resolve through the directory.
    let profile = store::resolve_club_player(
        tx,
        club_id,
        line.provider_player_id,
        &line.player_name,
        None,
        None,
    )
    .map_err(StatsError::storage(Step::ComputePlayerStatistics))?;
    if profile.created || profile.updated {
        *players_updated += 1;
    }
    Ok(profile.id)
}

/// Non-fatal consistency notes. A free-text score that disagrees with the
/// validated running score is reported but never blocks ingestion; shoot-out
/// results routinely inflate the submitted text.
fn collect_warnings(meta: &MatchMetadata, goal_list: &[GoalEvent]) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(text) = meta.score_text.as_deref() {
        if let Some((home, away)) = parse_score_pair(text) {
            if (home, away) != (meta.declared_home_score, meta.declared_away_score) {
                warnings.push(format!(
                    "score text '{text}' disagrees with declared score {}-{}",
                    meta.declared_home_score, meta.declared_away_score
                ));
            }
        }
    }
    if goal_list
        .iter()
        .any(|g| g.scorer == goals::UNKNOWN_SCORER)
    {
        warnings.push("one or more goals have no scorer attribution".to_string());
    }
    warnings
}

pub fn parse_score_pair(raw: &str) -> Option<(u32, u32)> {
    let mut nums = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let home = nums.next()?;
    let away = nums.next()?;
    Some((home, away))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_score_pair_works() {
        assert_eq!(parse_score_pair("2-1"), Some((2, 1)));
        assert_eq!(parse_score_pair("FT 0 : 0"), Some((0, 0)));
        assert_eq!(parse_score_pair("ab"), None);
    }

    #[test]
    fn entity_locks_hand_out_one_lock_per_club() {
        let locks = EntityLocks::new();
        let a = locks.for_club("Thunder United");
        let b = locks.for_club(" thunder united ");
        let c = locks.for_club("City Strikers");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn declared_score_mismatch_names_both_values() {
        let meta = MatchMetadata {
            opponent_name: "City Strikers".to_string(),
            kickoff_utc: "2025-09-14T15:00:00Z".to_string(),
            home: true,
            declared_home_score: 2,
            declared_away_score: 1,
            score_text: None,
        };
        let err = check_declared_score(&meta, 1, 1).expect_err("mismatch should fail");
        let msg = err.to_string();
        assert!(msg.contains('2'));
        assert!(msg.contains('1'));
        assert_eq!(err.step(), Some(Step::CreateMatchRecord));
    }

    #[test]
    fn away_fixture_maps_declared_score() {
        let meta = MatchMetadata {
            opponent_name: "City Strikers".to_string(),
            kickoff_utc: "2025-09-14T15:00:00Z".to_string(),
            home: false,
            declared_home_score: 3,
            declared_away_score: 1,
            score_text: None,
        };
        assert_eq!(meta.declared_our_score(), 1);
        assert_eq!(meta.declared_opponent_score(), 3);
        check_declared_score(&meta, 1, 3).expect("swapped mapping should validate");
    }

    #[test]
    fn score_text_disagreement_is_a_warning_not_an_error() {
        let meta = MatchMetadata {
            opponent_name: "City Strikers".to_string(),
            kickoff_utc: "2025-09-14T15:00:00Z".to_string(),
            home: true,
            declared_home_score: 1,
            declared_away_score: 1,
            score_text: Some("4-3 pens".to_string()),
        };
        let warnings = collect_warnings(&meta, &[]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("4-3 pens"));
    }
}
