use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::classify::{ClassifiedEvent, TeamRole};
use crate::goals::GoalEvent;
use crate::match_stats::MatchStatLine;
use crate::player_stats::PlayerMatchLine;
use crate::ratings::AttributeRatings;
use crate::season::{ClubMatchRow, ClubSeasonTotals, PlayerSeasonTotals};

const CACHE_DIR: &str = "clubstats";
const DB_FILE: &str = "stats.sqlite";

/// Raw events are written in bounded batches to keep statement churn and
/// memory flat for large uploads.
pub const EVENT_INSERT_CHUNK: usize = 500;

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(DB_FILE),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS clubs (
            club_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            provider_team_id INTEGER NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY AUTOINCREMENT,
            club_id INTEGER NOT NULL REFERENCES clubs(club_id),
            name TEXT NOT NULL,
            jersey INTEGER NULL,
            position TEXT NULL,
            provider_ref INTEGER NULL,
            claimed INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_players_club ON players(club_id);
        CREATE INDEX IF NOT EXISTS idx_players_provider ON players(club_id, provider_ref);

        CREATE TABLE IF NOT EXISTS opponents (
            opponent_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            provider_team_id INTEGER NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS opponent_players (
            opponent_player_id INTEGER PRIMARY KEY AUTOINCREMENT,
            opponent_id INTEGER NOT NULL REFERENCES opponents(opponent_id),
            name TEXT NOT NULL,
            jersey INTEGER NULL,
            position TEXT NULL,
            provider_ref INTEGER NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_opponent_players ON opponent_players(opponent_id);

        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY AUTOINCREMENT,
            club_id INTEGER NOT NULL REFERENCES clubs(club_id),
            opponent_id INTEGER NOT NULL REFERENCES opponents(opponent_id),
            kickoff_utc TEXT NOT NULL,
            home INTEGER NOT NULL,
            our_score INTEGER NOT NULL,
            opponent_score INTEGER NOT NULL,
            score_text TEXT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(club_id, kickoff_utc)
        );

        CREATE TABLE IF NOT EXISTS match_events (
            event_row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id INTEGER NOT NULL REFERENCES matches(match_id),
            seq INTEGER NOT NULL,
            team_role TEXT NOT NULL,
            event_type TEXT NOT NULL,
            period INTEGER NOT NULL,
            event_json TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_match_events ON match_events(match_id, seq);

        CREATE TABLE IF NOT EXISTS goals (
            goal_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id INTEGER NOT NULL REFERENCES matches(match_id),
            team_role TEXT NOT NULL,
            scorer TEXT NOT NULL,
            assist TEXT NULL,
            period INTEGER NOT NULL,
            minute INTEGER NOT NULL,
            second INTEGER NOT NULL,
            shot_type TEXT NULL,
            body_part TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_goals_match ON goals(match_id);

        CREATE TABLE IF NOT EXISTS lineups (
            lineup_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id INTEGER NOT NULL REFERENCES matches(match_id),
            team_role TEXT NOT NULL,
            slot INTEGER NOT NULL,
            player_name TEXT NOT NULL,
            jersey INTEGER NULL,
            position TEXT NULL,
            player_id INTEGER NULL REFERENCES players(player_id),
            opponent_player_id INTEGER NULL REFERENCES opponent_players(opponent_player_id),
            UNIQUE(match_id, team_role, slot)
        );

        CREATE TABLE IF NOT EXISTS match_stats (
            match_id INTEGER NOT NULL REFERENCES matches(match_id),
            team_role TEXT NOT NULL,
            possession_pct REAL NULL,
            expected_goals REAL NULL,
            shots INTEGER NULL,
            shots_on_target INTEGER NULL,
            shots_off_target INTEGER NULL,
            saves INTEGER NULL,
            passes_attempted INTEGER NULL,
            passes_completed INTEGER NULL,
            pass_accuracy_pct REAL NULL,
            final_third_passes INTEGER NULL,
            long_passes INTEGER NULL,
            crosses INTEGER NULL,
            dribbles INTEGER NULL,
            dribbles_complete INTEGER NULL,
            dribble_success_pct REAL NULL,
            tackles INTEGER NULL,
            tackle_success_pct REAL NULL,
            interceptions INTEGER NULL,
            ball_recoveries INTEGER NULL,
            PRIMARY KEY (match_id, team_role)
        );

        CREATE TABLE IF NOT EXISTS player_match_stats (
            match_id INTEGER NOT NULL REFERENCES matches(match_id),
            player_id INTEGER NOT NULL REFERENCES players(player_id),
            goals INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            expected_goals REAL NULL,
            shots INTEGER NULL,
            shots_on_target INTEGER NULL,
            shots_off_target INTEGER NULL,
            passes_attempted INTEGER NULL,
            passes_completed INTEGER NULL,
            pass_accuracy_pct REAL NULL,
            final_third_passes INTEGER NULL,
            long_passes INTEGER NULL,
            short_passes INTEGER NULL,
            crosses INTEGER NULL,
            dribbles INTEGER NULL,
            dribbles_complete INTEGER NULL,
            dribble_success_pct REAL NULL,
            tackles INTEGER NULL,
            tackle_success_pct REAL NULL,
            interceptions INTEGER NULL,
            ball_recoveries INTEGER NULL,
            PRIMARY KEY (match_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS club_season_stats (
            club_id INTEGER PRIMARY KEY REFERENCES clubs(club_id),
            matches_played INTEGER NOT NULL,
            wins INTEGER NOT NULL,
            draws INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            goals_scored INTEGER NOT NULL,
            goals_conceded INTEGER NOT NULL,
            shots INTEGER NULL,
            shots_on_target INTEGER NULL,
            shots_per_game REAL NULL,
            expected_goals REAL NULL,
            avg_possession_pct REAL NULL,
            pass_accuracy_pct REAL NULL,
            tackles INTEGER NULL,
            tackle_success_pct REAL NULL,
            dribble_success_pct REAL NULL,
            interceptions INTEGER NULL,
            ball_recoveries INTEGER NULL
        );

        CREATE TABLE IF NOT EXISTS player_season_stats (
            player_id INTEGER PRIMARY KEY REFERENCES players(player_id),
            matches_played INTEGER NOT NULL,
            goals INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            shots INTEGER NULL,
            shots_on_target INTEGER NULL,
            shots_per_game REAL NULL,
            expected_goals REAL NULL,
            pass_accuracy_pct REAL NULL,
            dribbles_per_game REAL NULL,
            dribble_success_pct REAL NULL,
            tackles INTEGER NULL,
            tackles_per_game REAL NULL,
            tackle_success_pct REAL NULL,
            interceptions INTEGER NULL,
            interceptions_per_game REAL NULL,
            ball_recoveries INTEGER NULL,
            attacking INTEGER NOT NULL,
            technique INTEGER NOT NULL,
            tactical INTEGER NOT NULL,
            defending INTEGER NOT NULL,
            creativity INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            club_id INTEGER NOT NULL,
            match_id INTEGER NOT NULL,
            events_inserted INTEGER NOT NULL,
            goals_recorded INTEGER NOT NULL,
            players_updated INTEGER NOT NULL,
            warnings_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ClubRow {
    pub club_id: i64,
    pub name: String,
    pub provider_team_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct OpponentRow {
    pub opponent_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedProfile {
    pub id: i64,
    pub created: bool,
    pub updated: bool,
}

pub fn get_or_create_club(conn: &Connection, name: &str) -> rusqlite::Result<ClubRow> {
    let existing = conn
        .query_row(
            "SELECT club_id, name, provider_team_id FROM clubs WHERE LOWER(name) = LOWER(?1)",
            params![name.trim()],
            |row| {
                Ok(ClubRow {
                    club_id: row.get(0)?,
                    name: row.get(1)?,
                    provider_team_id: row.get(2)?,
                })
            },
        )
        .optional()?;
    if let Some(club) = existing {
        return Ok(club);
    }
    conn.execute(
        "INSERT INTO clubs(name, provider_team_id, created_at) VALUES (?1, NULL, ?2)",
        params![name.trim(), Utc::now().to_rfc3339()],
    )?;
    Ok(ClubRow {
        club_id: conn.last_insert_rowid(),
        name: name.trim().to_string(),
        provider_team_id: None,
    })
}

/// Persists the resolved provider team id on the club so later uploads
/// match by id and skip fuzzy name matching.
pub fn set_club_provider_team_id(
    conn: &Connection,
    club_id: i64,
    team_id: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE clubs SET provider_team_id = ?1 WHERE club_id = ?2",
        params![team_id, club_id],
    )?;
    Ok(())
}

pub fn get_or_create_opponent(conn: &Connection, name: &str) -> rusqlite::Result<OpponentRow> {
    let existing = conn
        .query_row(
            "SELECT opponent_id, name FROM opponents WHERE LOWER(name) = LOWER(?1)",
            params![name.trim()],
            |row| {
                Ok(OpponentRow {
                    opponent_id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    if let Some(opponent) = existing {
        return Ok(opponent);
    }
    conn.execute(
        "INSERT INTO opponents(name, provider_team_id, created_at) VALUES (?1, NULL, ?2)",
        params![name.trim(), Utc::now().to_rfc3339()],
    )?;
    Ok(OpponentRow {
        opponent_id: conn.last_insert_rowid(),
        name: name.trim().to_string(),
    })
}

/// Resolves one lineup slot to an internal player for our club: provider
/// ref first, then name-or-jersey among profiles with no provider link yet,
/// else a fresh unclaimed profile. Profiles claimed by a completed account
/// keep their user-entered fields.
pub fn resolve_club_player(
    conn: &Connection,
    club_id: i64,
    provider_ref: Option<i64>,
    name: &str,
    jersey: Option<u32>,
    position: Option<&str>,
) -> rusqlite::Result<ResolvedProfile> {
    if let Some(provider_ref) = provider_ref {
        let found = conn
            .query_row(
                "SELECT player_id, claimed FROM players
                 WHERE club_id = ?1 AND provider_ref = ?2",
                params![club_id, provider_ref],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? != 0)),
            )
            .optional()?;
        if let Some((player_id, claimed)) = found {
            let updated = !claimed;
            if updated {
                conn.execute(
                    "UPDATE players SET name = ?1, jersey = ?2, position = ?3, updated_at = ?4
                     WHERE player_id = ?5",
                    params![name, jersey, position, Utc::now().to_rfc3339(), player_id],
                )?;
            }
            return Ok(ResolvedProfile {
                id: player_id,
                created: false,
                updated,
            });
        }
    }

    let unlinked = conn
        .query_row(
            "SELECT player_id, claimed FROM players
             WHERE club_id = ?1 AND provider_ref IS NULL
               AND (LOWER(name) = LOWER(?2) OR (?3 IS NOT NULL AND jersey = ?3))
             ORDER BY player_id
             LIMIT 1",
            params![club_id, name, jersey],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? != 0)),
        )
        .optional()?;
    if let Some((player_id, claimed)) = unlinked {
        if claimed {
            // Link the external ref but preserve the user-entered fields.
            conn.execute(
                "UPDATE players SET provider_ref = ?1, updated_at = ?2 WHERE player_id = ?3",
                params![provider_ref, Utc::now().to_rfc3339(), player_id],
            )?;
        } else {
            conn.execute(
                "UPDATE players
                 SET provider_ref = ?1, name = ?2, jersey = ?3, position = ?4, updated_at = ?5
                 WHERE player_id = ?6",
                params![
                    provider_ref,
                    name,
                    jersey,
                    position,
                    Utc::now().to_rfc3339(),
                    player_id
                ],
            )?;
        }
        return Ok(ResolvedProfile {
            id: player_id,
            created: false,
            updated: true,
        });
    }

    conn.execute(
        "INSERT INTO players(club_id, name, jersey, position, provider_ref, claimed, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        params![
            club_id,
            name,
            jersey,
            position,
            provider_ref,
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(ResolvedProfile {
        id: conn.last_insert_rowid(),
        created: true,
        updated: false,
    })
}

/// Opponent variant of the slot resolution; same matching ladder, no
/// claimed-account concept.
pub fn resolve_opponent_player(
    conn: &Connection,
    opponent_id: i64,
    provider_ref: Option<i64>,
    name: &str,
    jersey: Option<u32>,
    position: Option<&str>,
) -> rusqlite::Result<ResolvedProfile> {
    if let Some(provider_ref) = provider_ref {
        let found = conn
            .query_row(
                "SELECT opponent_player_id FROM opponent_players
                 WHERE opponent_id = ?1 AND provider_ref = ?2",
                params![opponent_id, provider_ref],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        if let Some(id) = found {
            conn.execute(
                "UPDATE opponent_players SET name = ?1, jersey = ?2, position = ?3, updated_at = ?4
                 WHERE opponent_player_id = ?5",
                params![name, jersey, position, Utc::now().to_rfc3339(), id],
            )?;
            return Ok(ResolvedProfile {
                id,
                created: false,
                updated: true,
            });
        }
    }

    let unlinked = conn
        .query_row(
            "SELECT opponent_player_id FROM opponent_players
             WHERE opponent_id = ?1 AND provider_ref IS NULL
               AND (LOWER(name) = LOWER(?2) OR (?3 IS NOT NULL AND jersey = ?3))
             ORDER BY opponent_player_id
             LIMIT 1",
            params![opponent_id, name, jersey],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if let Some(id) = unlinked {
        conn.execute(
            "UPDATE opponent_players
             SET provider_ref = ?1, name = ?2, jersey = ?3, position = ?4, updated_at = ?5
             WHERE opponent_player_id = ?6",
            params![
                provider_ref,
                name,
                jersey,
                position,
                Utc::now().to_rfc3339(),
                id
            ],
        )?;
        return Ok(ResolvedProfile {
            id,
            created: false,
            updated: true,
        });
    }

    conn.execute(
        "INSERT INTO opponent_players(opponent_id, name, jersey, position, provider_ref, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            opponent_id,
            name,
            jersey,
            position,
            provider_ref,
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(ResolvedProfile {
        id: conn.last_insert_rowid(),
        created: true,
        updated: false,
    })
}

pub fn club_exists(conn: &Connection, club_id: i64) -> rusqlite::Result<bool> {
    let found = conn
        .query_row(
            "SELECT club_id FROM clubs WHERE club_id = ?1",
            params![club_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn player_exists(conn: &Connection, player_id: i64) -> rusqlite::Result<bool> {
    let found = conn
        .query_row(
            "SELECT player_id FROM players WHERE player_id = ?1",
            params![player_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn match_exists(conn: &Connection, club_id: i64, kickoff_utc: &str) -> rusqlite::Result<bool> {
    let found = conn
        .query_row(
            "SELECT match_id FROM matches WHERE club_id = ?1 AND kickoff_utc = ?2",
            params![club_id, kickoff_utc],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[allow(clippy::too_many_arguments)]
pub fn insert_match(
    conn: &Connection,
    club_id: i64,
    opponent_id: i64,
    kickoff_utc: &str,
    home: bool,
    our_score: u32,
    opponent_score: u32,
    score_text: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO matches(club_id, opponent_id, kickoff_utc, home, our_score, opponent_score, score_text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            club_id,
            opponent_id,
            kickoff_utc,
            home as i64,
            our_score,
            opponent_score,
            score_text,
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The raw batch is retained verbatim so match statistics stay re-derivable.
pub fn bulk_insert_events(
    conn: &Connection,
    match_id: i64,
    events: &[ClassifiedEvent],
) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO match_events(match_id, seq, team_role, event_type, period, event_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut inserted = 0usize;
    for chunk in events.chunks(EVENT_INSERT_CHUNK) {
        for ev in chunk {
            let json = serde_json::to_string(&ev.event).map_err(|err| {
                rusqlite::Error::ToSqlConversionFailure(Box::new(err))
            })?;
            stmt.execute(params![
                match_id,
                inserted as i64,
                ev.role.as_str(),
                ev.event.event_type.name,
                ev.event.period,
                json
            ])?;
            inserted += 1;
        }
    }
    Ok(inserted)
}

pub fn insert_goals(
    conn: &Connection,
    match_id: i64,
    goals: &[GoalEvent],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO goals(match_id, team_role, scorer, assist, period, minute, second, shot_type, body_part)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for goal in goals {
        stmt.execute(params![
            match_id,
            goal.role.as_str(),
            goal.scorer,
            goal.assist,
            goal.period,
            goal.minute,
            goal.second,
            goal.shot_type,
            goal.body_part
        ])?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LineupRowInsert {
    pub role: TeamRole,
    pub slot: u32,
    pub player_name: String,
    pub jersey: Option<u32>,
    pub position: Option<String>,
    pub player_id: Option<i64>,
    pub opponent_player_id: Option<i64>,
}

pub fn insert_lineup_rows(
    conn: &Connection,
    match_id: i64,
    rows: &[LineupRowInsert],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO lineups(match_id, team_role, slot, player_name, jersey, position, player_id, opponent_player_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for row in rows {
        stmt.execute(params![
            match_id,
            row.role.as_str(),
            row.slot,
            row.player_name,
            row.jersey,
            row.position,
            row.player_id,
            row.opponent_player_id
        ])?;
    }
    Ok(())
}

pub fn insert_match_stat_line(
    conn: &Connection,
    match_id: i64,
    role: TeamRole,
    line: &MatchStatLine,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO match_stats(
            match_id, team_role, possession_pct, expected_goals,
            shots, shots_on_target, shots_off_target, saves,
            passes_attempted, passes_completed, pass_accuracy_pct,
            final_third_passes, long_passes, crosses,
            dribbles, dribbles_complete, dribble_success_pct,
            tackles, tackle_success_pct, interceptions, ball_recoveries
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            match_id,
            role.as_str(),
            line.possession_pct,
            line.expected_goals,
            line.shots,
            line.shots_on_target,
            line.shots_off_target,
            line.saves,
            line.passes_attempted,
            line.passes_completed,
            line.pass_accuracy_pct,
            line.final_third_passes,
            line.long_passes,
            line.crosses,
            line.dribbles,
            line.dribbles_complete,
            line.dribble_success_pct,
            line.tackles,
            line.tackle_success_pct,
            line.interceptions,
            line.ball_recoveries
        ],
    )?;
    Ok(())
}

pub fn insert_player_match_line(
    conn: &Connection,
    match_id: i64,
    player_id: i64,
    line: &PlayerMatchLine,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO player_match_stats(
            match_id, player_id, goals, assists, expected_goals,
            shots, shots_on_target, shots_off_target,
            passes_attempted, passes_completed, pass_accuracy_pct,
            final_third_passes, long_passes, short_passes, crosses,
            dribbles, dribbles_complete, dribble_success_pct,
            tackles, tackle_success_pct, interceptions, ball_recoveries
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
        params![
            match_id,
            player_id,
            line.goals,
            line.assists,
            line.expected_goals,
            line.shots,
            line.shots_on_target,
            line.shots_off_target,
            line.passes_attempted,
            line.passes_completed,
            line.pass_accuracy_pct,
            line.final_third_passes,
            line.long_passes,
            line.short_passes,
            line.crosses,
            line.dribbles,
            line.dribbles_complete,
            line.dribble_success_pct,
            line.tackles,
            line.tackle_success_pct,
            line.interceptions,
            line.ball_recoveries
        ],
    )?;
    Ok(())
}

/// Every persisted match for the club, our side only, in kickoff order.
/// Season recomputation is a pure function of these rows.
pub fn load_club_match_rows(conn: &Connection, club_id: i64) -> rusqlite::Result<Vec<ClubMatchRow>> {
    let mut stmt = conn.prepare(
        "SELECT
            m.our_score, m.opponent_score,
            s.possession_pct, s.expected_goals,
            s.shots, s.shots_on_target, s.shots_off_target, s.saves,
            s.passes_attempted, s.passes_completed, s.pass_accuracy_pct,
            s.final_third_passes, s.long_passes, s.crosses,
            s.dribbles, s.dribbles_complete, s.dribble_success_pct,
            s.tackles, s.tackle_success_pct, s.interceptions, s.ball_recoveries
         FROM matches m
         JOIN match_stats s ON s.match_id = m.match_id AND s.team_role = 'our_team'
         WHERE m.club_id = ?1
         ORDER BY m.kickoff_utc ASC, m.match_id ASC",
    )?;
    let rows = stmt.query_map(params![club_id], |row| {
        Ok(ClubMatchRow {
            our_score: row.get(0)?,
            opponent_score: row.get(1)?,
            stats: MatchStatLine {
                possession_pct: row.get(2)?,
                expected_goals: row.get(3)?,
                shots: row.get(4)?,
                shots_on_target: row.get(5)?,
                shots_off_target: row.get(6)?,
                saves: row.get(7)?,
                passes_attempted: row.get(8)?,
                passes_completed: row.get(9)?,
                pass_accuracy_pct: row.get(10)?,
                final_third_passes: row.get(11)?,
                long_passes: row.get(12)?,
                crosses: row.get(13)?,
                dribbles: row.get(14)?,
                dribbles_complete: row.get(15)?,
                dribble_success_pct: row.get(16)?,
                tackles: row.get(17)?,
                tackle_success_pct: row.get(18)?,
                interceptions: row.get(19)?,
                ball_recoveries: row.get(20)?,
            },
        })
    })?;
    rows.collect()
}

pub fn load_player_match_lines(
    conn: &Connection,
    player_id: i64,
) -> rusqlite::Result<Vec<PlayerMatchLine>> {
    let mut stmt = conn.prepare(
        "SELECT
            p.name, s.goals, s.assists, s.expected_goals,
            s.shots, s.shots_on_target, s.shots_off_target,
            s.passes_attempted, s.passes_completed, s.pass_accuracy_pct,
            s.final_third_passes, s.long_passes, s.short_passes, s.crosses,
            s.dribbles, s.dribbles_complete, s.dribble_success_pct,
            s.tackles, s.tackle_success_pct, s.interceptions, s.ball_recoveries
         FROM player_match_stats s
         JOIN players p ON p.player_id = s.player_id
         JOIN matches m ON m.match_id = s.match_id
         WHERE s.player_id = ?1
         ORDER BY m.kickoff_utc ASC, m.match_id ASC",
    )?;
    let rows = stmt.query_map(params![player_id], |row| {
        Ok(PlayerMatchLine {
            provider_player_id: None,
            player_name: row.get(0)?,
            goals: row.get(1)?,
            assists: row.get(2)?,
            expected_goals: row.get(3)?,
            shots: row.get(4)?,
            shots_on_target: row.get(5)?,
            shots_off_target: row.get(6)?,
            passes_attempted: row.get(7)?,
            passes_completed: row.get(8)?,
            pass_accuracy_pct: row.get(9)?,
            final_third_passes: row.get(10)?,
            long_passes: row.get(11)?,
            short_passes: row.get(12)?,
            crosses: row.get(13)?,
            dribbles: row.get(14)?,
            dribbles_complete: row.get(15)?,
            dribble_success_pct: row.get(16)?,
            tackles: row.get(17)?,
            tackle_success_pct: row.get(18)?,
            interceptions: row.get(19)?,
            ball_recoveries: row.get(20)?,
        })
    })?;
    rows.collect()
}

/// Full overwrite: the season row is always exactly the rollup of the
/// match rows, so recomputing without new matches is byte-identical.
pub fn upsert_club_season(
    conn: &Connection,
    club_id: i64,
    totals: &ClubSeasonTotals,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO club_season_stats(
            club_id, matches_played, wins, draws, losses,
            goals_scored, goals_conceded,
            shots, shots_on_target, shots_per_game, expected_goals,
            avg_possession_pct, pass_accuracy_pct,
            tackles, tackle_success_pct, dribble_success_pct,
            interceptions, ball_recoveries
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
         ON CONFLICT(club_id) DO UPDATE SET
            matches_played = excluded.matches_played,
            wins = excluded.wins,
            draws = excluded.draws,
            losses = excluded.losses,
            goals_scored = excluded.goals_scored,
            goals_conceded = excluded.goals_conceded,
            shots = excluded.shots,
            shots_on_target = excluded.shots_on_target,
            shots_per_game = excluded.shots_per_game,
            expected_goals = excluded.expected_goals,
            avg_possession_pct = excluded.avg_possession_pct,
            pass_accuracy_pct = excluded.pass_accuracy_pct,
            tackles = excluded.tackles,
            tackle_success_pct = excluded.tackle_success_pct,
            dribble_success_pct = excluded.dribble_success_pct,
            interceptions = excluded.interceptions,
            ball_recoveries = excluded.ball_recoveries",
        params![
            club_id,
            totals.matches_played,
            totals.wins,
            totals.draws,
            totals.losses,
            totals.goals_scored,
            totals.goals_conceded,
            totals.shots,
            totals.shots_on_target,
            totals.shots_per_game,
            totals.expected_goals,
            totals.avg_possession_pct,
            totals.pass_accuracy_pct,
            totals.tackles,
            totals.tackle_success_pct,
            totals.dribble_success_pct,
            totals.interceptions,
            totals.ball_recoveries
        ],
    )?;
    Ok(())
}

pub fn upsert_player_season(
    conn: &Connection,
    player_id: i64,
    totals: &PlayerSeasonTotals,
    ratings: &AttributeRatings,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO player_season_stats(
            player_id, matches_played, goals, assists,
            shots, shots_on_target, shots_per_game, expected_goals,
            pass_accuracy_pct, dribbles_per_game, dribble_success_pct,
            tackles, tackles_per_game, tackle_success_pct,
            interceptions, interceptions_per_game, ball_recoveries,
            attacking, technique, tactical, defending, creativity
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
         ON CONFLICT(player_id) DO UPDATE SET
            matches_played = excluded.matches_played,
            goals = excluded.goals,
            assists = excluded.assists,
            shots = excluded.shots,
            shots_on_target = excluded.shots_on_target,
            shots_per_game = excluded.shots_per_game,
            expected_goals = excluded.expected_goals,
            pass_accuracy_pct = excluded.pass_accuracy_pct,
            dribbles_per_game = excluded.dribbles_per_game,
            dribble_success_pct = excluded.dribble_success_pct,
            tackles = excluded.tackles,
            tackles_per_game = excluded.tackles_per_game,
            tackle_success_pct = excluded.tackle_success_pct,
            interceptions = excluded.interceptions,
            interceptions_per_game = excluded.interceptions_per_game,
            ball_recoveries = excluded.ball_recoveries,
            attacking = excluded.attacking,
            technique = excluded.technique,
            tactical = excluded.tactical,
            defending = excluded.defending,
            creativity = excluded.creativity",
        params![
            player_id,
            totals.matches_played,
            totals.goals,
            totals.assists,
            totals.shots,
            totals.shots_on_target,
            totals.shots_per_game,
            totals.expected_goals,
            totals.pass_accuracy_pct,
            totals.dribbles_per_game,
            totals.dribble_success_pct,
            totals.tackles,
            totals.tackles_per_game,
            totals.tackle_success_pct,
            totals.interceptions,
            totals.interceptions_per_game,
            totals.ball_recoveries,
            ratings.attacking,
            ratings.technique,
            ratings.tactical,
            ratings.defending,
            ratings.creativity
        ],
    )?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct GoalRow {
    pub team_role: String,
    pub scorer: String,
    pub assist: Option<String>,
    pub period: i32,
    pub minute: u32,
    pub second: u32,
}

pub fn load_goals(conn: &Connection, match_id: i64) -> rusqlite::Result<Vec<GoalRow>> {
    let mut stmt = conn.prepare(
        "SELECT team_role, scorer, assist, period, minute, second
         FROM goals
         WHERE match_id = ?1
         ORDER BY period ASC, minute ASC, second ASC, goal_id ASC",
    )?;
    let rows = stmt.query_map(params![match_id], |row| {
        Ok(GoalRow {
            team_role: row.get(0)?,
            scorer: row.get(1)?,
            assist: row.get(2)?,
            period: row.get(3)?,
            minute: row.get(4)?,
            second: row.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn load_match_stat_line(
    conn: &Connection,
    match_id: i64,
    role: TeamRole,
) -> rusqlite::Result<Option<MatchStatLine>> {
    conn.query_row(
        "SELECT
            possession_pct, expected_goals,
            shots, shots_on_target, shots_off_target, saves,
            passes_attempted, passes_completed, pass_accuracy_pct,
            final_third_passes, long_passes, crosses,
            dribbles, dribbles_complete, dribble_success_pct,
            tackles, tackle_success_pct, interceptions, ball_recoveries
         FROM match_stats WHERE match_id = ?1 AND team_role = ?2",
        params![match_id, role.as_str()],
        |row| {
            Ok(MatchStatLine {
                possession_pct: row.get(0)?,
                expected_goals: row.get(1)?,
                shots: row.get(2)?,
                shots_on_target: row.get(3)?,
                shots_off_target: row.get(4)?,
                saves: row.get(5)?,
                passes_attempted: row.get(6)?,
                passes_completed: row.get(7)?,
                pass_accuracy_pct: row.get(8)?,
                final_third_passes: row.get(9)?,
                long_passes: row.get(10)?,
                crosses: row.get(11)?,
                dribbles: row.get(12)?,
                dribbles_complete: row.get(13)?,
                dribble_success_pct: row.get(14)?,
                tackles: row.get(15)?,
                tackle_success_pct: row.get(16)?,
                interceptions: row.get(17)?,
                ball_recoveries: row.get(18)?,
            })
        },
    )
    .optional()
}

pub fn load_club_season(
    conn: &Connection,
    club_id: i64,
) -> rusqlite::Result<Option<ClubSeasonTotals>> {
    conn.query_row(
        "SELECT
            matches_played, wins, draws, losses, goals_scored, goals_conceded,
            shots, shots_on_target, shots_per_game, expected_goals,
            avg_possession_pct, pass_accuracy_pct,
            tackles, tackle_success_pct, dribble_success_pct,
            interceptions, ball_recoveries
         FROM club_season_stats WHERE club_id = ?1",
        params![club_id],
        |row| {
            Ok(ClubSeasonTotals {
                matches_played: row.get(0)?,
                wins: row.get(1)?,
                draws: row.get(2)?,
                losses: row.get(3)?,
                goals_scored: row.get(4)?,
                goals_conceded: row.get(5)?,
                shots: row.get(6)?,
                shots_on_target: row.get(7)?,
                shots_per_game: row.get(8)?,
                expected_goals: row.get(9)?,
                avg_possession_pct: row.get(10)?,
                pass_accuracy_pct: row.get(11)?,
                tackles: row.get(12)?,
                tackle_success_pct: row.get(13)?,
                dribble_success_pct: row.get(14)?,
                interceptions: row.get(15)?,
                ball_recoveries: row.get(16)?,
            })
        },
    )
    .optional()
}

pub fn load_player_season(
    conn: &Connection,
    player_id: i64,
) -> rusqlite::Result<Option<(PlayerSeasonTotals, AttributeRatings)>> {
    conn.query_row(
        "SELECT
            matches_played, goals, assists,
            shots, shots_on_target, shots_per_game, expected_goals,
            pass_accuracy_pct, dribbles_per_game, dribble_success_pct,
            tackles, tackles_per_game, tackle_success_pct,
            interceptions, interceptions_per_game, ball_recoveries,
            attacking, technique, tactical, defending, creativity
         FROM player_season_stats WHERE player_id = ?1",
        params![player_id],
        |row| {
            Ok((
                PlayerSeasonTotals {
                    matches_played: row.get(0)?,
                    goals: row.get(1)?,
                    assists: row.get(2)?,
                    shots: row.get(3)?,
                    shots_on_target: row.get(4)?,
                    shots_per_game: row.get(5)?,
                    expected_goals: row.get(6)?,
                    pass_accuracy_pct: row.get(7)?,
                    dribbles_per_game: row.get(8)?,
                    dribble_success_pct: row.get(9)?,
                    tackles: row.get(10)?,
                    tackles_per_game: row.get(11)?,
                    tackle_success_pct: row.get(12)?,
                    interceptions: row.get(13)?,
                    interceptions_per_game: row.get(14)?,
                    ball_recoveries: row.get(15)?,
                },
                AttributeRatings {
                    attacking: row.get::<_, i64>(16)? as u8,
                    technique: row.get::<_, i64>(17)? as u8,
                    tactical: row.get::<_, i64>(18)? as u8,
                    defending: row.get::<_, i64>(19)? as u8,
                    creativity: row.get::<_, i64>(20)? as u8,
                },
            ))
        },
    )
    .optional()
}

#[derive(Debug, Clone)]
pub struct LineupRow {
    pub team_role: String,
    pub slot: u32,
    pub player_name: String,
    pub jersey: Option<u32>,
    pub position: Option<String>,
    pub player_id: Option<i64>,
    pub opponent_player_id: Option<i64>,
}

pub fn load_lineups(conn: &Connection, match_id: i64) -> rusqlite::Result<Vec<LineupRow>> {
    let mut stmt = conn.prepare(
        "SELECT team_role, slot, player_name, jersey, position, player_id, opponent_player_id
         FROM lineups
         WHERE match_id = ?1
         ORDER BY team_role DESC, slot ASC",
    )?;
    let rows = stmt.query_map(params![match_id], |row| {
        Ok(LineupRow {
            team_role: row.get(0)?,
            slot: row.get(1)?,
            player_name: row.get(2)?,
            jersey: row.get(3)?,
            position: row.get(4)?,
            player_id: row.get(5)?,
            opponent_player_id: row.get(6)?,
        })
    })?;
    rows.collect()
}

pub fn player_ids_for_club(conn: &Connection, club_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT player_id FROM players WHERE club_id = ?1 ORDER BY player_id")?;
    let rows = stmt.query_map(params![club_id], |row| row.get::<_, i64>(0))?;
    rows.collect()
}

/// Audit row written after a successful commit; failures here only log.
#[allow(clippy::too_many_arguments)]
pub fn record_ingest_run(
    conn: &Connection,
    club_id: i64,
    match_id: i64,
    started_at: &str,
    events_inserted: usize,
    goals_recorded: usize,
    players_updated: usize,
    warnings: &[String],
) -> rusqlite::Result<()> {
    let warnings_json = serde_json::to_string(warnings).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, club_id, match_id, events_inserted, goals_recorded, players_updated, warnings_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            started_at,
            Utc::now().to_rfc3339(),
            club_id,
            match_id,
            events_inserted as i64,
            goals_recorded as i64,
            players_updated as i64,
            warnings_json
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn club_directory_roundtrip() {
        let conn = open_in_memory().expect("schema");
        let club = get_or_create_club(&conn, "Thunder United").expect("create");
        let again = get_or_create_club(&conn, "thunder united").expect("lookup");
        assert_eq!(club.club_id, again.club_id);

        set_club_provider_team_id(&conn, club.club_id, 746).expect("persist id");
        let reloaded = get_or_create_club(&conn, "Thunder United").expect("reload");
        assert_eq!(reloaded.provider_team_id, Some(746));
    }

    #[test]
    fn player_resolution_ladder() {
        let conn = open_in_memory().expect("schema");
        let club = get_or_create_club(&conn, "Thunder United").expect("club");

        // New name creates an unclaimed profile.
        let created = resolve_club_player(&conn, club.club_id, Some(103), "Sam Carter", Some(9), Some("Striker"))
            .expect("create");
        assert!(created.created);

        // Same provider ref resolves to the same profile.
        let by_ref = resolve_club_player(&conn, club.club_id, Some(103), "Sam J. Carter", Some(9), Some("Striker"))
            .expect("by ref");
        assert_eq!(by_ref.id, created.id);
        assert!(!by_ref.created);

        // Name match links a previously unlinked profile.
        conn.execute(
            "INSERT INTO players(club_id, name, jersey, position, provider_ref, claimed, updated_at)
             VALUES (?1, 'Riley Brooks', 4, NULL, NULL, 0, ?2)",
            params![club.club_id, Utc::now().to_rfc3339()],
        )
        .expect("seed profile");
        let linked = resolve_club_player(&conn, club.club_id, Some(104), "Riley Brooks", Some(4), Some("Defender"))
            .expect("link");
        assert!(!linked.created);
        assert!(linked.updated);
    }

    #[test]
    fn claimed_profiles_keep_their_fields() {
        let conn = open_in_memory().expect("schema");
        let club = get_or_create_club(&conn, "Thunder United").expect("club");
        conn.execute(
            "INSERT INTO players(club_id, name, jersey, position, provider_ref, claimed, updated_at)
             VALUES (?1, 'Alex Mason', 1, 'Goalkeeper', 101, 1, ?2)",
            params![club.club_id, Utc::now().to_rfc3339()],
        )
        .expect("seed claimed");

        let resolved = resolve_club_player(&conn, club.club_id, Some(101), "A. Mason", Some(13), Some("Keeper"))
            .expect("resolve");
        assert!(!resolved.updated);

        let name: String = conn
            .query_row(
                "SELECT name FROM players WHERE player_id = ?1",
                params![resolved.id],
                |row| row.get(0),
            )
            .expect("reload");
        assert_eq!(name, "Alex Mason");
    }

    #[test]
    fn season_upsert_is_a_full_overwrite() {
        let conn = open_in_memory().expect("schema");
        let club = get_or_create_club(&conn, "Thunder United").expect("club");

        let first = ClubSeasonTotals {
            matches_played: 1,
            wins: 1,
            goals_scored: 2,
            goals_conceded: 1,
            shots: Some(9),
            ..ClubSeasonTotals::default()
        };
        upsert_club_season(&conn, club.club_id, &first).expect("insert");

        let second = ClubSeasonTotals {
            matches_played: 2,
            wins: 1,
            draws: 1,
            goals_scored: 2,
            goals_conceded: 1,
            ..ClubSeasonTotals::default()
        };
        upsert_club_season(&conn, club.club_id, &second).expect("overwrite");

        let loaded = load_club_season(&conn, club.club_id)
            .expect("load")
            .expect("row");
        assert_eq!(loaded, second);
        assert_eq!(loaded.shots, None);
    }
}
