use clubstats::classify::TeamRole;
use clubstats::events::{
    DuelDetail, EventPayload, LineupDetail, LineupSlot, MatchMetadata, PlayerRef, RawEvent,
    ShotDetail, Tag, TeamRef,
};
use clubstats::ingest::{EntityLocks, ingest_match, recompute_club_season};
use clubstats::store;
use rusqlite::Connection;

const OUR_TEAM: (i64, &str) = (1, "Thunder United");
const OPP_TEAM: (i64, &str) = (2, "City Strikers");

fn team(side: (i64, &str)) -> TeamRef {
    TeamRef {
        id: side.0,
        name: side.1.to_string(),
    }
}

fn base_event(event_type: &str, side: (i64, &str), payload: EventPayload) -> RawEvent {
    RawEvent {
        id: None,
        event_type: Tag::named(event_type),
        team: team(side),
        player: None,
        period: 1,
        minute: 0,
        second: 0,
        location: None,
        duration: 0.0,
        possession_team: None,
        payload,
    }
}

fn lineup_event(side: (i64, &str), first_id: i64) -> RawEvent {
    let lineup = (0..11)
        .map(|i| LineupSlot {
            player_id: Some(first_id + i),
            player_name: format!("{} Player {}", side.1, i + 1),
            jersey: Some(i as u32 + 1),
            position: Some("Midfielder".to_string()),
        })
        .collect();
    base_event(
        "Starting XI",
        side,
        EventPayload::StartingLineup(LineupDetail {
            formation: Some("442".to_string()),
            lineup,
        }),
    )
}

fn tackle(won: bool) -> RawEvent {
    let mut ev = base_event(
        "Duel",
        OUR_TEAM,
        EventPayload::Duel(DuelDetail {
            duel_type: Some(Tag::named("Tackle")),
            outcome: Some(Tag::named(if won { "Won" } else { "Lost In Play" })),
        }),
    );
    ev.player = Some(PlayerRef {
        id: Some(104),
        name: "Thunder United Player 4".to_string(),
    });
    ev
}

fn goal(minute: u32) -> RawEvent {
    let mut ev = base_event(
        "Shot",
        OUR_TEAM,
        EventPayload::Shot(ShotDetail {
            outcome: Some(Tag::named("Goal")),
            xg: Some(0.2),
            ..ShotDetail::default()
        }),
    );
    ev.minute = minute;
    ev.player = Some(PlayerRef {
        id: Some(109),
        name: "Thunder United Player 9".to_string(),
    });
    ev
}

fn match_events(tackles_won: u32, tackles_lost: u32, our_goals: u32) -> Vec<RawEvent> {
    let mut events = vec![lineup_event(OUR_TEAM, 101), lineup_event(OPP_TEAM, 201)];
    for _ in 0..tackles_won {
        events.push(tackle(true));
    }
    for _ in 0..tackles_lost {
        events.push(tackle(false));
    }
    for i in 0..our_goals {
        events.push(goal(10 + i * 7));
    }
    events
}

fn metadata(kickoff: &str, our_goals: u32) -> MatchMetadata {
    MatchMetadata {
        opponent_name: OPP_TEAM.1.to_string(),
        kickoff_utc: kickoff.to_string(),
        home: true,
        declared_home_score: our_goals,
        declared_away_score: 0,
        score_text: None,
    }
}

fn ingest(
    conn: &mut Connection,
    kickoff: &str,
    tackles_won: u32,
    tackles_lost: u32,
    our_goals: u32,
) {
    let locks = EntityLocks::new();
    ingest_match(
        conn,
        &locks,
        OUR_TEAM.1,
        &metadata(kickoff, our_goals),
        match_events(tackles_won, tackles_lost, our_goals),
    )
    .expect("synthetic match should ingest");
}

#[test]
fn tackle_rate_uses_weighted_back_calculation() {
    let mut conn = store::open_in_memory().expect("schema");
    // 10 attempts at 70%, then 5 attempts at 40%: season rate must be
    // 9/15 = 60.00, not the naive 55 average.
    ingest(&mut conn, "2025-09-14T15:00:00Z", 7, 3, 1);
    ingest(&mut conn, "2025-09-21T15:00:00Z", 2, 3, 0);

    let club = store::get_or_create_club(&conn, OUR_TEAM.1).expect("club");
    let season = store::load_club_season(&conn, club.club_id)
        .expect("load")
        .expect("season row");
    assert_eq!(season.matches_played, 2);
    assert_eq!(season.tackles, Some(15));
    assert_eq!(season.tackle_success_pct, Some(60.0));

    // The tackling player's own season rollup back-calculates the same way.
    let (player_id,): (i64,) = conn
        .query_row(
            "SELECT player_id FROM players WHERE name = 'Thunder United Player 4'",
            [],
            |row| Ok((row.get(0)?,)),
        )
        .expect("player");
    let (totals, _ratings) = store::load_player_season(&conn, player_id)
        .expect("load")
        .expect("player season row");
    assert_eq!(totals.tackles, Some(15));
    assert_eq!(totals.tackle_success_pct, Some(60.0));
}

#[test]
fn season_recompute_is_idempotent() {
    let mut conn = store::open_in_memory().expect("schema");
    ingest(&mut conn, "2025-09-14T15:00:00Z", 7, 3, 2);

    let club = store::get_or_create_club(&conn, OUR_TEAM.1).expect("club");
    let first = recompute_club_season(&conn, club.club_id).expect("first recompute");
    let first_row = store::load_club_season(&conn, club.club_id)
        .expect("load")
        .expect("row");
    let second = recompute_club_season(&conn, club.club_id).expect("second recompute");
    let second_row = store::load_club_season(&conn, club.club_id)
        .expect("load")
        .expect("row");

    assert_eq!(first, second);
    assert_eq!(first_row, second_row);
}

#[test]
fn season_goals_are_rederivable_from_match_rows() {
    let mut conn = store::open_in_memory().expect("schema");
    ingest(&mut conn, "2025-09-14T15:00:00Z", 4, 1, 2);
    ingest(&mut conn, "2025-09-21T15:00:00Z", 2, 2, 1);
    ingest(&mut conn, "2025-09-28T15:00:00Z", 0, 0, 0);

    let club = store::get_or_create_club(&conn, OUR_TEAM.1).expect("club");
    let season = store::load_club_season(&conn, club.club_id)
        .expect("load")
        .expect("season row");
    let summed: i64 = conn
        .query_row(
            "SELECT SUM(our_score) FROM matches WHERE club_id = ?1",
            [club.club_id],
            |row| row.get(0),
        )
        .expect("sum");
    assert_eq!(season.goals_scored as i64, summed);
    assert_eq!(season.matches_played, 3);
    assert_eq!((season.wins, season.draws), (2, 1));
}

#[test]
fn zero_duration_batch_leaves_possession_null() {
    let mut conn = store::open_in_memory().expect("schema");
    ingest(&mut conn, "2025-09-14T15:00:00Z", 3, 1, 0);

    let club = store::get_or_create_club(&conn, OUR_TEAM.1).expect("club");
    let (match_id,): (i64,) = conn
        .query_row(
            "SELECT match_id FROM matches WHERE club_id = ?1",
            [club.club_id],
            |row| Ok((row.get(0)?,)),
        )
        .expect("match");
    let ours = store::load_match_stat_line(&conn, match_id, TeamRole::Ours)
        .expect("load")
        .expect("line");
    let theirs = store::load_match_stat_line(&conn, match_id, TeamRole::Opponent)
        .expect("load")
        .expect("line");
    assert_eq!(ours.possession_pct, None);
    assert_eq!(theirs.possession_pct, None);

    let season = store::load_club_season(&conn, club.club_id)
        .expect("load")
        .expect("season row");
    assert_eq!(season.avg_possession_pct, None);
}

#[test]
fn recompute_for_unknown_entity_is_not_found() {
    let conn = store::open_in_memory().expect("schema");
    let err = recompute_club_season(&conn, 999).expect_err("unknown club");
    assert!(matches!(err, clubstats::error::StatsError::NotFound { .. }));
}

#[test]
fn every_stored_percentage_is_in_range() {
    let mut conn = store::open_in_memory().expect("schema");
    ingest(&mut conn, "2025-09-14T15:00:00Z", 7, 3, 2);
    ingest(&mut conn, "2025-09-21T15:00:00Z", 1, 4, 1);

    for (table, column) in [
        ("match_stats", "possession_pct"),
        ("match_stats", "pass_accuracy_pct"),
        ("match_stats", "tackle_success_pct"),
        ("match_stats", "dribble_success_pct"),
        ("player_match_stats", "pass_accuracy_pct"),
        ("player_match_stats", "tackle_success_pct"),
        ("club_season_stats", "tackle_success_pct"),
        ("player_season_stats", "tackle_success_pct"),
    ] {
        let out_of_range: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM {table}
                     WHERE {column} IS NOT NULL AND ({column} < 0.0 OR {column} > 100.0)"
                ),
                [],
                |row| row.get(0),
            )
            .expect("range query");
        assert_eq!(out_of_range, 0, "{table}.{column} out of range");
    }
}
