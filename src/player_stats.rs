use std::collections::HashMap;

use crate::classify::{ClassifiedEvent, TeamRole};
use crate::events::LineupDetail;
use crate::goals::GoalEvent;
use crate::match_stats::{TeamTally, nonzero, rate_pct, round6};

/// Per-(match, player) statistics for our club's participating players.
/// Goals and assists are plain integers (a zero-event starter still gets a
/// row with goals=0, assists=0); everything else follows the null-when-zero
/// convention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerMatchLine {
    pub provider_player_id: Option<i64>,
    pub player_name: String,
    pub goals: u32,
    pub assists: u32,
    pub expected_goals: Option<f64>,
    pub shots: Option<u32>,
    pub shots_on_target: Option<u32>,
    pub shots_off_target: Option<u32>,
    pub passes_attempted: Option<u32>,
    pub passes_completed: Option<u32>,
    pub pass_accuracy_pct: Option<f64>,
    pub final_third_passes: Option<u32>,
    pub long_passes: Option<u32>,
    pub short_passes: Option<u32>,
    pub crosses: Option<u32>,
    pub dribbles: Option<u32>,
    pub dribbles_complete: Option<u32>,
    pub dribble_success_pct: Option<f64>,
    pub tackles: Option<u32>,
    pub tackle_success_pct: Option<f64>,
    pub interceptions: Option<u32>,
    pub ball_recoveries: Option<u32>,
}

/// One line per our-club player: everyone with at least one classified
/// event, plus starters with none. Goal and assist attribution reuses the
/// extracted goal list so player totals always reconcile against it.
pub fn compute_player_statistics(
    events: &[ClassifiedEvent],
    goals: &[GoalEvent],
    our_lineup: &LineupDetail,
) -> Vec<PlayerMatchLine> {
    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, (TeamTally, Option<i64>, String)> = HashMap::new();

    for ev in events {
        if ev.role != TeamRole::Ours || ev.in_shootout() {
            continue;
        }
        let Some(player) = ev.event.player.as_ref() else {
            continue;
        };
        let key = player_key(player.id, &player.name);
        let entry = tallies.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            (TeamTally::default(), player.id, player.name.clone())
        });
        entry.0.absorb_actor(ev);
    }

    // Starters with no events still get a row.
    for slot in &our_lineup.lineup {
        let key = player_key(slot.player_id, &slot.player_name);
        tallies.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            (TeamTally::default(), slot.player_id, slot.player_name.clone())
        });
    }

    let mut lines: Vec<PlayerMatchLine> = order
        .iter()
        .map(|key| {
            let (tally, provider_id, name) = &tallies[key];
            line_from_tally(*provider_id, name.clone(), tally)
        })
        .collect();

    for goal in goals.iter().filter(|g| g.role == TeamRole::Ours) {
        if let Some(line) = lines.iter_mut().find(|l| l.player_name == goal.scorer) {
            line.goals += 1;
        }
        if let Some(assist) = goal.assist.as_deref() {
            if let Some(line) = lines.iter_mut().find(|l| l.player_name == assist) {
                line.assists += 1;
            }
        }
    }

    lines
}

fn player_key(id: Option<i64>, name: &str) -> String {
    match id {
        Some(id) => format!("id:{id}"),
        None => format!("name:{}", name.trim().to_lowercase()),
    }
}

fn line_from_tally(provider_id: Option<i64>, name: String, tally: &TeamTally) -> PlayerMatchLine {
    PlayerMatchLine {
        provider_player_id: provider_id,
        player_name: name,
        goals: 0,
        assists: 0,
        expected_goals: if tally.shots > 0 {
            Some(round6(tally.xg))
        } else {
            None
        },
        shots: nonzero(tally.shots),
        shots_on_target: nonzero(tally.shots_on_target),
        shots_off_target: nonzero(tally.shots_off_target),
        passes_attempted: nonzero(tally.passes_attempted),
        passes_completed: nonzero(tally.passes_completed),
        pass_accuracy_pct: rate_pct(tally.passes_completed, tally.passes_attempted),
        final_third_passes: nonzero(tally.final_third_passes),
        long_passes: nonzero(tally.long_passes),
        short_passes: nonzero(tally.short_passes),
        crosses: nonzero(tally.crosses),
        dribbles: nonzero(tally.dribbles),
        dribbles_complete: nonzero(tally.dribbles_complete),
        dribble_success_pct: rate_pct(tally.dribbles_complete, tally.dribbles),
        tackles: nonzero(tally.tackles),
        tackle_success_pct: rate_pct(tally.tackles_won, tally.tackles),
        interceptions: nonzero(tally.interceptions),
        ball_recoveries: nonzero(tally.ball_recoveries),
    }
}
