use crate::match_stats::{MatchStatLine, nonzero, rate_pct, round2, round6};
use crate::player_stats::PlayerMatchLine;

/// One persisted match as seen from our side: final score plus our stat line.
#[derive(Debug, Clone, PartialEq)]
pub struct ClubMatchRow {
    pub our_score: u32,
    pub opponent_score: u32,
    pub stats: MatchStatLine,
}

/// Season rollup for the club, recomputed in full from its match rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClubSeasonTotals {
    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub shots: Option<u32>,
    pub shots_on_target: Option<u32>,
    pub shots_per_game: Option<f64>,
    pub expected_goals: Option<f64>,
    pub avg_possession_pct: Option<f64>,
    pub pass_accuracy_pct: Option<f64>,
    pub tackles: Option<u32>,
    pub tackle_success_pct: Option<f64>,
    pub dribble_success_pct: Option<f64>,
    pub interceptions: Option<u32>,
    pub ball_recoveries: Option<u32>,
}

/// Season rollup for one player, recomputed in full from their match rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSeasonTotals {
    pub matches_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub shots: Option<u32>,
    pub shots_on_target: Option<u32>,
    pub shots_per_game: Option<f64>,
    pub expected_goals: Option<f64>,
    pub pass_accuracy_pct: Option<f64>,
    pub dribbles_per_game: Option<f64>,
    pub dribble_success_pct: Option<f64>,
    pub tackles: Option<u32>,
    pub tackles_per_game: Option<f64>,
    pub tackle_success_pct: Option<f64>,
    pub interceptions: Option<u32>,
    pub interceptions_per_game: Option<f64>,
    pub ball_recoveries: Option<u32>,
}

/// Pure rollup over every match row for the club. Rate fields with raw
/// counts in the match rows (passes, dribbles) are re-divided from summed
/// counts; tackle success only exists per match as a rounded percentage, so
/// it goes through the weighted back-calculation.
pub fn aggregate_club_season(rows: &[ClubMatchRow]) -> ClubSeasonTotals {
    let matches = rows.len() as u32;
    if matches == 0 {
        return ClubSeasonTotals::default();
    }

    let mut totals = ClubSeasonTotals {
        matches_played: matches,
        ..ClubSeasonTotals::default()
    };
    for row in rows {
        if row.our_score > row.opponent_score {
            totals.wins += 1;
        } else if row.our_score < row.opponent_score {
            totals.losses += 1;
        } else {
            totals.draws += 1;
        }
        totals.goals_scored += row.our_score;
        totals.goals_conceded += row.opponent_score;
    }

    let stats: Vec<&MatchStatLine> = rows.iter().map(|r| &r.stats).collect();
    let shots = sum_counts(stats.iter().map(|s| s.shots));
    totals.shots = nonzero(shots);
    totals.shots_on_target = nonzero(sum_counts(stats.iter().map(|s| s.shots_on_target)));
    totals.shots_per_game = Some(round2(shots as f64 / matches as f64));
    let xg = stats
        .iter()
        .filter_map(|s| s.expected_goals)
        .sum::<f64>();
    totals.expected_goals = if stats.iter().any(|s| s.expected_goals.is_some()) {
        Some(round6(xg))
    } else {
        None
    };
    totals.avg_possession_pct = mean(stats.iter().filter_map(|s| s.possession_pct));
    totals.pass_accuracy_pct = rate_pct(
        sum_counts(stats.iter().map(|s| s.passes_completed)),
        sum_counts(stats.iter().map(|s| s.passes_attempted)),
    );
    totals.tackles = nonzero(sum_counts(stats.iter().map(|s| s.tackles)));
    totals.tackle_success_pct =
        weighted_rate(stats.iter().map(|s| (s.tackle_success_pct, s.tackles)));
    totals.dribble_success_pct = rate_pct(
        sum_counts(stats.iter().map(|s| s.dribbles_complete)),
        sum_counts(stats.iter().map(|s| s.dribbles)),
    );
    totals.interceptions = nonzero(sum_counts(stats.iter().map(|s| s.interceptions)));
    totals.ball_recoveries = nonzero(sum_counts(stats.iter().map(|s| s.ball_recoveries)));
    totals
}

/// Player variant of the rollup, structurally identical to the club one.
pub fn aggregate_player_season(rows: &[PlayerMatchLine]) -> PlayerSeasonTotals {
    let matches = rows.len() as u32;
    if matches == 0 {
        return PlayerSeasonTotals::default();
    }

    let mut totals = PlayerSeasonTotals {
        matches_played: matches,
        ..PlayerSeasonTotals::default()
    };
    for row in rows {
        totals.goals += row.goals;
        totals.assists += row.assists;
    }

    let shots = sum_counts(rows.iter().map(|r| r.shots));
    totals.shots = nonzero(shots);
    totals.shots_on_target = nonzero(sum_counts(rows.iter().map(|r| r.shots_on_target)));
    totals.shots_per_game = Some(round2(shots as f64 / matches as f64));
    let xg = rows.iter().filter_map(|r| r.expected_goals).sum::<f64>();
    totals.expected_goals = if rows.iter().any(|r| r.expected_goals.is_some()) {
        Some(round6(xg))
    } else {
        None
    };
    totals.pass_accuracy_pct = rate_pct(
        sum_counts(rows.iter().map(|r| r.passes_completed)),
        sum_counts(rows.iter().map(|r| r.passes_attempted)),
    );
    let dribbles = sum_counts(rows.iter().map(|r| r.dribbles));
    totals.dribbles_per_game = Some(round2(dribbles as f64 / matches as f64));
    totals.dribble_success_pct = rate_pct(
        sum_counts(rows.iter().map(|r| r.dribbles_complete)),
        dribbles,
    );
    let tackles = sum_counts(rows.iter().map(|r| r.tackles));
    totals.tackles = nonzero(tackles);
    totals.tackles_per_game = Some(round2(tackles as f64 / matches as f64));
    totals.tackle_success_pct =
        weighted_rate(rows.iter().map(|r| (r.tackle_success_pct, r.tackles)));
    let interceptions = sum_counts(rows.iter().map(|r| r.interceptions));
    totals.interceptions = nonzero(interceptions);
    totals.interceptions_per_game = Some(round2(interceptions as f64 / matches as f64));
    totals.ball_recoveries = nonzero(sum_counts(rows.iter().map(|r| r.ball_recoveries)));
    totals
}

/// Weighted back-calculation for rates that only exist per match as rounded
/// percentages: reconstruct each match's numerator from its own percentage
/// and denominator, sum both sides separately, then redivide. Avoids the
/// average-of-averages bias.
pub fn weighted_rate<I>(parts: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, Option<u32>)>,
{
    let mut numerator = 0.0;
    let mut denominator = 0u32;
    for (rate, attempts) in parts {
        let (Some(rate), Some(attempts)) = (rate, attempts) else {
            continue;
        };
        numerator += rate / 100.0 * attempts as f64;
        denominator += attempts;
    }
    if denominator == 0 {
        return None;
    }
    Some(round2(numerator / denominator as f64 * 100.0))
}

fn sum_counts<I: IntoIterator<Item = Option<u32>>>(items: I) -> u32 {
    items.into_iter().flatten().sum()
}

fn mean<I: IntoIterator<Item = f64>>(items: I) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0u32;
    for item in items {
        sum += item;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(round2(sum / count as f64))
}
