use crate::season::PlayerSeasonTotals;

/// Five bounded skill ratings derived from a player's season rollup.
/// Always integers in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeRatings {
    pub attacking: u8,
    pub technique: u8,
    pub tactical: u8,
    pub defending: u8,
    pub creativity: u8,
}

const GOALS_PER_GAME_W: f64 = 40.0;
const ASSISTS_PER_GAME_W: f64 = 20.0;
const SHOTS_PER_GAME_W: f64 = 6.0;
const PASS_ACC_TECHNIQUE_W: f64 = 0.6;
const DRIBBLE_TECHNIQUE_W: f64 = 0.4;
const PASS_ACC_TACTICAL_W: f64 = 0.7;
const DRIBBLES_PER_GAME_W: f64 = 6.0;
const TACKLES_PER_GAME_W: f64 = 12.0;
const TACKLE_SUCCESS_W: f64 = 0.3;
const INTERCEPTIONS_PER_GAME_W: f64 = 10.0;
const ASSISTS_CREATIVITY_W: f64 = 45.0;
const PASS_ACC_CREATIVITY_W: f64 = 0.45;

/// Pure function of the season rollup. Each rating is a weighted sum of the
/// named season fields, clamped to [0, 100] before storage.
pub fn compute_attribute_ratings(season: &PlayerSeasonTotals) -> AttributeRatings {
    if season.matches_played == 0 {
        return AttributeRatings::default();
    }
    let games = season.matches_played as f64;
    let goals_per_game = season.goals as f64 / games;
    let assists_per_game = season.assists as f64 / games;
    let shots_per_game = season.shots_per_game.unwrap_or(0.0);
    let pass_acc = season.pass_accuracy_pct.unwrap_or(0.0);
    let dribble_success = season.dribble_success_pct.unwrap_or(0.0);
    let dribbles_per_game = season.dribbles_per_game.unwrap_or(0.0);
    let tackles_per_game = season.tackles_per_game.unwrap_or(0.0);
    let tackle_success = season.tackle_success_pct.unwrap_or(0.0);
    let interceptions_per_game = season.interceptions_per_game.unwrap_or(0.0);

    AttributeRatings {
        attacking: bounded(
            goals_per_game * GOALS_PER_GAME_W
                + assists_per_game * ASSISTS_PER_GAME_W
                + shots_per_game * SHOTS_PER_GAME_W,
        ),
        technique: bounded(
            pass_acc * PASS_ACC_TECHNIQUE_W + dribble_success * DRIBBLE_TECHNIQUE_W,
        ),
        tactical: bounded(
            pass_acc * PASS_ACC_TACTICAL_W + dribbles_per_game * DRIBBLES_PER_GAME_W,
        ),
        defending: bounded(
            tackles_per_game * TACKLES_PER_GAME_W
                + tackle_success * TACKLE_SUCCESS_W
                + interceptions_per_game * INTERCEPTIONS_PER_GAME_W,
        ),
        creativity: bounded(
            assists_per_game * ASSISTS_CREATIVITY_W + pass_acc * PASS_ACC_CREATIVITY_W,
        ),
    }
}

fn bounded(score: f64) -> u8 {
    score.clamp(0.0, 100.0).round() as u8
}
