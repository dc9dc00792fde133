use crate::classify::{self, ClassifiedEvent, TeamRole};
use crate::events::EventPayload;

/// Final third starts at this x coordinate on the 0-120 pitch-length scale.
pub const FINAL_THIRD_X: f64 = 80.0;
/// Pass length thresholds.
pub const LONG_PASS_LEN: f64 = 30.0;
pub const SHORT_PASS_LEN: f64 = 15.0;

/// Raw per-side counters accumulated in one pass over the classified batch.
/// A plain value object so aggregation stays a pure function of its input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamTally {
    pub possession_secs: f64,
    pub xg: f64,
    pub goals: u32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub shots_off_target: u32,
    pub shots_saved: u32,
    pub passes_attempted: u32,
    pub passes_completed: u32,
    pub final_third_passes: u32,
    pub long_passes: u32,
    pub short_passes: u32,
    pub crosses: u32,
    pub dribbles: u32,
    pub dribbles_complete: u32,
    pub tackles: u32,
    pub tackles_won: u32,
    pub interceptions: u32,
    pub ball_recoveries: u32,
}

impl TeamTally {
    /// Folds one event acted by this tally's side into the counters.
    /// Possession is tracked separately because it follows the possession
    /// team, not the actor.
    pub fn absorb_actor(&mut self, ev: &ClassifiedEvent) {
        match &ev.event.payload {
            EventPayload::Shot(shot) => {
                self.shots += 1;
                self.xg += shot.xg.unwrap_or(0.0);
                let outcome = shot.outcome.as_ref();
                if classify::shot_is_goal(outcome) {
                    self.goals += 1;
                }
                if classify::shot_on_target(outcome) {
                    self.shots_on_target += 1;
                } else if classify::shot_off_target(outcome) {
                    self.shots_off_target += 1;
                }
                if classify::shot_saved(outcome) {
                    self.shots_saved += 1;
                }
            }
            EventPayload::Pass(pass) => {
                if classify::pass_is_restart(pass) {
                    return;
                }
                self.passes_attempted += 1;
                if classify::pass_completed(pass) {
                    self.passes_completed += 1;
                }
                if ev.event.location.is_some_and(|(x, _)| x >= FINAL_THIRD_X) {
                    self.final_third_passes += 1;
                }
                if let Some(length) = pass.length {
                    if length > LONG_PASS_LEN {
                        self.long_passes += 1;
                    } else if length < SHORT_PASS_LEN {
                        self.short_passes += 1;
                    }
                }
                if pass.cross {
                    self.crosses += 1;
                }
            }
            EventPayload::Dribble(dribble) => {
                self.dribbles += 1;
                if classify::dribble_completed(dribble) {
                    self.dribbles_complete += 1;
                }
            }
            EventPayload::Duel(duel) => {
                if classify::duel_is_tackle(duel) {
                    self.tackles += 1;
                    if classify::tackle_won(duel) {
                        self.tackles_won += 1;
                    }
                }
            }
            EventPayload::Interception(_) => {
                self.interceptions += 1;
            }
            EventPayload::BallRecovery(recovery) => {
                if classify::recovery_counts(recovery) {
                    self.ball_recoveries += 1;
                }
            }
            EventPayload::StartingLineup(_) | EventPayload::Other => {}
        }
    }
}

/// The persisted statistics shape for one (match, team-role). Counts are
/// None when nothing of that kind occurred; rates are None when their
/// denominator is zero. Percentages always land in [0, 100].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchStatLine {
    pub possession_pct: Option<f64>,
    pub expected_goals: Option<f64>,
    pub shots: Option<u32>,
    pub shots_on_target: Option<u32>,
    pub shots_off_target: Option<u32>,
    pub saves: Option<u32>,
    pub passes_attempted: Option<u32>,
    pub passes_completed: Option<u32>,
    pub pass_accuracy_pct: Option<f64>,
    pub final_third_passes: Option<u32>,
    pub long_passes: Option<u32>,
    pub crosses: Option<u32>,
    pub dribbles: Option<u32>,
    pub dribbles_complete: Option<u32>,
    pub dribble_success_pct: Option<f64>,
    pub tackles: Option<u32>,
    pub tackle_success_pct: Option<f64>,
    pub interceptions: Option<u32>,
    pub ball_recoveries: Option<u32>,
}

/// One pass over the classified, non-shoot-out events producing both sides'
/// stat lines. Saves are attributed cross-team: our saves come from the
/// opponent's saved shots.
pub fn compute_match_statistics(events: &[ClassifiedEvent]) -> (MatchStatLine, MatchStatLine) {
    let ours = tally_for_role(events, TeamRole::Ours);
    let theirs = tally_for_role(events, TeamRole::Opponent);
    let total_possession = ours.possession_secs + theirs.possession_secs;

    (
        stat_line(&ours, &theirs, total_possession),
        stat_line(&theirs, &ours, total_possession),
    )
}

/// Counters for one side: actor stats from its own events, possession from
/// every event the side's team was in possession for.
pub fn tally_for_role(events: &[ClassifiedEvent], role: TeamRole) -> TeamTally {
    let mut tally = TeamTally::default();
    for ev in events {
        if ev.in_shootout() {
            continue;
        }
        if ev.possession_role == Some(role) {
            tally.possession_secs += ev.event.duration;
        }
        if ev.role == role {
            tally.absorb_actor(ev);
        }
    }
    tally
}

fn stat_line(own: &TeamTally, other: &TeamTally, total_possession: f64) -> MatchStatLine {
    let possession_pct = if total_possession > 0.0 {
        Some(round2(own.possession_secs / total_possession * 100.0))
    } else {
        None
    };
    MatchStatLine {
        possession_pct,
        expected_goals: if own.shots > 0 {
            Some(round6(own.xg))
        } else {
            None
        },
        shots: nonzero(own.shots),
        shots_on_target: nonzero(own.shots_on_target),
        shots_off_target: nonzero(own.shots_off_target),
        saves: nonzero(other.shots_saved),
        passes_attempted: nonzero(own.passes_attempted),
        passes_completed: nonzero(own.passes_completed),
        pass_accuracy_pct: rate_pct(own.passes_completed, own.passes_attempted),
        final_third_passes: nonzero(own.final_third_passes),
        long_passes: nonzero(own.long_passes),
        crosses: nonzero(own.crosses),
        dribbles: nonzero(own.dribbles),
        dribbles_complete: nonzero(own.dribbles_complete),
        dribble_success_pct: rate_pct(own.dribbles_complete, own.dribbles),
        tackles: nonzero(own.tackles),
        tackle_success_pct: rate_pct(own.tackles_won, own.tackles),
        interceptions: nonzero(own.interceptions),
        ball_recoveries: nonzero(own.ball_recoveries),
    }
}

/// Zero counts persist as absent, a display convention carried end to end.
pub fn nonzero(n: u32) -> Option<u32> {
    if n > 0 { Some(n) } else { None }
}

pub fn rate_pct(num: u32, den: u32) -> Option<f64> {
    if den == 0 {
        return None;
    }
    Some(round2(num as f64 / den as f64 * 100.0))
}

/// Half-up rounding to 2 decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Expected goals are carried at 6-decimal precision.
pub fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{
        BallRecoveryDetail, DuelDetail, PassDetail, RawEvent, ShotDetail, Tag, TeamRef,
    };

    fn ev(role: TeamRole, payload: EventPayload) -> ClassifiedEvent {
        ClassifiedEvent {
            role,
            possession_role: None,
            event: RawEvent {
                id: None,
                event_type: Tag::named("x"),
                team: TeamRef {
                    id: if role == TeamRole::Ours { 1 } else { 2 },
                    name: "x".to_string(),
                },
                player: None,
                period: 1,
                minute: 0,
                second: 0,
                location: None,
                duration: 0.0,
                possession_team: None,
                payload,
            },
        }
    }

    fn possession_ev(role: TeamRole, secs: f64) -> ClassifiedEvent {
        let mut e = ev(role, EventPayload::Other);
        e.possession_role = Some(role);
        e.event.duration = secs;
        e
    }

    fn shot(role: TeamRole, outcome: &str, xg: f64) -> ClassifiedEvent {
        ev(
            role,
            EventPayload::Shot(ShotDetail {
                outcome: Some(Tag::named(outcome)),
                xg: Some(xg),
                ..ShotDetail::default()
            }),
        )
    }

    #[test]
    fn possession_splits_by_duration() {
        let events = vec![
            possession_ev(TeamRole::Ours, 60.0),
            possession_ev(TeamRole::Opponent, 40.0),
        ];
        let (ours, theirs) = compute_match_statistics(&events);
        assert_eq!(ours.possession_pct, Some(60.0));
        assert_eq!(theirs.possession_pct, Some(40.0));
    }

    #[test]
    fn zero_total_duration_leaves_possession_null() {
        let events = vec![
            possession_ev(TeamRole::Ours, 0.0),
            possession_ev(TeamRole::Opponent, 0.0),
        ];
        let (ours, theirs) = compute_match_statistics(&events);
        assert_eq!(ours.possession_pct, None);
        assert_eq!(theirs.possession_pct, None);
    }

    #[test]
    fn saves_are_attributed_cross_team() {
        let events = vec![
            shot(TeamRole::Opponent, "Saved", 0.1),
            shot(TeamRole::Opponent, "Goal", 0.3),
        ];
        let (ours, theirs) = compute_match_statistics(&events);
        assert_eq!(ours.saves, Some(1));
        assert_eq!(theirs.saves, None);
        assert_eq!(theirs.shots, Some(2));
        assert_eq!(theirs.shots_on_target, Some(2));
    }

    #[test]
    fn restart_passes_never_enter_the_denominator() {
        let open = ev(TeamRole::Ours, EventPayload::Pass(PassDetail::default()));
        let throw_in = ev(
            TeamRole::Ours,
            EventPayload::Pass(PassDetail {
                pass_type: Some(Tag::named("Throw-in")),
                ..PassDetail::default()
            }),
        );
        let failed = ev(
            TeamRole::Ours,
            EventPayload::Pass(PassDetail {
                outcome: Some(Tag::named("Incomplete")),
                ..PassDetail::default()
            }),
        );
        let (ours, _) = compute_match_statistics(&[open, throw_in, failed]);
        assert_eq!(ours.passes_attempted, Some(2));
        assert_eq!(ours.passes_completed, Some(1));
        assert_eq!(ours.pass_accuracy_pct, Some(50.0));
    }

    #[test]
    fn pass_geometry_buckets() {
        let mut final_third = ev(
            TeamRole::Ours,
            EventPayload::Pass(PassDetail {
                length: Some(12.0),
                ..PassDetail::default()
            }),
        );
        final_third.event.location = Some((85.0, 40.0));
        let long = ev(
            TeamRole::Ours,
            EventPayload::Pass(PassDetail {
                length: Some(35.0),
                cross: true,
                ..PassDetail::default()
            }),
        );
        let (ours, _) = compute_match_statistics(&[final_third, long]);
        assert_eq!(ours.final_third_passes, Some(1));
        assert_eq!(ours.long_passes, Some(1));
        assert_eq!(ours.crosses, Some(1));
    }

    #[test]
    fn tackles_and_recoveries() {
        let won = ev(
            TeamRole::Ours,
            EventPayload::Duel(DuelDetail {
                duel_type: Some(Tag::named("Tackle")),
                outcome: Some(Tag::named("Won")),
            }),
        );
        let lost = ev(
            TeamRole::Ours,
            EventPayload::Duel(DuelDetail {
                duel_type: Some(Tag::named("Tackle")),
                outcome: Some(Tag::named("Lost In Play")),
            }),
        );
        let failed_recovery = ev(
            TeamRole::Ours,
            EventPayload::BallRecovery(BallRecoveryDetail {
                recovery_failure: true,
            }),
        );
        let recovery = ev(
            TeamRole::Ours,
            EventPayload::BallRecovery(BallRecoveryDetail::default()),
        );
        let (ours, _) = compute_match_statistics(&[won, lost, failed_recovery, recovery]);
        assert_eq!(ours.tackles, Some(2));
        assert_eq!(ours.tackle_success_pct, Some(50.0));
        assert_eq!(ours.ball_recoveries, Some(1));
    }

    #[test]
    fn shootout_events_are_excluded_from_stats() {
        let mut penalty = shot(TeamRole::Ours, "Goal", 0.76);
        penalty.event.period = 5;
        let (ours, _) = compute_match_statistics(&[penalty]);
        assert_eq!(ours.shots, None);
        assert_eq!(ours.expected_goals, None);
    }

    #[test]
    fn xg_is_summed_at_six_decimals() {
        let events = vec![
            shot(TeamRole::Ours, "Saved", 0.123456),
            shot(TeamRole::Ours, "Off T", 0.2),
        ];
        let (ours, _) = compute_match_statistics(&events);
        assert_eq!(ours.expected_goals, Some(0.323456));
    }

    #[test]
    fn empty_counters_persist_as_none() {
        let (ours, theirs) = compute_match_statistics(&[]);
        assert_eq!(ours, MatchStatLine::default());
        assert_eq!(theirs, MatchStatLine::default());
    }

    #[test]
    fn rates_round_half_up() {
        assert_eq!(rate_pct(1, 3), Some(33.33));
        assert_eq!(rate_pct(2, 3), Some(66.67));
        assert_eq!(round2(0.125 * 100.0), 12.5);
        assert_eq!(rate_pct(0, 0), None);
    }
}
