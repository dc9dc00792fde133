use std::collections::HashMap;

use crate::classify::{self, ClassifiedEvent, TeamRole};
use crate::events::{EventPayload, PassDetail};

/// Sentinel recorded when a goal event carries no player name; keeps
/// downstream display deterministic.
pub const UNKNOWN_SCORER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct GoalEvent {
    pub role: TeamRole,
    pub scorer: String,
    pub assist: Option<String>,
    pub period: i32,
    pub minute: u32,
    pub second: u32,
    pub shot_type: Option<String>,
    pub body_part: Option<String>,
}

/// Chronological goal list: shots whose outcome is "Goal", outside the
/// shoot-out window. Assists follow the shot's key-pass back-reference to
/// the originating pass and are recorded only when that pass is flagged as
/// a scoring assist.
pub fn extract_goals(events: &[ClassifiedEvent]) -> Vec<GoalEvent> {
    let passes: HashMap<&str, &ClassifiedEvent> = events
        .iter()
        .filter(|ev| matches!(ev.event.payload, EventPayload::Pass(_)))
        .filter_map(|ev| ev.event.id.as_deref().map(|id| (id, ev)))
        .collect();

    let mut goals = Vec::new();
    for ev in events {
        if ev.in_shootout() {
            continue;
        }
        let EventPayload::Shot(shot) = &ev.event.payload else {
            continue;
        };
        if !classify::shot_is_goal(shot.outcome.as_ref()) {
            continue;
        }

        let scorer = ev
            .event
            .player
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_SCORER.to_string());
        let assist = shot
            .key_pass_id
            .as_deref()
            .and_then(|id| passes.get(id))
            .and_then(|pass_ev| assist_name(pass_ev));

        goals.push(GoalEvent {
            role: ev.role,
            scorer,
            assist,
            period: ev.event.period,
            minute: ev.event.minute,
            second: ev.event.second,
            shot_type: shot.shot_type.clone(),
            body_part: shot.body_part.clone(),
        });
    }

    goals.sort_by(|a, b| {
        (a.period, a.minute, a.second).cmp(&(b.period, b.minute, b.second))
    });
    goals
}

pub fn goal_count(goals: &[GoalEvent], role: TeamRole) -> usize {
    goals.iter().filter(|g| g.role == role).count()
}

fn assist_name(pass_ev: &ClassifiedEvent) -> Option<String> {
    let EventPayload::Pass(PassDetail { goal_assist, .. }) = &pass_ev.event.payload else {
        return None;
    };
    if !goal_assist {
        return None;
    }
    pass_ev.event.player.as_ref().map(|p| p.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PlayerRef, RawEvent, ShotDetail, Tag, TeamRef};

    fn base_event(payload: EventPayload) -> RawEvent {
        RawEvent {
            id: None,
            event_type: Tag::named("Shot"),
            team: TeamRef {
                id: 1,
                name: "Thunder United".to_string(),
            },
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

    fn shot(outcome: &str, scorer: Option<&str>, key_pass: Option<&str>) -> RawEvent {
        let mut ev = base_event(EventPayload::Shot(ShotDetail {
            outcome: Some(Tag::named(outcome)),
            xg: None,
            key_pass_id: key_pass.map(|s| s.to_string()),
            body_part: None,
            shot_type: None,
        }));
        ev.player = scorer.map(|name| PlayerRef {
            id: None,
            name: name.to_string(),
        });
        ev
    }

    fn pass(id: &str, player: &str, goal_assist: bool) -> RawEvent {
        let mut ev = base_event(EventPayload::Pass(PassDetail {
            goal_assist,
            ..PassDetail::default()
        }));
        ev.id = Some(id.to_string());
        ev.event_type = Tag::named("Pass");
        ev.player = Some(PlayerRef {
            id: None,
            name: player.to_string(),
        });
        ev
    }

    fn ours(event: RawEvent) -> ClassifiedEvent {
        ClassifiedEvent {
            role: TeamRole::Ours,
            possession_role: None,
            event,
        }
    }

    #[test]
    fn assist_follows_key_pass_reference() {
        let events = vec![
            ours(pass("pass-1", "Jordan Lee", true)),
            ours(shot("Goal", Some("Sam Carter"), Some("pass-1"))),
        ];
        let goals = extract_goals(&events);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].scorer, "Sam Carter");
        assert_eq!(goals[0].assist.as_deref(), Some("Jordan Lee"));
    }

    #[test]
    fn key_pass_without_assist_flag_yields_no_assist() {
        let events = vec![
            ours(pass("pass-1", "Jordan Lee", false)),
            ours(shot("Goal", Some("Sam Carter"), Some("pass-1"))),
        ];
        let goals = extract_goals(&events);
        assert_eq!(goals[0].assist, None);
    }

    #[test]
    fn missing_scorer_becomes_unknown() {
        let events = vec![ours(shot("Goal", None, None))];
        let goals = extract_goals(&events);
        assert_eq!(goals[0].scorer, UNKNOWN_SCORER);
    }

    #[test]
    fn shootout_goals_are_excluded() {
        let mut penalty = shot("Goal", Some("Sam Carter"), None);
        penalty.period = 5;
        let events = vec![ours(penalty), ours(shot("Goal", Some("Jordan Lee"), None))];
        let goals = extract_goals(&events);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].scorer, "Jordan Lee");
    }

    #[test]
    fn non_goal_outcomes_are_ignored() {
        let events = vec![ours(shot("Saved", Some("Sam Carter"), None))];
        assert!(extract_goals(&events).is_empty());
    }

    #[test]
    fn goals_are_ordered_by_clock() {
        let mut late = shot("Goal", Some("A"), None);
        late.period = 2;
        late.minute = 88;
        let mut early = shot("Goal", Some("B"), None);
        early.period = 1;
        early.minute = 12;
        early.second = 30;
        let mut mid = shot("Goal", Some("C"), None);
        mid.period = 1;
        mid.minute = 12;
        mid.second = 45;

        let goals = extract_goals(&[ours(late), ours(early), ours(mid)]);
        let order: Vec<&str> = goals.iter().map(|g| g.scorer.as_str()).collect();
        assert_eq!(order, ["B", "C", "A"]);
    }
}
