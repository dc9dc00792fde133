use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;

/// Period value the feed uses for a post-match penalty shoot-out. Events in
/// this window are retained but excluded from every statistic.
pub const SHOOTOUT_PERIOD: i32 = 5;

/// Id/name pair used for event types, outcomes and sub-types. Only the name
/// is required; ids are kept when the feed supplies them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: Option<i64>,
    pub name: String,
}

impl Tag {
    pub fn named(name: &str) -> Self {
        Tag {
            id: None,
            name: name.to_string(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRef {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RawEvent {
    pub id: Option<String>,
    pub event_type: Tag,
    pub team: TeamRef,
    pub player: Option<PlayerRef>,
    pub period: i32,
    pub minute: u32,
    pub second: u32,
    pub location: Option<(f64, f64)>,
    pub duration: f64,
    pub possession_team: Option<TeamRef>,
    pub payload: EventPayload,
}

impl RawEvent {
    pub fn in_shootout(&self) -> bool {
        self.period == SHOOTOUT_PERIOD
    }
}

/// One variant per statistically meaningful event type; everything else is
/// `Other` and ignored downstream.
#[derive(Debug, Clone, Serialize)]
pub enum EventPayload {
    Shot(ShotDetail),
    Pass(PassDetail),
    Dribble(DribbleDetail),
    Duel(DuelDetail),
    Interception(InterceptionDetail),
    BallRecovery(BallRecoveryDetail),
    StartingLineup(LineupDetail),
    Other,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ShotDetail {
    pub outcome: Option<Tag>,
    pub xg: Option<f64>,
    pub key_pass_id: Option<String>,
    pub body_part: Option<String>,
    pub shot_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PassDetail {
    pub outcome: Option<Tag>,
    pub length: Option<f64>,
    pub cross: bool,
    pub goal_assist: bool,
    pub shot_assist: bool,
    pub pass_type: Option<Tag>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DribbleDetail {
    pub outcome: Option<Tag>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DuelDetail {
    pub duel_type: Option<Tag>,
    pub outcome: Option<Tag>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InterceptionDetail {
    pub outcome: Option<Tag>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BallRecoveryDetail {
    pub recovery_failure: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LineupDetail {
    pub formation: Option<String>,
    pub lineup: Vec<LineupSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupSlot {
    pub player_id: Option<i64>,
    pub player_name: String,
    pub jersey: Option<u32>,
    pub position: Option<String>,
}

/// Match-level metadata accompanying an uploaded event batch.
#[derive(Debug, Clone, Serialize)]
pub struct MatchMetadata {
    pub opponent_name: String,
    pub kickoff_utc: String,
    pub home: bool,
    pub declared_home_score: u32,
    pub declared_away_score: u32,
    pub score_text: Option<String>,
}

impl MatchMetadata {
    /// Declared score mapped onto our/opponent via the home flag.
    pub fn declared_our_score(&self) -> u32 {
        if self.home {
            self.declared_home_score
        } else {
            self.declared_away_score
        }
    }

    pub fn declared_opponent_score(&self) -> u32 {
        if self.home {
            self.declared_away_score
        } else {
            self.declared_home_score
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchUpload {
    pub meta: MatchMetadata,
    pub events: Vec<RawEvent>,
}

/// Parses an upload document: `{ "match": {...}, "events": [...] }`.
pub fn parse_match_upload(raw: &str) -> Result<MatchUpload> {
    let value = serde_json::from_str::<Value>(raw.trim()).context("invalid upload json")?;
    let meta = value
        .get("match")
        .map(parse_match_metadata)
        .transpose()?
        .ok_or_else(|| anyhow!("upload missing match metadata object"))?;
    let events = value
        .get("events")
        .ok_or_else(|| anyhow!("upload missing events array"))?;
    let events = parse_raw_events(events)?;
    Ok(MatchUpload { meta, events })
}

pub fn parse_match_metadata(v: &Value) -> Result<MatchMetadata> {
    let opponent_name = v
        .get("opponent")
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("match metadata missing opponent name"))?;
    let kickoff_utc = v
        .get("kickoff")
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("match metadata missing kickoff"))?;
    let home = v.get("home").and_then(|x| x.as_bool()).unwrap_or(true);
    let declared_home_score = v
        .get("home_score")
        .and_then(as_u32_any)
        .ok_or_else(|| anyhow!("match metadata missing home_score"))?;
    let declared_away_score = v
        .get("away_score")
        .and_then(as_u32_any)
        .ok_or_else(|| anyhow!("match metadata missing away_score"))?;
    let score_text = v
        .get("score_text")
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(MatchMetadata {
        opponent_name,
        kickoff_utc,
        home,
        declared_home_score,
        declared_away_score,
        score_text,
    })
}

pub fn parse_raw_events(value: &Value) -> Result<Vec<RawEvent>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("events payload is not an array"))?;
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        out.push(parse_event(item, idx)?);
    }
    Ok(out)
}

/// Only `type{id,name}` and `team{id,name}` are required; every other field
/// is treated as "no information" when absent.
fn parse_event(v: &Value, idx: usize) -> Result<RawEvent> {
    let event_type = v
        .get("type")
        .and_then(parse_tag)
        .ok_or_else(|| anyhow!("event {idx}: missing type"))?;
    let team = v
        .get("team")
        .and_then(parse_team_ref)
        .ok_or_else(|| anyhow!("event {idx}: missing team"))?;

    let player = v.get("player").and_then(parse_player_ref);
    let period = v.get("period").and_then(as_i64_any).unwrap_or(1) as i32;
    let minute = v.get("minute").and_then(as_u32_any).unwrap_or(0);
    let second = v.get("second").and_then(as_u32_any).unwrap_or(0);
    let duration = v.get("duration").and_then(as_f64_any).unwrap_or(0.0);
    let possession_team = v.get("possession_team").and_then(parse_team_ref);
    let location = v.get("location").and_then(parse_location);
    let id = v
        .get("id")
        .and_then(|x| x.as_str())
        .map(|s| s.to_string());

    let payload = parse_payload(v, &event_type);

    Ok(RawEvent {
        id,
        event_type,
        team,
        player,
        period,
        minute,
        second,
        location,
        duration,
        possession_team,
        payload,
    })
}

fn parse_payload(v: &Value, event_type: &Tag) -> EventPayload {
    let name = event_type.name.trim().to_ascii_lowercase();
    match name.as_str() {
        "shot" => EventPayload::Shot(parse_shot(v.get("shot"))),
        "pass" => EventPayload::Pass(parse_pass(v.get("pass"))),
        "dribble" => EventPayload::Dribble(DribbleDetail {
            outcome: nested_tag(v.get("dribble"), "outcome"),
        }),
        "duel" => EventPayload::Duel(DuelDetail {
            duel_type: nested_tag(v.get("duel"), "type"),
            outcome: nested_tag(v.get("duel"), "outcome"),
        }),
        "interception" => EventPayload::Interception(InterceptionDetail {
            outcome: nested_tag(v.get("interception"), "outcome"),
        }),
        "ball recovery" => EventPayload::BallRecovery(BallRecoveryDetail {
            recovery_failure: v
                .get("ball_recovery")
                .and_then(|b| b.get("recovery_failure"))
                .and_then(|x| x.as_bool())
                .unwrap_or(false),
        }),
        "starting xi" => EventPayload::StartingLineup(parse_lineup(v.get("tactics"))),
        _ => EventPayload::Other,
    }
}

fn parse_shot(v: Option<&Value>) -> ShotDetail {
    let Some(v) = v else {
        return ShotDetail::default();
    };
    ShotDetail {
        outcome: v.get("outcome").and_then(parse_tag),
        xg: v.get("statsbomb_xg").or_else(|| v.get("xg")).and_then(as_f64_any),
        key_pass_id: v
            .get("key_pass_id")
            .and_then(|x| x.as_str())
            .map(|s| s.to_string()),
        body_part: nested_name(v, "body_part"),
        shot_type: nested_name(v, "type"),
    }
}

fn parse_pass(v: Option<&Value>) -> PassDetail {
    let Some(v) = v else {
        return PassDetail::default();
    };
    PassDetail {
        outcome: v.get("outcome").and_then(parse_tag),
        length: v.get("length").and_then(as_f64_any),
        cross: v.get("cross").and_then(|x| x.as_bool()).unwrap_or(false),
        goal_assist: v
            .get("goal_assist")
            .and_then(|x| x.as_bool())
            .unwrap_or(false),
        shot_assist: v
            .get("shot_assist")
            .and_then(|x| x.as_bool())
            .unwrap_or(false),
        pass_type: v.get("type").and_then(parse_tag),
    }
}

fn parse_lineup(v: Option<&Value>) -> LineupDetail {
    let Some(v) = v else {
        return LineupDetail::default();
    };
    let formation = v.get("formation").and_then(|x| {
        x.as_str()
            .map(|s| s.to_string())
            .or_else(|| x.as_i64().map(|n| n.to_string()))
    });
    let lineup = v
        .get("lineup")
        .and_then(|x| x.as_array())
        .map(|items| items.iter().filter_map(parse_lineup_slot).collect())
        .unwrap_or_default();
    LineupDetail { formation, lineup }
}

fn parse_lineup_slot(v: &Value) -> Option<LineupSlot> {
    let player = v.get("player")?;
    let player_name = player.get("name")?.as_str()?.trim().to_string();
    if player_name.is_empty() {
        return None;
    }
    Some(LineupSlot {
        player_id: player.get("id").and_then(as_i64_any),
        player_name,
        jersey: v.get("jersey_number").and_then(as_u32_any),
        position: v
            .get("position")
            .and_then(|p| p.get("name"))
            .and_then(|x| x.as_str())
            .map(|s| s.to_string()),
    })
}

fn parse_tag(v: &Value) -> Option<Tag> {
    let name = v.get("name")?.as_str()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(Tag {
        id: v.get("id").and_then(as_i64_any),
        name,
    })
}

fn parse_team_ref(v: &Value) -> Option<TeamRef> {
    let id = v.get("id").and_then(as_i64_any)?;
    let name = v
        .get("name")
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .trim()
        .to_string();
    if name.is_empty() {
        return None;
    }
    Some(TeamRef { id, name })
}

fn parse_player_ref(v: &Value) -> Option<PlayerRef> {
    let name = v.get("name")?.as_str()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(PlayerRef {
        id: v.get("id").and_then(as_i64_any),
        name,
    })
}

fn parse_location(v: &Value) -> Option<(f64, f64)> {
    let arr = v.as_array()?;
    let x = arr.first().and_then(as_f64_any)?;
    let y = arr.get(1).and_then(as_f64_any)?;
    Some((x, y))
}

fn nested_tag(v: Option<&Value>, key: &str) -> Option<Tag> {
    v.and_then(|x| x.get(key)).and_then(parse_tag)
}

fn nested_name(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.get("name"))
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
}

fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    let n = as_i64_any(v)?;
    u32::try_from(n).ok()
}

fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}
