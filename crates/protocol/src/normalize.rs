//! Inbound payload normalization.
//!
//! The server pushes heterogeneous payloads on the system and chat topics;
//! there is no type tag to dispatch on. Classification is by field presence,
//! in a fixed priority order, and is total: every payload maps to exactly one
//! typed [`PhaseEvent`] or an explicit discard (`None`). Discards are logged
//! at debug and are never fatal; a malformed payload is dropped whole, never
//! partially applied.
//!
//! Priority order:
//! 1. `phase` (+ `time`) - phase change, or the terminal `GAME_OVER` signal
//! 2. `voteresult` - final vote mapping
//! 3. `death` / `heal` - night outcome
//! 4. `content` - chat line
//! 5. anything else - discard

use serde_json::Value;

use outbreak_domain::{Phase, PlayerNo, Team};

use crate::events::{ChatMessage, ChatType, PhaseEvent};

/// Name the terminal signal travels under in the `phase` field.
const GAME_OVER: &str = "GAME_OVER";

/// Normalize a raw inbound payload.
///
/// Returns `None` for malformed or unclassifiable payloads. Never panics.
pub fn normalize(raw: &str) -> Option<PhaseEvent> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize_value(value),
        Err(err) => {
            tracing::debug!(error = %err, "discarding unparseable payload");
            None
        }
    }
}

/// Normalize an already-parsed payload (the channel hands payloads over as
/// `serde_json::Value`).
pub fn normalize_value(value: Value) -> Option<PhaseEvent> {
    let Value::Object(ref fields) = value else {
        tracing::debug!("discarding non-object payload");
        return None;
    };

    if let Some(phase) = fields.get("phase") {
        return normalize_phase(phase, fields.get("time"), fields.get("winner"));
    }
    if let Some(voteresult) = fields.get("voteresult") {
        return normalize_vote_result(voteresult);
    }
    if fields.contains_key("death") || fields.contains_key("heal") {
        return normalize_outcome(fields.get("death"), fields.get("heal"));
    }
    if fields.contains_key("content") {
        return normalize_chat(fields);
    }

    tracing::debug!("discarding unclassifiable payload");
    None
}

fn normalize_phase(phase: &Value, time: Option<&Value>, winner: Option<&Value>) -> Option<PhaseEvent> {
    if phase.as_str() == Some(GAME_OVER) {
        let winner = winner
            .cloned()
            .and_then(|w| serde_json::from_value::<Team>(w).ok());
        return Some(PhaseEvent::GameOver { winner });
    }

    let phase = match serde_json::from_value::<Phase>(phase.clone()) {
        Ok(phase) => phase,
        Err(err) => {
            tracing::debug!(error = %err, "discarding payload with unknown phase");
            return None;
        }
    };
    // A phase payload without a usable time is malformed; drop it whole.
    let remaining_seconds = match time.and_then(Value::as_u64) {
        Some(secs) => secs.min(u64::from(u32::MAX)) as u32,
        None => {
            tracing::debug!("discarding phase payload without time");
            return None;
        }
    };
    Some(PhaseEvent::Phase {
        phase,
        remaining_seconds,
    })
}

fn normalize_vote_result(voteresult: &Value) -> Option<PhaseEvent> {
    let Value::Object(entries) = voteresult else {
        tracing::debug!("discarding malformed voteresult payload");
        return None;
    };
    let mut targets = Vec::with_capacity(entries.len());
    for (voter, target) in entries {
        let voter: u32 = match voter.parse() {
            Ok(no) => no,
            Err(_) => {
                tracing::debug!(voter, "discarding voteresult with non-numeric voter");
                return None;
            }
        };
        let target = match target.as_u64() {
            Some(no) => no as u32,
            None => {
                tracing::debug!(voter, "discarding voteresult with non-numeric target");
                return None;
            }
        };
        targets.push((PlayerNo::new(voter), PlayerNo::new(target)));
    }
    // Voter order is ascending by number, matching how the server iterates
    // the submission map; this is what the first-seen tie-break keys off.
    targets.sort_by_key(|(voter, _)| *voter);
    Some(PhaseEvent::VoteResult { targets })
}

fn normalize_outcome(death: Option<&Value>, heal: Option<&Value>) -> Option<PhaseEvent> {
    let deaths = match death {
        Some(Value::Array(entries)) => {
            let mut deaths = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry.as_u64() {
                    Some(no) => deaths.push(PlayerNo::new(no as u32)),
                    None => {
                        tracing::debug!("discarding outcome with non-numeric death entry");
                        return None;
                    }
                }
            }
            deaths
        }
        Some(_) => {
            tracing::debug!("discarding outcome with malformed death list");
            return None;
        }
        None => Vec::new(),
    };
    let healed = match heal {
        Some(value) => match value.as_u64() {
            Some(no) => Some(PlayerNo::new(no as u32)),
            None => {
                tracing::debug!("discarding outcome with non-numeric heal");
                return None;
            }
        },
        None => None,
    };
    Some(PhaseEvent::Outcome { deaths, healed })
}

fn normalize_chat(fields: &serde_json::Map<String, Value>) -> Option<PhaseEvent> {
    let content = fields.get("content")?.as_str()?.to_string();
    let chat_type = fields
        .get("chatType")
        .cloned()
        .and_then(|v| serde_json::from_value::<ChatType>(v).ok())
        .unwrap_or(ChatType::All);
    let sender = fields
        .get("sender")
        .and_then(Value::as_u64)
        .map(|no| PlayerNo::new(no as u32));
    let timestamp = fields
        .get("timestamp")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok());
    Some(PhaseEvent::Chat(ChatMessage {
        chat_type,
        sender,
        content,
        timestamp,
    }))
}
