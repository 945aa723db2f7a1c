// src/analyze/verdict.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyze::bucket::Topic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub direction: Direction,
    pub confidence: f32,
    pub reason: String,
}

/// Per-topic result; anything the reply doesn't cleanly provide is `Unavailable`.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicVerdict {
    Available(Verdict),
    Unavailable,
}

impl TopicVerdict {
    pub fn is_available(&self) -> bool {
        matches!(self, TopicVerdict::Available(_))
    }
}

/// Parse a classifier reply body. Only a JSON object counts as a reply.
pub fn parse_reply(body: &str) -> Option<Value> {
    let trimmed = body.trim();
    // tolerate ```json fences some models add despite the response format
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    match serde_json::from_str::<Value>(unfenced.trim()) {
        Ok(v @ Value::Object(_)) => Some(v),
        _ => None,
    }
}

fn verdict_from_entry(entry: &Value) -> Option<Verdict> {
    let obj = entry.as_object()?;
    let direction = Direction::parse(obj.get("direction")?.as_str()?)?;
    let confidence = obj.get("confidence")?.as_f64()?;
    if !confidence.is_finite() {
        return None;
    }
    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(Verdict {
        direction,
        confidence: (confidence as f32).clamp(0.0, 1.0),
        reason,
    })
}

/// One verdict per configured topic, in topic order.
pub fn verdicts_for(reply: Option<&Value>, topics: &[Topic]) -> Vec<(String, TopicVerdict)> {
    topics
        .iter()
        .map(|t| {
            let v = reply
                .and_then(|r| r.get(&t.symbol))
                .and_then(verdict_from_entry)
                .map(TopicVerdict::Available)
                .unwrap_or(TopicVerdict::Unavailable);
            (t.symbol.clone(), v)
        })
        .collect()
}
