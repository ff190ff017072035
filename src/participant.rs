use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer};

/// Number of badges which counts as full completion. Participants
/// may earn more than this, pushing their progress past 100.
pub const BADGE_GOAL: usize = 20;

/// A participant as reported by the progress service
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub badges: Vec<Badge>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_seen: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_online: bool,
}

/// A badge earned by a participant
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub earned_at: String,
}

/// Identifiers arrive as either strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Treats an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Display-ready projection of a [`Participant`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    pub id: String,
    pub name: String,
    /// Percentage of [`BADGE_GOAL`] reached
    pub progress: u32,
    pub last_active: String,
    /// Badge identifiers in the order they were earned
    pub badges: Vec<String>,
    pub is_online: bool,
}

impl From<&Participant> for ParticipantView {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id.clone(),
            name: participant.name.clone(),
            progress: progress_for(participant.badges.len()),
            last_active: format_last_seen(&participant.last_seen),
            badges: participant
                .badges
                .iter()
                .map(|badge| badge.id.clone())
                .collect(),
            is_online: participant.is_online,
        }
    }
}

/// Projects a fetched list into views keeping order and length
pub fn project(participants: &[Participant]) -> Vec<ParticipantView> {
    participants.iter().map(ParticipantView::from).collect()
}

/// Badge count scaled against [`BADGE_GOAL`], rounded to the nearest
/// whole percent
pub fn progress_for(badge_count: usize) -> u32 {
    (badge_count as f64 / BADGE_GOAL as f64 * 100.0).round() as u32
}

/// Shown when the service never reported a last seen time
pub const UNKNOWN_LAST_SEEN: &str = "unknown";

/// Formats a timestamp as a local wall clock time (`3:04:05 PM`).
/// Timestamps which can't be parsed are shown as received
pub fn format_last_seen(last_seen: &str) -> String {
    if last_seen.trim().is_empty() {
        return UNKNOWN_LAST_SEEN.to_string();
    }
    match DateTime::parse_from_rfc3339(last_seen.trim()) {
        Ok(time) => time
            .with_timezone(&Local)
            .format("%-I:%M:%S %p")
            .to_string(),
        Err(_) => last_seen.to_string(),
    }
}
