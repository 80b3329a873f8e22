use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::handoff::HandoffRecord;
use super::session::SessionState;

// ---------------------------------------------------------------------------
// Closed vocabularies
// ---------------------------------------------------------------------------

/// Presenting conditions the engine can collect. Definition order is the
/// tie-break order used by the pattern tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Headache,
    HayFever,
    Indigestion,
    Diarrhoea,
    SoreThroat,
    CommonCold,
    Cough,
    Constipation,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::Headache,
        Condition::HayFever,
        Condition::Indigestion,
        Condition::Diarrhoea,
        Condition::SoreThroat,
        Condition::CommonCold,
        Condition::Cough,
        Condition::Constipation,
    ];

    /// Canonical identifier used in payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Headache => "headache",
            Self::HayFever => "hayfever",
            Self::Indigestion => "indigestion",
            Self::Diarrhoea => "diarrhoea",
            Self::SoreThroat => "sorethroat",
            Self::CommonCold => "commoncold",
            Self::Cough => "cough",
            Self::Constipation => "constipation",
        }
    }

    /// Human-readable label for prompts and recaps.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Headache => "headache",
            Self::HayFever => "hay fever",
            Self::Indigestion => "indigestion",
            Self::Diarrhoea => "diarrhoea",
            Self::SoreThroat => "sore throat",
            Self::CommonCold => "common cold",
            Self::Cough => "cough",
            Self::Constipation => "constipation",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Demographic buckets for the person being treated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WhoBucket {
    Adult,
    Teen,
    Child,
    Toddler,
    Infant,
    Pregnant,
    Breastfeeding,
}

impl WhoBucket {
    pub const ALL: [WhoBucket; 7] = [
        WhoBucket::Adult,
        WhoBucket::Teen,
        WhoBucket::Child,
        WhoBucket::Toddler,
        WhoBucket::Infant,
        WhoBucket::Pregnant,
        WhoBucket::Breastfeeding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Teen => "teen 13–17",
            Self::Child => "child 5–12",
            Self::Toddler => "toddler 1–4",
            Self::Infant => "infant <1",
            Self::Pregnant => "pregnant",
            Self::Breastfeeding => "breastfeeding",
        }
    }

    /// Map a stated age in whole years to its bucket.
    pub fn from_age_years(age: u32) -> WhoBucket {
        match age {
            0 => WhoBucket::Infant,
            1..=4 => WhoBucket::Toddler,
            5..=12 => WhoBucket::Child,
            13..=17 => WhoBucket::Teen,
            _ => WhoBucket::Adult,
        }
    }
}

impl std::fmt::Display for WhoBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elapsed-time buckets. Free text never enters this slot; only these values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DurationBucket {
    Under24Hours,
    Days1To3,
    Days4To7,
    Over7Days,
    Recurrent,
}

impl DurationBucket {
    pub const ALL: [DurationBucket; 5] = [
        DurationBucket::Under24Hours,
        DurationBucket::Days1To3,
        DurationBucket::Days4To7,
        DurationBucket::Over7Days,
        DurationBucket::Recurrent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under24Hours => "< 24 hours",
            Self::Days1To3 => "1–3 days",
            Self::Days4To7 => "4–7 days",
            Self::Over7Days => "> 7 days",
            Self::Recurrent => "Recurrent / frequent",
        }
    }
}

impl std::fmt::Display for DurationBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// The five intake slots, in the fixed priority order questions are asked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Who,
    Condition,
    Duration,
    Action,
    Meds,
}

impl Slot {
    pub const PRIORITY: [Slot; 5] = [
        Slot::Who,
        Slot::Condition,
        Slot::Duration,
        Slot::Action,
        Slot::Meds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Who => "who",
            Self::Condition => "condition",
            Self::Duration => "duration",
            Self::Action => "action",
            Self::Meds => "meds",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Observation — one utterance, analyzed
// ---------------------------------------------------------------------------

/// The structured, partial reading of a single utterance.
/// Every field is optional; nonsense input yields the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observation {
    pub condition: Option<Condition>,
    pub duration: Option<DurationBucket>,
    pub who: Option<WhoBucket>,
    pub action: Option<String>,
    pub meds: Option<String>,
    /// Human-readable red-flag descriptions, deduplicated.
    pub red_flags: Vec<String>,
    /// The utterance referenced elapsed time but no bucket could be mapped.
    pub ambiguous_duration: bool,
}

impl Observation {
    /// True when nothing at all was recognized.
    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
            && self.duration.is_none()
            && self.who.is_none()
            && self.action.is_none()
            && self.meds.is_none()
            && self.red_flags.is_empty()
            && !self.ambiguous_duration
    }
}

/// Contribution from an optional external analyzer. Merged with, but never
/// overriding, the built-in extractor's results for the same turn.
#[derive(Debug, Clone, Default)]
pub struct ExternalObservation {
    pub condition: Option<Condition>,
    pub duration: Option<DurationBucket>,
    pub who: Option<WhoBucket>,
    pub action: Option<String>,
    pub meds: Option<String>,
    /// Raw pattern strings; classified into descriptions by the extractor.
    pub red_flag_patterns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// What kind of message a reply is, so a renderer can style it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Greeting,
    Notice,
    Acknowledgment,
    Question,
    Refusal,
    Recap,
    Closing,
    Escalation,
    Handoff,
    Summary,
}

/// One bot message. `suggestions` are optional quick-reply chips an
/// external renderer may offer; plain text input is always accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Reply {
    pub fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// The full result of processing one utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub replies: Vec<Reply>,
    /// True only on the turn that transitioned the session to `Escalated`.
    pub newly_escalated: bool,
    /// Present on the turn the intake completed and was handed off.
    pub completed: Option<CompletedIntake>,
    /// The recommendation produced at handoff, when the engine succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl TurnOutcome {
    pub fn replies(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            newly_escalated: false,
            completed: None,
            recommendation: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendation — what the external rules engine returns
// ---------------------------------------------------------------------------

/// A single suggested product or approach.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdviceItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of evaluating a finished intake record. Produced by the external
/// recommendation engine; the engine itself is out of scope here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub advice: Vec<AdviceItem>,
    #[serde(default)]
    pub cautions: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub self_care: Vec<String>,
    #[serde(default)]
    pub administration: Vec<String>,
    #[serde(default)]
    pub storage: Vec<String>,
    #[serde(default)]
    pub general_timing: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<serde_json::Value>,
}

/// The finished intake plus the flag/caution state after the
/// recommendation engine ran. This is what gets persisted externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedIntake {
    pub record: HandoffRecord,
    pub flags: Vec<String>,
    pub cautions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Collaborator traits — nullable dependencies injected at construction
// ---------------------------------------------------------------------------

/// The downstream clinical rules engine. A failure here is recoverable:
/// the controller surfaces a caution and keeps the conversation usable.
pub trait Recommender: Send + Sync {
    fn evaluate(&self, record: &HandoffRecord) -> Result<Recommendation, DialogueError>;
}

/// Optional external analyzer contributing extra observations per turn.
pub trait ExternalAnalyzer: Send + Sync {
    fn analyze(&self, text: &str, state: &SessionState) -> ExternalObservation;
}

/// External store notified when an intake completes or the session resets.
pub trait SessionSink: Send + Sync {
    fn save(&self, intake: &CompletedIntake);
    fn clear(&self);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("Recommendation engine failed: {0}")]
    Recommendation(String),

    #[error("Intake record incomplete: missing {0}")]
    IncompleteIntake(Slot),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_priority_order_is_fixed() {
        assert_eq!(
            Slot::PRIORITY,
            [Slot::Who, Slot::Condition, Slot::Duration, Slot::Action, Slot::Meds]
        );
    }

    #[test]
    fn age_maps_to_bucket_boundaries() {
        assert_eq!(WhoBucket::from_age_years(0), WhoBucket::Infant);
        assert_eq!(WhoBucket::from_age_years(1), WhoBucket::Toddler);
        assert_eq!(WhoBucket::from_age_years(4), WhoBucket::Toddler);
        assert_eq!(WhoBucket::from_age_years(5), WhoBucket::Child);
        assert_eq!(WhoBucket::from_age_years(12), WhoBucket::Child);
        assert_eq!(WhoBucket::from_age_years(13), WhoBucket::Teen);
        assert_eq!(WhoBucket::from_age_years(17), WhoBucket::Teen);
        assert_eq!(WhoBucket::from_age_years(18), WhoBucket::Adult);
    }

    #[test]
    fn default_observation_is_empty() {
        assert!(Observation::default().is_empty());
    }

    #[test]
    fn canonical_ids_round_trip_via_serde() {
        let json = serde_json::to_string(&Condition::SoreThroat).unwrap();
        assert_eq!(json, "\"sorethroat\"");
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Condition::SoreThroat);
    }
}
