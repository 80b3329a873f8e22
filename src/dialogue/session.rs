//! The mutable conversation record. Owned exclusively by the controller;
//! every write goes through a method so the state invariants hold by
//! construction:
//!
//! - once escalated, no slot is ever written again and `pending_slot`
//!   stays clear
//! - closed-vocabulary slots only ever hold values from their enum
//! - `flags` only grows, stays deduplicated, keeps insertion order

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use super::extractor::merge_free_text;
use super::handoff::HandoffRecord;
use super::types::{Condition, DurationBucket, Slot, WhoBucket};

/// Conversation phase. `Escalated` is terminal; restart is the only exit.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Greeting,
    Collecting,
    SafetyCheck,
    Escalated,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Collecting => "collecting",
            Self::SafetyCheck => "safety_check",
            Self::Escalated => "escalated",
        }
    }
}

/// The five intake slots. Closed slots hold enum values only; action and
/// meds are free-text-mergeable.
#[derive(Debug, Clone, Default, Serialize)]
struct Slots {
    who: Option<WhoBucket>,
    condition: Option<Condition>,
    duration: Option<DurationBucket>,
    action: Option<String>,
    meds: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub id: Uuid,
    step: Step,
    slots: Slots,
    /// Append-only concatenation of every raw utterance.
    pub free_text_log: String,
    flags: Vec<String>,
    cautions: Vec<String>,
    pending_slot: Option<Slot>,
    /// The user referenced elapsed time that mapped to no bucket.
    pub duration_ambiguous: bool,
    last_handoff: Option<HandoffRecord>,
    pub started_at: NaiveDateTime,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: Step::Greeting,
            slots: Slots::default(),
            free_text_log: String::new(),
            flags: Vec::new(),
            cautions: Vec::new(),
            pending_slot: None,
            duration_ambiguous: false,
            last_handoff: None,
            started_at: chrono::Local::now().naive_local(),
        }
    }

    /// Discard everything and start over. The only exit from `Escalated`.
    pub fn reset(&mut self) {
        *self = SessionState::new();
    }

    // ── Step transitions ──

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn begin_collecting(&mut self) {
        if self.step == Step::Greeting {
            self.step = Step::Collecting;
        }
    }

    pub fn enter_safety_check(&mut self) {
        if self.step == Step::Collecting {
            self.step = Step::SafetyCheck;
            self.pending_slot = None;
        }
    }

    pub fn return_to_collecting(&mut self) {
        if self.step == Step::SafetyCheck {
            self.step = Step::Collecting;
        }
    }

    /// Terminal transition. Clears any pending question so an escalated
    /// session can never carry a dangling prompt.
    pub fn escalate(&mut self) {
        self.step = Step::Escalated;
        self.pending_slot = None;
    }

    pub fn is_escalated(&self) -> bool {
        self.step == Step::Escalated
    }

    // ── Pending slot ──

    pub fn pending_slot(&self) -> Option<Slot> {
        self.pending_slot
    }

    pub fn set_pending_slot(&mut self, slot: Slot) {
        if !self.is_escalated() {
            self.pending_slot = Some(slot);
        }
    }

    pub fn clear_pending_slot(&mut self) {
        self.pending_slot = None;
    }

    // ── Slot reads ──

    pub fn who(&self) -> Option<WhoBucket> {
        self.slots.who
    }

    pub fn condition(&self) -> Option<Condition> {
        self.slots.condition
    }

    pub fn duration(&self) -> Option<DurationBucket> {
        self.slots.duration
    }

    pub fn action(&self) -> Option<&str> {
        self.slots.action.as_deref()
    }

    pub fn meds(&self) -> Option<&str> {
        self.slots.meds.as_deref()
    }

    /// Display value for recaps, or `None` while the slot is unset.
    pub fn slot_display(&self, slot: Slot) -> Option<String> {
        match slot {
            Slot::Who => self.slots.who.map(|w| w.to_string()),
            Slot::Condition => self.slots.condition.map(|c| c.label().to_string()),
            Slot::Duration => self.slots.duration.map(|d| d.to_string()),
            Slot::Action => self.slots.action.clone(),
            Slot::Meds => self.slots.meds.clone(),
        }
    }

    pub fn is_slot_set(&self, slot: Slot) -> bool {
        match slot {
            Slot::Who => self.slots.who.is_some(),
            Slot::Condition => self.slots.condition.is_some(),
            Slot::Duration => self.slots.duration.is_some(),
            Slot::Action => self.slots.action.is_some(),
            Slot::Meds => self.slots.meds.is_some(),
        }
    }

    /// First unset slot in the fixed priority order.
    pub fn next_unset_slot(&self) -> Option<Slot> {
        Slot::PRIORITY.iter().copied().find(|s| !self.is_slot_set(*s))
    }

    pub fn missing_slots(&self) -> Vec<Slot> {
        Slot::PRIORITY
            .iter()
            .copied()
            .filter(|s| !self.is_slot_set(*s))
            .collect()
    }

    pub fn all_slots_set(&self) -> bool {
        self.next_unset_slot().is_none()
    }

    // ── Slot writes — all refused after escalation ──

    pub fn set_who(&mut self, value: WhoBucket) -> bool {
        if self.is_escalated() {
            return false;
        }
        self.slots.who = Some(value);
        true
    }

    pub fn set_condition(&mut self, value: Condition) -> bool {
        if self.is_escalated() {
            return false;
        }
        self.slots.condition = Some(value);
        true
    }

    pub fn set_duration(&mut self, value: DurationBucket) -> bool {
        if self.is_escalated() {
            return false;
        }
        self.slots.duration = Some(value);
        self.duration_ambiguous = false;
        true
    }

    /// Merge a free-text value into the action slot (see merge policy).
    pub fn merge_action(&mut self, value: &str) -> bool {
        if self.is_escalated() {
            return false;
        }
        self.slots.action = Some(merge_free_text(self.slots.action.as_deref(), value));
        true
    }

    pub fn merge_meds(&mut self, value: &str) -> bool {
        if self.is_escalated() {
            return false;
        }
        self.slots.meds = Some(merge_free_text(self.slots.meds.as_deref(), value));
        true
    }

    pub fn clear_who(&mut self) {
        self.slots.who = None;
    }

    pub fn clear_condition(&mut self) {
        self.slots.condition = None;
    }

    pub fn clear_duration(&mut self) {
        self.slots.duration = None;
    }

    // ── Flags & cautions ──

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Append a flag unless already present. Returns true when new.
    /// Flags are never removed within a session.
    pub fn add_flag(&mut self, description: &str) -> bool {
        if description.is_empty() || self.flags.iter().any(|f| f == description) {
            return false;
        }
        self.flags.push(description.to_string());
        true
    }

    pub fn cautions(&self) -> &[String] {
        &self.cautions
    }

    pub fn merge_cautions<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) {
        for item in items {
            if !item.is_empty() && !self.cautions.iter().any(|c| c == item) {
                self.cautions.push(item.to_string());
            }
        }
    }

    // ── Free-text log & handoff ──

    pub fn append_log(&mut self, utterance: &str) {
        if utterance.is_empty() {
            return;
        }
        if !self.free_text_log.is_empty() {
            self.free_text_log.push(' ');
        }
        self.free_text_log.push_str(utterance);
    }

    pub fn last_handoff(&self) -> Option<&HandoffRecord> {
        self.last_handoff.as_ref()
    }

    pub fn record_handoff(&mut self, record: HandoffRecord) {
        self.last_handoff = Some(record);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
