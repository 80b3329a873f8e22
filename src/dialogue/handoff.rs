//! The finished intake record.
//!
//! Built once, at the moment every slot is resolved with no escalation,
//! and never mutated afterwards. Later caution/flag merges from the
//! recommendation engine land on the session, not on this record.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::session::SessionState;
use super::types::{Condition, DialogueError, DurationBucket, Slot, WhoBucket};

/// The sole object passed to the external recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub condition: Condition,
    pub who: WhoBucket,
    pub duration: DurationBucket,
    /// Everything the user said, concatenated in order.
    pub free_text_log: String,
    pub action: String,
    pub meds: String,
    /// Structured follow-up answers. Always empty on the conversational
    /// path; the field exists for parity with form-driven intakes.
    pub answers: BTreeMap<String, String>,
    /// Flag/caution state at the moment of completion.
    pub flags: Vec<String>,
    pub cautions: Vec<String>,
    pub built_at: NaiveDateTime,
}

/// Freeze the current session into a handoff record.
/// Fails if any slot is still unset.
pub fn build(state: &SessionState) -> Result<HandoffRecord, DialogueError> {
    let who = state.who().ok_or(DialogueError::IncompleteIntake(Slot::Who))?;
    let condition = state
        .condition()
        .ok_or(DialogueError::IncompleteIntake(Slot::Condition))?;
    let duration = state
        .duration()
        .ok_or(DialogueError::IncompleteIntake(Slot::Duration))?;
    let action = state
        .action()
        .ok_or(DialogueError::IncompleteIntake(Slot::Action))?
        .to_string();
    let meds = state
        .meds()
        .ok_or(DialogueError::IncompleteIntake(Slot::Meds))?
        .to_string();

    Ok(HandoffRecord {
        condition,
        who,
        duration,
        free_text_log: state.free_text_log.clone(),
        action,
        meds,
        answers: BTreeMap::new(),
        flags: state.flags().to_vec(),
        cautions: state.cautions().to_vec(),
        built_at: chrono::Local::now().naive_local(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::types::{DurationBucket, WhoBucket};

    fn filled_state() -> SessionState {
        let mut state = SessionState::new();
        state.begin_collecting();
        state.set_who(WhoBucket::Adult);
        state.set_condition(Condition::Headache);
        state.set_duration(DurationBucket::Days1To3);
        state.merge_action("rest");
        state.merge_meds("none");
        state.append_log("my head hurts");
        state
    }

    #[test]
    fn build_requires_every_slot() {
        let mut state = SessionState::new();
        state.begin_collecting();
        match build(&state) {
            Err(DialogueError::IncompleteIntake(slot)) => assert_eq!(slot, Slot::Who),
            other => panic!("expected IncompleteIntake, got {other:?}"),
        }

        state.set_who(WhoBucket::Adult);
        match build(&state) {
            Err(DialogueError::IncompleteIntake(slot)) => assert_eq!(slot, Slot::Condition),
            other => panic!("expected IncompleteIntake, got {other:?}"),
        }
    }

    #[test]
    fn record_snapshots_session_at_completion() {
        let mut state = filled_state();
        state.add_flag("Bleeding symptoms mentioned.");

        let record = build(&state).unwrap();
        assert_eq!(record.condition, Condition::Headache);
        assert_eq!(record.who, WhoBucket::Adult);
        assert_eq!(record.free_text_log, "my head hurts");
        assert_eq!(record.flags, vec!["Bleeding symptoms mentioned.".to_string()]);
        assert!(record.answers.is_empty());

        // Later session mutations leave the frozen record untouched.
        state.add_flag("Possible emergency symptoms mentioned.");
        assert_eq!(record.flags.len(), 1);
    }
}
