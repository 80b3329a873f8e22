//! Conversational intake engine.
//!
//! Turns free-text statements into a structured intake record (who is
//! affected, presenting condition, duration, prior action, current
//! medicines) while screening every turn for emergency red flags.
//!
//! Layering, leaves first:
//! - `patterns` — static recognition rule tables (pure data)
//! - `types` — closed vocabularies, observations, collaborator traits
//! - `extractor` — stateless analysis of one utterance
//! - `session` — the exclusively-owned conversation state
//! - `safety` — condition-specific and general red-flag rules
//! - `messages` — fixed prompt/refusal/escalation wording
//! - `handoff` — the frozen intake record
//! - `controller` — the state machine driving all of the above

pub mod controller;
pub mod extractor;
pub mod handoff;
pub mod messages;
pub mod patterns;
pub mod safety;
pub mod session;
pub mod types;
