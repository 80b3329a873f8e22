//! Fixed conversational wording.
//!
//! Calm, plain framing throughout. Safety wording is deliberate: the
//! escalation text names the emergency routes and nothing else.

use rand::seq::SliceRandom;

use super::patterns::OffTopic;
use super::session::SessionState;
use super::types::{Condition, DurationBucket, Recommendation, Slot, WhoBucket};

// ---------------------------------------------------------------------------
// Pools — one is picked at random per use
// ---------------------------------------------------------------------------

const GREETINGS: [&str; 3] = [
    "Hi! I'm here to help with over-the-counter medicine advice. What's bothering you today?",
    "Hello! Tell me what symptoms you're experiencing and I'll help find the right treatment.",
    "Hi there! What can I help you with today? Just describe what's going on in your own words.",
];

pub const DISCLAIMER: &str = "I can't diagnose anything — I only help choose over-the-counter \
     options. If this is an emergency, call 999 now.";

const ACKNOWLEDGMENTS: [&str; 5] = [
    "I understand.",
    "Thanks for letting me know.",
    "Got it.",
    "Okay, that helps.",
    "I see.",
];

const WHO_QUESTIONS: [&str; 3] = [
    "Who is this for?",
    "Is this for yourself or someone else?",
    "Can you tell me who needs treatment?",
];

const DURATION_QUESTIONS: [&str; 3] = [
    "How long has this been going on?",
    "When did this start?",
    "How long have you been experiencing this?",
];

const ACTION_QUESTIONS: [&str; 3] = [
    "What have you already tried?",
    "Have you taken anything for this yet?",
    "Any treatments you've already used?",
];

const MEDS_QUESTIONS: [&str; 3] = [
    "Are you currently taking any medicines?",
    "Any regular medications I should know about?",
    "What medicines do you normally take?",
];

fn pick(pool: &[&str]) -> String {
    pool.choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(pool[0])
        .to_string()
}

pub fn greeting() -> String {
    pick(&GREETINGS)
}

pub fn acknowledgment() -> String {
    pick(&ACKNOWLEDGMENTS)
}

// ---------------------------------------------------------------------------
// Slot questions
// ---------------------------------------------------------------------------

fn who_options() -> String {
    WhoBucket::ALL
        .iter()
        .map(|w| w.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn condition_options() -> String {
    Condition::ALL
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn duration_options() -> String {
    DurationBucket::ALL
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The standard question for a slot, options included.
pub fn question(slot: Slot) -> String {
    match slot {
        Slot::Who => format!("{} ({})", pick(&WHO_QUESTIONS), who_options()),
        Slot::Condition => format!(
            "What's the main problem you're dealing with? ({})",
            condition_options()
        ),
        Slot::Duration => format!("{} ({})", pick(&DURATION_QUESTIONS), duration_options()),
        Slot::Action => format!(
            "{} (e.g., rest, fluids, paracetamol, antacid — or say 'none')",
            pick(&ACTION_QUESTIONS)
        ),
        Slot::Meds => format!(
            "{} (e.g., ibuprofen, antihistamine, paracetamol — or say 'none')",
            pick(&MEDS_QUESTIONS)
        ),
    }
}

/// Re-ask after an answer could not be read: enumerates the valid
/// options and nothing else.
pub fn strict_question(slot: Slot) -> String {
    match slot {
        Slot::Who => format!(
            "Sorry, I couldn't tell who this is for. Please pick exactly one of: {}.",
            who_options()
        ),
        Slot::Condition => format!(
            "Sorry, I couldn't match that to a condition I can help with. Please pick one of: {}.",
            condition_options()
        ),
        Slot::Duration => format!(
            "Please pick one of the options so I get this right: {}.",
            duration_options()
        ),
        Slot::Action => {
            "Just tell me anything you've already tried for this, or say 'none'.".to_string()
        }
        Slot::Meds => {
            "Just list any medicines currently being taken, or say 'none'.".to_string()
        }
    }
}

/// Quick-reply chips an external renderer may show for a slot question.
pub fn suggestions(slot: Slot) -> Vec<String> {
    match slot {
        Slot::Who => WhoBucket::ALL.iter().map(|w| w.as_str().to_string()).collect(),
        Slot::Condition => Condition::ALL.iter().map(|c| c.label().to_string()).collect(),
        Slot::Duration => DurationBucket::ALL.iter().map(|d| d.as_str().to_string()).collect(),
        Slot::Action => ["none", "paracetamol", "rest", "fluids", "antacid"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        Slot::Meds => ["none", "ibuprofen", "antihistamine", "paracetamol"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Disambiguation & confirmation
// ---------------------------------------------------------------------------

pub fn who_conflict(candidates: &[WhoBucket]) -> String {
    let listed = candidates
        .iter()
        .map(|w| w.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "I picked up more than one answer for who this is for ({listed}). \
         Which one should I go with?"
    )
}

pub fn condition_conflict(candidates: &[Condition]) -> String {
    let listed = candidates
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "That could be more than one thing ({listed}). \
         Which is the main problem you'd like help with?"
    )
}

pub fn confirm_who_change(current: WhoBucket, proposed: WhoBucket) -> String {
    format!(
        "Earlier I had this down for {current}, but that sounded like {proposed}. \
         Should I switch to {proposed}? Just confirm who this is for."
    )
}

pub fn confirm_condition_change(current: Condition, proposed: Condition) -> String {
    format!(
        "I had {current} noted, but that sounds like {proposed}. \
         Should I switch to {proposed}? Just confirm the main problem."
    )
}

pub fn duration_clarify() -> String {
    format!(
        "I can tell this has been going on for some time, but I need it as one of: {}. \
         Which fits best?",
        duration_options()
    )
}

// ---------------------------------------------------------------------------
// Refusals
// ---------------------------------------------------------------------------

pub fn refusal(kind: OffTopic) -> &'static str {
    match kind {
        OffTopic::Smalltalk => {
            "I'll stay in my lane — symptoms and over-the-counter treatments. \
             What's bothering you health-wise?"
        }
        OffTopic::PrescriptionOnly => {
            "That's a prescription-only medicine, so I can't advise on it here. \
             Your GP or pharmacist is the right person for that. \
             Is there a symptom I can help with over the counter?"
        }
        OffTopic::DiagnosisRequest => {
            "I can't diagnose — only a clinician can do that. \
             What I can do is help pick an over-the-counter treatment once \
             you describe the symptoms."
        }
    }
}

// ---------------------------------------------------------------------------
// Safety questions
// ---------------------------------------------------------------------------

pub fn safety_question(condition: Option<Condition>) -> &'static str {
    match condition {
        Some(Condition::Headache) => {
            "Just to be safe - is this a sudden 'worst ever' headache, or do you \
             have any weakness, confusion, or vision problems?"
        }
        Some(Condition::HayFever) => {
            "Any pregnancy, breastfeeding, or health conditions I should know about?"
        }
        Some(Condition::Indigestion) => {
            "Are you having trouble swallowing, or any severe pain?"
        }
        Some(Condition::Diarrhoea) => {
            "Is there any blood, high fever, or has this been going on more than a week?"
        }
        Some(Condition::SoreThroat) => {
            "Any high fever, trouble swallowing, or has this lasted over a week?"
        }
        Some(Condition::CommonCold) => {
            "Any chest tightness, shortness of breath, or symptoms lasting longer than 10 days?"
        }
        Some(Condition::Cough) => {
            "Have you had this cough for more than 3 weeks, or are you breathless \
             or coughing up blood?"
        }
        Some(Condition::Constipation) => {
            "Any severe stomach pain, vomiting, or blood when you go to the toilet?"
        }
        None => "Any concerning symptoms I should know about?",
    }
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

pub const ESCALATION: &str =
    "Red flag symptoms detected. Do not start new over-the-counter medicines until a \
     healthcare professional reviews you. Seek urgent advice now — NHS 111, your GP, or \
     999/A&E for severe bleeding, chest pain, collapse, or vomiting blood.";

pub const ESCALATED_REMINDER: &str =
    "This check is paused for safety. Please seek urgent medical advice — NHS 111, your \
     GP, or 999 in an emergency. Start a new consultation if you need anything else.";

pub const RECOMMENDER_FAILURE: &str =
    "I couldn't fetch tailored guidance just now, so treat this as incomplete — please \
     confirm any medicine choice with a pharmacist.";

// ---------------------------------------------------------------------------
// Recap / closing / handoff prose
// ---------------------------------------------------------------------------

fn known_slots_prose(state: &SessionState) -> String {
    let mut parts = Vec::new();
    for slot in Slot::PRIORITY {
        if let Some(value) = state.slot_display(slot) {
            let label = match slot {
                Slot::Who => "this is for",
                Slot::Condition => "the problem is",
                Slot::Duration => "it has lasted",
                Slot::Action => "already tried",
                Slot::Meds => "current medicines",
            };
            parts.push(format!("{label} {value}"));
        }
    }
    parts.join("; ")
}

/// Prose summary of what is known so far plus what is still missing.
pub fn recap(state: &SessionState) -> String {
    let known = known_slots_prose(state);
    let missing = state.missing_slots();
    let mut text = if known.is_empty() {
        "So far I haven't got any details down yet.".to_string()
    } else {
        format!("So far: {known}.")
    };
    if !missing.is_empty() {
        let listed = missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
        text.push_str(&format!(" Still to cover: {listed}."));
    }
    text
}

/// Closing message for a pure "thanks / bye" turn.
pub fn closing(state: &SessionState) -> String {
    let mut text = String::from(
        "Take care! Remember to read the patient information leaflet with any medicine, \
         and see a pharmacist or GP if things don't improve.",
    );
    if !state.flags().is_empty() {
        text.push_str(
            " And please do follow up on the warning signs we discussed — \
             don't leave those unchecked.",
        );
    }
    text
}

/// Summary emitted when the intake completes and is handed off.
pub fn handoff_summary(state: &SessionState, recommendation: Option<&Recommendation>) -> String {
    let mut lines = vec![format!(
        "Here's what I've got — condition: {}; who: {}; duration: {}; already tried: {}; current medicines: {}.",
        state.slot_display(Slot::Condition).unwrap_or_else(|| "-".into()),
        state.slot_display(Slot::Who).unwrap_or_else(|| "-".into()),
        state.slot_display(Slot::Duration).unwrap_or_else(|| "-".into()),
        state.slot_display(Slot::Action).unwrap_or_else(|| "-".into()),
        state.slot_display(Slot::Meds).unwrap_or_else(|| "-".into()),
    )];

    if let Some(rec) = recommendation {
        if !rec.advice.is_empty() {
            let names = rec
                .advice
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("Options that may suit: {names}."));
        }
        if !rec.self_care.is_empty() {
            lines.push(format!("Self-care: {}.", rec.self_care.join("; ")));
        }
    }
    if !state.cautions().is_empty() {
        lines.push(format!("Worth noting: {}", state.cautions().join(" ")));
    }
    if !state.flags().is_empty() {
        lines.push(format!(
            "Please also get these checked by a professional: {}",
            state.flags().join(" ")
        ));
    }
    lines.push("You can ask me more questions or start a new consultation.".to_string());
    lines.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::types::DurationBucket;

    #[test]
    fn questions_enumerate_their_options() {
        assert!(question(Slot::Who).contains("pregnant"));
        assert!(question(Slot::Condition).contains("hay fever"));
        assert!(question(Slot::Duration).contains("1–3 days"));
        assert!(question(Slot::Meds).contains("'none'"));
        assert!(strict_question(Slot::Who).contains("toddler 1–4"));
    }

    #[test]
    fn recap_lists_known_and_missing() {
        let mut state = SessionState::new();
        state.set_condition(crate::dialogue::types::Condition::Headache);
        state.set_duration(DurationBucket::Days1To3);
        let text = recap(&state);
        assert!(text.contains("headache"));
        assert!(text.contains("1–3 days"));
        assert!(text.contains("who"));
        assert!(text.contains("meds"));
    }

    #[test]
    fn closing_mentions_flags_only_when_present() {
        let mut state = SessionState::new();
        assert!(!closing(&state).contains("warning signs"));
        state.add_flag("Bleeding symptoms mentioned.");
        assert!(closing(&state).contains("warning signs"));
    }

    #[test]
    fn conflict_prompts_name_all_candidates() {
        let text = condition_conflict(&[
            crate::dialogue::types::Condition::Headache,
            crate::dialogue::types::Condition::Indigestion,
        ]);
        assert!(text.contains("headache"));
        assert!(text.contains("indigestion"));
    }
}
