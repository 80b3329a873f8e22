//! Stateless analysis of a single utterance.
//!
//! `analyze` applies the pattern tables to one message and returns a
//! partial [`Observation`]. It never mutates session state; the state
//! reference exists so future analyzers can disambiguate references to
//! values already collected.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns;
use super::session::SessionState;
use super::types::{Condition, DurationBucket, ExternalObservation, Observation, Slot, WhoBucket};

// ---------------------------------------------------------------------------
// Negation awareness
// ---------------------------------------------------------------------------

static NEGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:no|not|never|none|without|denies|denied|don'?t|doesn'?t|didn'?t|isn'?t|aren'?t|wasn'?t|weren'?t|hasn'?t|haven'?t)\b",
    )
    .unwrap()
});

/// True when `pattern` matches `text` outside a negated clause.
///
/// A match counts as negated when a negation word precedes it within the
/// same clause (clauses split on `.,;:!?`). "not vomiting blood or
/// collapsing" negates both symptom mentions; "no blood, high fever"
/// negates only the first.
pub fn has_affirmative_pattern(text: &str, pattern: &Regex) -> bool {
    for m in pattern.find_iter(text) {
        let clause_start = text[..m.start()]
            .rfind(['.', ',', ';', ':', '!', '?'])
            .map(|i| i + 1)
            .unwrap_or(0);
        if !NEGATION.is_match(&text[clause_start..m.start()]) {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Red-flag classification
// ---------------------------------------------------------------------------

/// Map a raw red-flag pattern string (as contributed by an external
/// analyzer) to a human-readable description.
pub fn classify_flag_pattern(pattern: &str) -> Option<&'static str> {
    if pattern.is_empty() {
        return None;
    }
    let p = pattern.to_lowercase();
    if p.contains("vomit") || p.contains("stool") || p.contains("blood") {
        Some("Mentioned blood in vomit or stool.")
    } else if p.contains("chest") || p.contains("abdominal") {
        Some("Mentioned severe chest or abdominal pain.")
    } else if p.contains("collapse") || p.contains("unconscious") {
        Some("Mentioned collapse or loss of consciousness.")
    } else if p.contains("stiff neck") || p.contains("rash") {
        Some("Mentioned meningitis warning signs (stiff neck or rash).")
    } else {
        Some("Mentioned a potential red flag symptom.")
    }
}

/// Negation-aware red-flag mentions for one utterance, deduplicated.
pub fn detect_red_flags(text: &str) -> Vec<String> {
    let mut flags = Vec::new();
    for rule in patterns::red_flag_rules() {
        if has_affirmative_pattern(text, &rule.pattern)
            && !flags.iter().any(|f| f == rule.description)
        {
            flags.push(rule.description.to_string());
        }
    }
    flags
}

// ---------------------------------------------------------------------------
// Multi-mention detectors
// ---------------------------------------------------------------------------

/// All condition values mentioned, in table order. More than one entry
/// means the utterance is contradictory or ambiguous for the slot.
pub fn condition_mentions(text: &str) -> Vec<Condition> {
    patterns::condition_mentions(text)
}

/// All demographic buckets mentioned, in table order.
pub fn who_mentions(text: &str) -> Vec<WhoBucket> {
    patterns::who_mentions(text)
}

// ---------------------------------------------------------------------------
// Free-text merge policy (action / meds)
// ---------------------------------------------------------------------------

/// Merge an incremental free-text value into a slot.
///
/// Identical values collapse; a superstring replaces the prior value; a
/// disjoint addition joins as a readable list. A literal `none` only
/// lands when the slot was unset (or already `none`) — it never erases a
/// positive value, and a later positive value replaces `none`.
pub fn merge_free_text(existing: Option<&str>, incoming: &str) -> String {
    let incoming = incoming.trim();
    if incoming.eq_ignore_ascii_case("none") {
        return match existing {
            None => "none".to_string(),
            Some(prior) if prior.eq_ignore_ascii_case("none") => "none".to_string(),
            Some(prior) => prior.to_string(),
        };
    }
    match existing {
        None => incoming.to_string(),
        Some(prior) if prior.eq_ignore_ascii_case("none") => incoming.to_string(),
        Some(prior) if prior.eq_ignore_ascii_case(incoming) => prior.to_string(),
        Some(prior) => {
            let prior_lc = prior.to_lowercase();
            let incoming_lc = incoming.to_lowercase();
            if incoming_lc.contains(&prior_lc) {
                incoming.to_string()
            } else if prior_lc.contains(&incoming_lc) {
                prior.to_string()
            } else {
                format!("{prior}, {incoming}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// General analysis
// ---------------------------------------------------------------------------

static ACTION_DENIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnothing\b|\bnone\b|haven'?t\s+tried|not\s+tried\s+anything").unwrap()
});

static MEDS_DENIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnothing\b|\bnone\b|no\s+(?:other\s+)?(?:medicines?|medications?|meds|tablets?)")
        .unwrap()
});

/// "taking X" / "I take X" / "on X" marks a substance as a current
/// medicine rather than something tried for this episode.
static MEDS_CONTEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btaking\b|\bi\s+take\b|\bam\s+on\b|\bregularly\b").unwrap());

/// Analyze one utterance against the pattern tables.
///
/// Pure with respect to the tables; `_state` is never mutated and is
/// currently unused by the built-in rules.
pub fn analyze(text: &str, _state: &SessionState) -> Observation {
    let conditions = condition_mentions(text);
    let who = who_mentions(text);
    let duration = patterns::match_duration(text);

    let substances = patterns::substance_mentions(text);
    let self_care = patterns::self_care_mentions(text);

    let meds_context = MEDS_CONTEXT.is_match(text);
    let mut action_parts: Vec<&str> = Vec::new();
    let mut meds_parts: Vec<&str> = Vec::new();
    if meds_context {
        meds_parts.extend(&substances);
    } else {
        action_parts.extend(&substances);
    }
    action_parts.extend(&self_care);

    let action = if ACTION_DENIAL.is_match(text) && action_parts.is_empty() {
        Some("none".to_string())
    } else if action_parts.is_empty() {
        None
    } else {
        Some(action_parts.join(", "))
    };

    let meds = if MEDS_DENIAL.is_match(text) && meds_parts.is_empty() {
        Some("none".to_string())
    } else if meds_parts.is_empty() {
        None
    } else {
        Some(meds_parts.join(", "))
    };

    Observation {
        condition: conditions.first().copied(),
        duration,
        who: who.first().copied(),
        action,
        meds,
        red_flags: detect_red_flags(text),
        ambiguous_duration: duration.is_none() && patterns::mentions_elapsed_time(text),
    }
}

/// Fold an external analyzer's contribution into a built-in observation.
/// External values never override what the built-in rules resolved; raw
/// red-flag patterns are classified into descriptions and deduplicated.
pub fn merge_external(obs: &mut Observation, ext: ExternalObservation) {
    if obs.condition.is_none() {
        obs.condition = ext.condition;
    }
    if obs.duration.is_none() {
        obs.duration = ext.duration;
        if obs.duration.is_some() {
            obs.ambiguous_duration = false;
        }
    }
    if obs.who.is_none() {
        obs.who = ext.who;
    }
    if obs.action.is_none() {
        obs.action = ext.action;
    }
    if obs.meds.is_none() {
        obs.meds = ext.meds;
    }
    for pattern in ext.red_flag_patterns {
        if let Some(description) = classify_flag_pattern(&pattern) {
            if !obs.red_flags.iter().any(|f| f == description) {
                obs.red_flags.push(description.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Directed slot fill — stricter than the general analysis
// ---------------------------------------------------------------------------

/// A conclusively parsed value for one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotFill {
    Who(WhoBucket),
    Condition(Condition),
    Duration(DurationBucket),
    Text(String),
}

static FIRST_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bme\b|\bmyself\b|\bi\s+am\b|\bi'?m\b|\bmine\b").unwrap()
});

/// Attempt to resolve an utterance as a direct answer to the slot being
/// asked about. Returns `None` unless the text conclusively resolves to
/// a single valid value — an unconsumed answer falls back to general
/// extraction.
pub fn fill_slot(text: &str, slot: Slot) -> Option<SlotFill> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match slot {
        Slot::Who => {
            let mut mentions = who_mentions(trimmed);
            // First-person answers only count while this slot is the question.
            if mentions.is_empty() && FIRST_PERSON.is_match(trimmed) {
                mentions.push(WhoBucket::Adult);
            }
            match mentions.as_slice() {
                [single] => Some(SlotFill::Who(*single)),
                _ => None,
            }
        }
        Slot::Condition => match condition_mentions(trimmed).as_slice() {
            [single] => Some(SlotFill::Condition(*single)),
            _ => None,
        },
        Slot::Duration => patterns::match_duration(trimmed).map(SlotFill::Duration),
        Slot::Action | Slot::Meds => {
            if patterns::is_denial(trimmed) {
                return Some(SlotFill::Text("none".to_string()));
            }
            // A free-text slot accepts anything except an utterance that
            // plainly answers the duration question instead.
            if patterns::match_duration(trimmed).is_some() || patterns::mentions_elapsed_time(trimmed)
            {
                return None;
            }
            Some(SlotFill::Text(trimmed.to_string()))
        }
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
