//! Red-flag rule set applied to every turn.
//!
//! Condition-specific rules fire only while the session's condition slot
//! matches; the emergency rules are condition-agnostic. Every rule is
//! negation-aware, and a flag is raised at most once per session, so
//! re-evaluating the same utterance is a no-op.

use std::sync::LazyLock;

use regex::Regex;

use super::extractor::has_affirmative_pattern;
use super::session::SessionState;
use super::types::Condition;

struct SafetyRule {
    /// `None` = condition-agnostic.
    condition: Option<Condition>,
    pattern: Regex,
    description: &'static str,
}

fn rx(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).unwrap()
}

static SAFETY_RULES: LazyLock<Vec<SafetyRule>> = LazyLock::new(|| {
    vec![
        SafetyRule {
            condition: Some(Condition::Headache),
            pattern: rx(
                r"worst[\s-]*ever|thunderclap|head\s+injury|\bweakness\b|\bconfusion\b|\bvision\b",
            ),
            description: "Headache red flags — seek urgent advice (pharmacist/GP/111).",
        },
        SafetyRule {
            condition: Some(Condition::Indigestion),
            pattern: rx(
                r"trouble\s+swallow|difficulty\s+swallow|vomit.*blood|black\s+stools?|severe\s+pain",
            ),
            description: "Indigestion red flags — urgent medical assessment needed.",
        },
        SafetyRule {
            condition: Some(Condition::Diarrhoea),
            pattern: rx(r"\bblood\b|high\s+fever|severe\s+pain|\bweeks?\b|more\s+than\s+a\s+week"),
            description: "Diarrhoea red flags — seek medical advice.",
        },
        SafetyRule {
            condition: Some(Condition::Cough),
            pattern: rx(r"(?:three|3)\s+weeks|cough(?:ing)?\s+(?:up\s+)?blood"),
            description: "Cough red flags — seek medical advice.",
        },
        SafetyRule {
            condition: None,
            pattern: rx(
                r"chest\s+pain|can'?t\s+breathe|cannot\s+breathe|breathless|collaps|unconscious|seizure|passed?\s+out|vomit(?:ing)?\s+(?:lots\s+of\s+)?blood",
            ),
            description: "Emergency symptoms — call 999 or go to A&E immediately.",
        },
        SafetyRule {
            condition: None,
            pattern: rx(
                r"stiff\s+neck|non[- ]?blanching|rash\s+that\s+(?:doesn'?t|won'?t)\s+fade|photophobia|light\s+hurts",
            ),
            description: "Meningitis warning signs — seek emergency care now.",
        },
    ]
});

/// Apply the rule set to one utterance, appending any newly-raised flags
/// to the session. Returns only the flags that were not already present,
/// so repeated identical input raises each flag at most once.
pub fn evaluate(text: &str, state: &mut SessionState) -> Vec<String> {
    let mut newly_raised = Vec::new();
    for rule in SAFETY_RULES.iter() {
        if let Some(required) = rule.condition {
            if state.condition() != Some(required) {
                continue;
            }
        }
        if has_affirmative_pattern(text, &rule.pattern) && state.add_flag(rule.description) {
            newly_raised.push(rule.description.to_string());
        }
    }
    if !newly_raised.is_empty() {
        tracing::info!(
            session_id = %state.id,
            count = newly_raised.len(),
            "red flags raised"
        );
    }
    newly_raised
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_specific_rule_requires_matching_condition() {
        let mut state = SessionState::new();
        // No condition set: headache-specific rule stays inactive,
        // but "worst ever" alone matches no general rule either.
        let raised = evaluate("worst ever pain with confusion", &mut state);
        assert!(raised.is_empty());

        state.set_condition(Condition::Headache);
        let raised = evaluate("This is the worst ever headache with confusion and vision problems.", &mut state);
        assert_eq!(
            raised,
            vec!["Headache red flags — seek urgent advice (pharmacist/GP/111).".to_string()]
        );
    }

    #[test]
    fn general_emergency_rule_fires_without_condition() {
        let mut state = SessionState::new();
        let raised = evaluate("He cannot breathe, has crushing chest pain, and is vomiting blood.", &mut state);
        assert!(raised
            .iter()
            .any(|f| f == "Emergency symptoms — call 999 or go to A&E immediately."));
    }

    #[test]
    fn calm_text_raises_nothing() {
        let mut state = SessionState::new();
        let raised = evaluate("Just checking in, nothing major to report besides feeling fine.", &mut state);
        assert!(raised.is_empty());
        assert!(state.flags().is_empty());
    }

    #[test]
    fn denied_symptoms_raise_nothing() {
        let mut state = SessionState::new();
        state.set_condition(Condition::Diarrhoea);
        let raised = evaluate("No blood, no fever, just mild cramping.", &mut state);
        assert!(raised.is_empty());
        assert!(state.flags().is_empty());
    }

    #[test]
    fn repeated_evaluation_is_idempotent() {
        let mut state = SessionState::new();
        state.set_condition(Condition::Headache);

        let first = evaluate("Worst ever headache with collapse.", &mut state);
        assert_eq!(first.len(), 2); // condition-specific + general emergency

        let second = evaluate("Worst ever headache with collapse.", &mut state);
        assert!(second.is_empty());
        assert_eq!(state.flags().len(), 2);
    }

    #[test]
    fn meningitis_signs_raise_general_flag() {
        let mut state = SessionState::new();
        let raised = evaluate("she has a stiff neck and the light hurts her eyes", &mut state);
        assert_eq!(
            raised,
            vec!["Meningitis warning signs — seek emergency care now.".to_string()]
        );
    }
}
