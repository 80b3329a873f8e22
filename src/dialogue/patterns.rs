//! Static recognition rule tables.
//!
//! Pure lookup, no state. Each table is an ordered list of
//! (canonical value, patterns); within a table the first matching entry
//! wins, so entry order is the tie-break order. The controller never
//! inspects patterns directly — extending a table is a data change only.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Condition, DurationBucket, WhoBucket};

fn rx(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).unwrap()
}

// ---------------------------------------------------------------------------
// RuleSet — ordered canonical-value → pattern-list table
// ---------------------------------------------------------------------------

pub struct RuleSet<T: Copy + PartialEq> {
    entries: Vec<(T, Vec<Regex>)>,
}

impl<T: Copy + PartialEq> RuleSet<T> {
    fn new(defs: &[(T, &[&str])]) -> Self {
        Self {
            entries: defs
                .iter()
                .map(|(value, patterns)| (*value, patterns.iter().map(|p| rx(p)).collect()))
                .collect(),
        }
    }

    /// First entry (in definition order) with any matching pattern.
    pub fn first_match(&self, text: &str) -> Option<T> {
        self.entries
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(text)))
            .map(|(value, _)| *value)
    }

    /// Every entry with a matching pattern, in definition order.
    pub fn mentions(&self, text: &str) -> Vec<T> {
        self.entries
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| p.is_match(text)))
            .map(|(value, _)| *value)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Condition table
// ---------------------------------------------------------------------------

static CONDITIONS: LazyLock<RuleSet<Condition>> = LazyLock::new(|| {
    RuleSet::new(&[
        (
            Condition::Headache,
            &[
                r"head(ache|s? (hurt|pain|pound|throb))",
                r"migraine",
                r"tension.*head",
                r"pressure.*head",
            ][..],
        ),
        (
            Condition::HayFever,
            &[
                r"hay\s?fever",
                r"(runny|stuffy|blocked).*nose",
                r"sneez",
                r"allergic.*rhinitis",
                r"eyes.*itch",
                r"pollen",
                r"seasonal.*allerg",
            ],
        ),
        (
            Condition::Indigestion,
            &[
                r"heartburn",
                r"indigestion",
                r"acid.*reflux",
                r"burning.*(chest|stomach)",
                r"stomach.*burn",
                r"after.*eat.*hurt",
            ],
        ),
        (
            Condition::Diarrhoea,
            &[
                r"diarr?h(o|e)ea",
                r"loose.*stool",
                r"runny.*stool",
                r"the.*runs",
                r"tummy.*bug",
                r"stomach.*upset",
            ],
        ),
        (
            Condition::SoreThroat,
            &[
                r"sore.*throat",
                r"throat.*(hurt|pain)",
                r"hurt.*swallow",
                r"pain.*swallow",
                r"throat.*raw",
                r"scratchy.*throat",
            ],
        ),
        (
            Condition::CommonCold,
            &[
                r"common.*cold",
                r"blocked.*nose",
                r"stuffy",
                r"congestion",
                r"sniffles",
                r"(runny|streaming).*nose",
            ],
        ),
        (
            Condition::Cough,
            &[
                r"cough",
                r"tickly.*throat",
                r"chesty",
                r"phlegm|sputum",
                r"hacking",
                r"whooping",
            ],
        ),
        (
            Condition::Constipation,
            &[
                r"constipation",
                r"hard.*stool",
                r"no.*bowel",
                r"straining",
                r"bowel.*stuck",
            ],
        ),
    ])
});

pub fn condition_rules() -> &'static RuleSet<Condition> {
    &CONDITIONS
}

/// All conditions mentioned, in table order.
pub fn condition_mentions(text: &str) -> Vec<Condition> {
    CONDITIONS.mentions(text)
}

// ---------------------------------------------------------------------------
// Who table
// ---------------------------------------------------------------------------

static WHO: LazyLock<RuleSet<WhoBucket>> = LazyLock::new(|| {
    RuleSet::new(&[
        (WhoBucket::Adult, &[r"\badult\b", r"grown[ -]?up", r"\bmyself\b"][..]),
        (WhoBucket::Teen, &[r"\bteen(?:ager)?\b"]),
        (
            WhoBucket::Child,
            &[r"\bchild\b", r"\bkid\b", r"\bson\b", r"\bdaughter\b"],
        ),
        (WhoBucket::Toddler, &[r"\btoddler\b", r"little one"]),
        (
            WhoBucket::Infant,
            &[r"\bbaby\b", r"\binfant\b", r"newborn", r"under\s*(?:a\s*)?(?:1|one)\b"],
        ),
        (WhoBucket::Pregnant, &[r"pregnan", r"expecting"]),
        (
            WhoBucket::Breastfeeding,
            &[r"breast[ -]?feed", r"\bnursing\b"],
        ),
    ])
});

/// "12-year-old", "12 year old", "aged 12", "12 yo".
static AGE: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"\b(\d{1,3})\s*[- ]?\s*(?:year|yr)s?[- ]?old\b|\baged?\s+(\d{1,3})\b|\b(\d{1,3})\s*yo\b")
});

pub fn who_rules() -> &'static RuleSet<WhoBucket> {
    &WHO
}

/// All demographic buckets mentioned, in table order, with stated ages
/// mapped to their bucket. Deduplicated, order preserved.
pub fn who_mentions(text: &str) -> Vec<WhoBucket> {
    let mut mentions = WHO.mentions(text);
    for caps in AGE.captures_iter(text) {
        let digits = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str());
        if let Some(age) = digits.and_then(|d| d.parse::<u32>().ok()) {
            let bucket = WhoBucket::from_age_years(age);
            if !mentions.contains(&bucket) {
                mentions.push(bucket);
            }
        }
    }
    mentions
}

// ---------------------------------------------------------------------------
// Duration table
// ---------------------------------------------------------------------------

// Entry order is load-bearing: "about a week" must resolve to 4–7 days
// before the bare "week(s)" rule maps it to > 7 days.
static DURATIONS: LazyLock<RuleSet<DurationBucket>> = LazyLock::new(|| {
    RuleSet::new(&[
        (
            DurationBucket::Under24Hours,
            &[
                r"\btoday\b",
                r"this morning",
                r"few hours",
                r"\byesterday\b",
                r"last night",
                r"<\s*24\s*hours?",
            ][..],
        ),
        (
            DurationBucket::Days1To3,
            &[
                r"couple\s*(?:of)?\s*days?",
                r"few\s*days?",
                r"2\s*[–-]\s*3\s*days?",
                r"1\s*[–-]\s*3\s*days?",
            ],
        ),
        (
            DurationBucket::Days4To7,
            &[
                r"about\s*a?\s*week",
                r"nearly\s*a?\s*week",
                r"almost\s*a?\s*week",
                r"5\s*[–-]\s*6\s*days?",
                r"4\s*[–-]\s*7\s*days?",
            ],
        ),
        (
            DurationBucket::Over7Days,
            &[
                r"over\s*a?\s*week",
                r"more\s*than\s*a?\s*week",
                r">\s*7\s*days?",
                r"\bweeks?\b",
                r"\bmonths?\b",
                r"long time",
            ],
        ),
        (
            DurationBucket::Recurrent,
            &[
                r"comes?\s*(?:and|&)\s*goes?",
                r"on\s*and\s*off",
                r"recurring",
                r"recurrent",
                r"\bfrequent(?:ly)?\b",
            ],
        ),
    ])
});

static DURATION_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| rx(r"(\d+(?:\.\d+)?)\s*(hour|hr|day|week|month)s?\b"));

/// Numeric-with-unit fallback. Decimals round down before bucketing:
/// hours → <24h; days ≤3 → 1–3d; days ≤7 → 4–7d; anything longer → >7d.
pub fn parse_numeric_duration(text: &str) -> Option<DurationBucket> {
    let caps = DURATION_NUMERIC.captures(text)?;
    let n = caps.get(1)?.as_str().parse::<f64>().ok()?.floor() as u64;
    let unit = caps.get(2)?.as_str().to_lowercase();
    Some(match unit.as_str() {
        "hour" | "hr" => DurationBucket::Under24Hours,
        "day" => match n {
            0 => DurationBucket::Under24Hours,
            1..=3 => DurationBucket::Days1To3,
            4..=7 => DurationBucket::Days4To7,
            _ => DurationBucket::Over7Days,
        },
        _ => DurationBucket::Over7Days,
    })
}

/// Resolve an utterance to a duration bucket: phrase rules first
/// (definition order), then the numeric fallback.
pub fn match_duration(text: &str) -> Option<DurationBucket> {
    DURATIONS
        .first_match(text)
        .or_else(|| parse_numeric_duration(text))
}

pub fn duration_rules() -> &'static RuleSet<DurationBucket> {
    &DURATIONS
}

/// Generic elapsed-time vocabulary that signals the user answered the
/// duration question without mapping to any bucket.
static TEMPORAL_VOCAB: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bsince\b",
        r"for\s+(?:a\s+)?(?:while|ages|some\s+time|ever|long)",
        r"\ba\s+while\b",
        r"\bages\b",
        r"\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        r"\b(?:morning|afternoon|evening|night)s?\b",
        r"\bstarted\b|\bbegan\b|\bbegun\b",
        r"\blately\b|\brecently\b",
    ]
    .iter()
    .map(|p| rx(p))
    .collect()
});

pub fn mentions_elapsed_time(text: &str) -> bool {
    TEMPORAL_VOCAB.iter().any(|p| p.is_match(text))
}

// ---------------------------------------------------------------------------
// Action / meds vocabulary
// ---------------------------------------------------------------------------

static SUBSTANCES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("paracetamol", r"paracetamol|tylenol|calpol"),
        ("ibuprofen", r"ibuprofen|advil|nurofen"),
        ("antihistamine", r"antihistamine|cetirizine|loratadine|piriton"),
        ("antacid", r"antacid|gaviscon|rennie"),
    ]
    .iter()
    .map(|(name, p)| (*name, rx(p)))
    .collect()
});

static SELF_CARE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("rest", r"\brest(?:ed|ing)?\b|\bsleep\b|lying down"),
        ("fluids", r"\bfluids\b|plenty of water|drinking (?:more )?water"),
        ("steam", r"\bsteam(?:y)?\b"),
    ]
    .iter()
    .map(|(name, p)| (*name, rx(p)))
    .collect()
});

/// Known substances mentioned (shared by the action and meds slots).
pub fn substance_mentions(text: &str) -> Vec<&'static str> {
    SUBSTANCES
        .iter()
        .filter(|(_, p)| p.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

/// Non-medicinal approaches mentioned (action slot only).
pub fn self_care_mentions(text: &str) -> Vec<&'static str> {
    SELF_CARE
        .iter()
        .filter(|(_, p)| p.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

static DENIAL: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"\bnothing\b|\bnone\b|haven'?t\s+(?:tried|taken)|not\s+(?:tried|taken)\s+anything|no\s+(?:other\s+)?(?:medicines?|medications?|meds|tablets?)")
});

/// Explicit "nothing / none" answers for the free-text slots.
pub fn is_denial(text: &str) -> bool {
    DENIAL.is_match(text)
}

// ---------------------------------------------------------------------------
// Red-flag vocabulary (general, condition-agnostic mentions)
// ---------------------------------------------------------------------------

pub struct RedFlagRule {
    pub pattern: Regex,
    pub description: &'static str,
}

static RED_FLAGS: LazyLock<Vec<RedFlagRule>> = LazyLock::new(|| {
    [
        (r"\bblood\b|bleed", "Bleeding symptoms mentioned."),
        (
            r"can'?t\s+breathe|cannot\s+breathe|struggling\s+to\s+breathe|short(?:ness)?\s+of\s+breath|breathless|chest\s+pain|collaps|unconscious|seizure|passed?\s+out",
            "Possible emergency symptoms mentioned.",
        ),
        (
            r"stiff\s+neck|non[- ]?blanching|rash\s+that\s+(?:doesn'?t|won'?t)\s+fade|light\s+hurts|photophobia",
            "Meningitis warning signs mentioned.",
        ),
        (
            r"worst[\s-]*ever|thunderclap|sudden\s+severe",
            "Sudden severe headache mentioned.",
        ),
    ]
    .iter()
    .map(|(p, description)| RedFlagRule {
        pattern: rx(p),
        description,
    })
    .collect()
});

pub fn red_flag_rules() -> &'static [RedFlagRule] {
    &RED_FLAGS
}

// ---------------------------------------------------------------------------
// Off-topic / closure / recap triggers
// ---------------------------------------------------------------------------

/// Why an utterance was refused rather than processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffTopic {
    /// Jokes, identity questions, small talk about the assistant.
    Smalltalk,
    /// Requests for prescription-only medicines.
    PrescriptionOnly,
    /// Requests for a diagnosis.
    DiagnosisRequest,
}

static OFF_TOPIC: LazyLock<Vec<(OffTopic, Regex)>> = LazyLock::new(|| {
    [
        (
            OffTopic::Smalltalk,
            r"tell\s+me\s+a\s+joke|are\s+you\s+(?:a\s+)?(?:real|human|robot|an?\s+ai|ai)\b|what(?:'s|\s+is)\s+your\s+name|who\s+(?:are|made)\s+you",
        ),
        (
            OffTopic::PrescriptionOnly,
            r"\bantibiotics?\b|\bamoxicillin\b|\bdiazepam\b|\bvalium\b|\btramadol\b|\bcodeine\b|\bmorphine\b|\boxycodone\b|\bsertraline\b|\bcitalopram\b",
        ),
        (
            OffTopic::DiagnosisRequest,
            r"diagnos|what\s+do\s+i\s+have\b|what'?s\s+wrong\s+with\s+me|is\s+it\s+(?:cancer|serious)",
        ),
    ]
    .iter()
    .map(|(kind, p)| (*kind, rx(p)))
    .collect()
});

pub fn match_off_topic(text: &str) -> Option<OffTopic> {
    OFF_TOPIC
        .iter()
        .find(|(_, p)| p.is_match(text))
        .map(|(kind, _)| *kind)
}

static RECAP: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"\brecap\b|\bsummar(?:y|ise|ize)\b|what\s+(?:do|have)\s+you\s+(?:know|got)|so\s+far\b|where\s+(?:are|were)\s+we")
});

pub fn is_recap_request(text: &str) -> bool {
    RECAP.is_match(text)
}

// Pure closing pleasantry: at least one core closing word, and nothing
// beyond closing words and filler.
const CLOSING_CORE: [&str; 8] = [
    "thanks", "thank", "thankyou", "cheers", "ta", "bye", "goodbye", "goodnight",
];
const CLOSING_FILLER: [&str; 14] = [
    "ok", "okay", "you", "very", "so", "much", "all", "thats", "that", "is", "great", "lovely",
    "brilliant", "see",
];

pub fn is_pure_closing(text: &str) -> bool {
    let mut saw_core = false;
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
    {
        let token = token.replace('\'', "");
        if CLOSING_CORE.contains(&token.as_str()) {
            saw_core = true;
        } else if !CLOSING_FILLER.contains(&token.as_str()) {
            return false;
        }
    }
    saw_core
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── Condition table ──

    #[test]
    fn condition_first_match_in_definition_order() {
        assert_eq!(
            CONDITIONS.first_match("pounding migraine since lunch"),
            Some(Condition::Headache)
        );
        assert_eq!(
            CONDITIONS.first_match("terrible heartburn after meals"),
            Some(Condition::Indigestion)
        );
        assert_eq!(CONDITIONS.first_match("totally fine"), None);
    }

    #[test]
    fn condition_mentions_collects_all_matches() {
        let mentions = condition_mentions("headache and a sore throat");
        assert_eq!(mentions, vec![Condition::Headache, Condition::SoreThroat]);
    }

    #[test]
    fn stuffy_nose_is_ambiguous_between_hayfever_and_cold() {
        let mentions = condition_mentions("stuffy nose all day");
        assert!(mentions.contains(&Condition::HayFever));
        assert!(mentions.contains(&Condition::CommonCold));
    }

    // ── Who table ──

    #[test]
    fn who_age_phrases_map_to_buckets() {
        assert_eq!(who_mentions("it is for my 12-year-old son"), vec![WhoBucket::Child]);
        assert_eq!(who_mentions("she is 15 years old"), vec![WhoBucket::Teen]);
        assert_eq!(who_mentions("aged 2"), vec![WhoBucket::Toddler]);
    }

    #[test]
    fn who_conflicting_mentions_are_both_reported() {
        let mentions = who_mentions("this is for my 12-year-old who is pregnant");
        assert!(mentions.contains(&WhoBucket::Child));
        assert!(mentions.contains(&WhoBucket::Pregnant));
    }

    #[test]
    fn bare_pronouns_are_not_who_mentions() {
        assert!(who_mentions("it hurts when I swallow").is_empty());
    }

    // ── Duration table ──

    #[test]
    fn duration_phrases_resolve_to_buckets() {
        assert_eq!(match_duration("started today"), Some(DurationBucket::Under24Hours));
        assert_eq!(match_duration("a couple of days"), Some(DurationBucket::Days1To3));
        assert_eq!(match_duration("about a week now"), Some(DurationBucket::Days4To7));
        assert_eq!(match_duration("more than a week"), Some(DurationBucket::Over7Days));
        assert_eq!(match_duration("it comes and goes"), Some(DurationBucket::Recurrent));
    }

    #[test]
    fn duration_chip_texts_resolve_exactly() {
        assert_eq!(match_duration("< 24 hours"), Some(DurationBucket::Under24Hours));
        assert_eq!(match_duration("1–3 days"), Some(DurationBucket::Days1To3));
        assert_eq!(match_duration("4–7 days"), Some(DurationBucket::Days4To7));
        assert_eq!(match_duration("> 7 days"), Some(DurationBucket::Over7Days));
        assert_eq!(match_duration("recurrent"), Some(DurationBucket::Recurrent));
    }

    #[test]
    fn numeric_durations_floor_to_thresholds() {
        assert_eq!(parse_numeric_duration("5 hours"), Some(DurationBucket::Under24Hours));
        assert_eq!(parse_numeric_duration("2.5 days"), Some(DurationBucket::Days1To3));
        assert_eq!(parse_numeric_duration("3.9 days"), Some(DurationBucket::Days1To3));
        assert_eq!(parse_numeric_duration("6 days"), Some(DurationBucket::Days4To7));
        assert_eq!(parse_numeric_duration("9 days"), Some(DurationBucket::Over7Days));
        assert_eq!(parse_numeric_duration("2 weeks"), Some(DurationBucket::Over7Days));
        assert_eq!(parse_numeric_duration("0.5 days"), Some(DurationBucket::Under24Hours));
    }

    #[test]
    fn about_a_week_beats_bare_week_rule() {
        assert_eq!(match_duration("nearly a week"), Some(DurationBucket::Days4To7));
        assert_eq!(match_duration("weeks and weeks"), Some(DurationBucket::Over7Days));
    }

    #[test]
    fn vague_elapsed_time_has_no_bucket_but_is_flagged() {
        assert_eq!(match_duration("this has been going on for a while"), None);
        assert!(mentions_elapsed_time("this has been going on for a while"));
        assert!(mentions_elapsed_time("since Tuesday"));
        assert!(!mentions_elapsed_time("my head hurts"));
    }

    // ── Action / meds vocabulary ──

    #[test]
    fn substances_and_self_care_detected() {
        assert_eq!(substance_mentions("took some Nurofen"), vec!["ibuprofen"]);
        assert_eq!(self_care_mentions("just rest and plenty of water"), vec!["rest", "fluids"]);
    }

    #[test]
    fn denial_phrases_detected() {
        assert!(is_denial("no other medications at all"));
        assert!(is_denial("haven't tried anything"));
        assert!(!is_denial("took paracetamol"));
    }

    // ── Off-topic / closing / recap ──

    #[test]
    fn off_topic_categories_matched() {
        assert_eq!(match_off_topic("tell me a joke"), Some(OffTopic::Smalltalk));
        assert_eq!(match_off_topic("can I get antibiotics"), Some(OffTopic::PrescriptionOnly));
        assert_eq!(match_off_topic("what do I have, doctor?"), Some(OffTopic::DiagnosisRequest));
        assert_eq!(match_off_topic("my head hurts"), None);
    }

    #[test]
    fn pure_closing_requires_core_word_and_no_content() {
        assert!(is_pure_closing("thanks, bye!"));
        assert!(is_pure_closing("ok thank you so much"));
        assert!(!is_pure_closing("thanks, but my head still hurts"));
        assert!(!is_pure_closing("no"));
        assert!(!is_pure_closing(""));
    }

    #[test]
    fn recap_triggers() {
        assert!(is_recap_request("can you recap what you know so far?"));
        assert!(is_recap_request("give me a summary"));
        assert!(!is_recap_request("my stomach hurts"));
    }
}
