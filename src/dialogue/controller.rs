//! The dialogue state machine.
//!
//! Consumes one utterance at a time, runs the extractor and the safety
//! rules, merges results into the session with contradiction and
//! ambiguity handling, and decides the next prompt. Escalation always
//! pre-empts data collection and is terminal until restart.
//!
//! Collaborators (recommendation engine, external analyzer, persistence
//! sink) are nullable dependencies injected at construction; the
//! controller works fully without them.

use super::extractor::{self, SlotFill};
use super::handoff;
use super::messages;
use super::patterns;
use super::safety;
use super::session::{SessionState, Step};
use super::types::{
    CompletedIntake, ExternalAnalyzer, Recommendation, Recommender, Reply, ReplyKind, SessionSink,
    Slot, TurnOutcome,
};

pub struct DialogueController {
    state: SessionState,
    recommender: Option<Box<dyn Recommender>>,
    analyzer: Option<Box<dyn ExternalAnalyzer>>,
    sink: Option<Box<dyn SessionSink>>,
}

impl DialogueController {
    pub fn new() -> Self {
        Self {
            state: SessionState::new(),
            recommender: None,
            analyzer: None,
            sink: None,
        }
    }

    pub fn with_recommender(mut self, recommender: impl Recommender + 'static) -> Self {
        self.recommender = Some(Box::new(recommender));
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl ExternalAnalyzer + 'static) -> Self {
        self.analyzer = Some(Box::new(analyzer));
        self
    }

    pub fn with_sink(mut self, sink: impl SessionSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Open the conversation: orientation, disclaimer, first question.
    pub fn begin(&mut self) -> Vec<Reply> {
        self.state.begin_collecting();
        self.state.set_pending_slot(Slot::Who);
        vec![
            Reply::new(ReplyKind::Greeting, messages::greeting()),
            Reply::new(ReplyKind::Notice, messages::DISCLAIMER),
            Reply::new(ReplyKind::Question, messages::question(Slot::Who))
                .with_suggestions(messages::suggestions(Slot::Who)),
        ]
    }

    /// Discard the session and start over. The only exit from escalation.
    pub fn restart(&mut self) -> Vec<Reply> {
        self.state.reset();
        if let Some(sink) = &self.sink {
            sink.clear();
        }
        self.begin()
    }

    /// The question the session is currently waiting on, if any.
    /// Always `None` once escalated.
    pub fn next_question(&self) -> Option<Reply> {
        match self.state.step() {
            Step::Escalated => None,
            Step::SafetyCheck => {
                if self.state.pending_slot() == Some(Slot::Duration) {
                    Some(
                        Reply::new(ReplyKind::Question, messages::duration_clarify())
                            .with_suggestions(messages::suggestions(Slot::Duration)),
                    )
                } else {
                    Some(Reply::new(
                        ReplyKind::Question,
                        messages::safety_question(self.state.condition()),
                    ))
                }
            }
            Step::Greeting | Step::Collecting => {
                if let Some(slot) = self.state.pending_slot() {
                    Some(
                        Reply::new(ReplyKind::Question, messages::question(slot))
                            .with_suggestions(messages::suggestions(slot)),
                    )
                } else if let Some(slot) = self.state.next_unset_slot() {
                    Some(
                        Reply::new(ReplyKind::Question, messages::question(slot))
                            .with_suggestions(messages::suggestions(slot)),
                    )
                } else if self.state.last_handoff().is_none() {
                    Some(Reply::new(
                        ReplyKind::Question,
                        messages::safety_question(self.state.condition()),
                    ))
                } else {
                    None
                }
            }
        }
    }

    /// Process one utterance to completion.
    pub fn handle_turn(&mut self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::replies(Vec::new());
        }
        tracing::debug!(
            session_id = %self.state.id,
            step = self.state.step().as_str(),
            "processing turn"
        );
        match self.state.step() {
            Step::Escalated => TurnOutcome::replies(vec![Reply::new(
                ReplyKind::Escalation,
                messages::ESCALATED_REMINDER,
            )]),
            Step::SafetyCheck => self.safety_turn(text),
            Step::Greeting => {
                self.state.begin_collecting();
                self.collecting_turn(text)
            }
            Step::Collecting => self.collecting_turn(text),
        }
    }

    // ── Collecting loop ──

    fn collecting_turn(&mut self, text: &str) -> TurnOutcome {
        self.state.append_log(text);

        // 1. Off-topic: refuse, touch nothing.
        if let Some(kind) = patterns::match_off_topic(text) {
            return TurnOutcome::replies(vec![Reply::new(
                ReplyKind::Refusal,
                messages::refusal(kind),
            )]);
        }

        // 2. Recap request: summarize, re-issue the current prompt.
        if patterns::is_recap_request(text) {
            let mut replies = vec![Reply::new(ReplyKind::Recap, messages::recap(&self.state))];
            if let Some(question) = self.next_question() {
                replies.push(question);
            }
            return TurnOutcome::replies(replies);
        }

        // 3. Pure closing pleasantry.
        if patterns::is_pure_closing(text) {
            return TurnOutcome::replies(vec![Reply::new(
                ReplyKind::Closing,
                messages::closing(&self.state),
            )]);
        }

        // Screening runs before any slot logic: escalation pre-empts
        // collection no matter what else the utterance contains.
        let mut obs = extractor::analyze(text, &self.state);
        if let Some(analyzer) = &self.analyzer {
            extractor::merge_external(&mut obs, analyzer.analyze(text, &self.state));
        }
        if let Some(outcome) = self.screen_for_flags(text, &obs.red_flags) {
            return outcome;
        }

        // Once handed off the record is frozen: statements only raise flags
        // (screened above) or echo back as recap. Nothing is re-collected.
        if self.state.last_handoff().is_some() {
            return TurnOutcome::replies(vec![Reply::new(
                ReplyKind::Recap,
                messages::recap(&self.state),
            )]);
        }

        // 4. Contradiction / ambiguity guard for who and condition.
        let who_mentions = extractor::who_mentions(text);
        if who_mentions.len() > 1 {
            self.state.clear_who();
            self.state.set_pending_slot(Slot::Who);
            return TurnOutcome::replies(vec![Reply::new(
                ReplyKind::Question,
                messages::who_conflict(&who_mentions),
            )
            .with_suggestions(messages::suggestions(Slot::Who))]);
        }
        if let (Some(current), [single]) = (self.state.who(), who_mentions.as_slice()) {
            if *single != current {
                let proposed = *single;
                self.state.clear_who();
                self.state.set_pending_slot(Slot::Who);
                return TurnOutcome::replies(vec![Reply::new(
                    ReplyKind::Question,
                    messages::confirm_who_change(current, proposed),
                )
                .with_suggestions(messages::suggestions(Slot::Who))]);
            }
        }

        let condition_mentions = extractor::condition_mentions(text);
        if condition_mentions.len() > 1 {
            self.state.clear_condition();
            self.state.set_pending_slot(Slot::Condition);
            return TurnOutcome::replies(vec![Reply::new(
                ReplyKind::Question,
                messages::condition_conflict(&condition_mentions),
            )
            .with_suggestions(messages::suggestions(Slot::Condition))]);
        }
        if let (Some(current), [single]) = (self.state.condition(), condition_mentions.as_slice()) {
            if *single != current {
                let proposed = *single;
                self.state.clear_condition();
                self.state.set_pending_slot(Slot::Condition);
                return TurnOutcome::replies(vec![Reply::new(
                    ReplyKind::Question,
                    messages::confirm_condition_change(current, proposed),
                )
                .with_suggestions(messages::suggestions(Slot::Condition))]);
            }
        }

        // 5. Directed slot fill: strict parse for the asked question.
        if let Some(slot) = self.state.pending_slot() {
            if let Some(fill) = extractor::fill_slot(text, slot) {
                self.apply_fill(slot, fill);
                self.state.clear_pending_slot();
                return self.advance(true);
            }
        }

        // 6. General extraction merge. Filled closed-vocabulary slots are
        // skipped; step 4 already owns the contradiction cases.
        let mut found = false;
        if self.state.who().is_none() {
            if let Some(who) = obs.who {
                found |= self.state.set_who(who);
            }
        }
        if self.state.condition().is_none() {
            if let Some(condition) = obs.condition {
                found |= self.state.set_condition(condition);
            }
        }
        if self.state.duration().is_none() {
            if let Some(duration) = obs.duration {
                found |= self.state.set_duration(duration);
            }
        }
        if let Some(action) = &obs.action {
            let before = self.state.action().map(str::to_string);
            self.state.merge_action(action);
            found |= self.state.action() != before.as_deref();
        }
        if let Some(meds) = &obs.meds {
            let before = self.state.meds().map(str::to_string);
            self.state.merge_meds(meds);
            found |= self.state.meds() != before.as_deref();
        }
        // An external analyzer may have answered the pending question.
        if let Some(slot) = self.state.pending_slot() {
            if self.state.is_slot_set(slot) {
                self.state.clear_pending_slot();
            }
        }

        // 7. Duration ambiguity: never guess a bucket from vague wording.
        if obs.ambiguous_duration && obs.duration.is_none() {
            self.state.clear_duration();
            self.state.duration_ambiguous = true;
            self.state.set_pending_slot(Slot::Duration);
            let mut replies = Vec::new();
            if found {
                replies.push(Reply::new(ReplyKind::Acknowledgment, messages::acknowledgment()));
            }
            replies.push(
                Reply::new(ReplyKind::Question, messages::duration_clarify())
                    .with_suggestions(messages::suggestions(Slot::Duration)),
            );
            return TurnOutcome::replies(replies);
        }

        // 8. Advance.
        self.advance(found)
    }

    fn apply_fill(&mut self, slot: Slot, fill: SlotFill) {
        match fill {
            SlotFill::Who(who) => {
                self.state.set_who(who);
            }
            SlotFill::Condition(condition) => {
                self.state.set_condition(condition);
            }
            SlotFill::Duration(duration) => {
                self.state.set_duration(duration);
            }
            SlotFill::Text(value) => match slot {
                Slot::Action => {
                    self.state.merge_action(&value);
                }
                Slot::Meds => {
                    self.state.merge_meds(&value);
                }
                _ => {}
            },
        }
    }

    /// Raise any new flags from this turn; escalate if any were new.
    fn screen_for_flags(&mut self, text: &str, observed: &[String]) -> Option<TurnOutcome> {
        let mut newly = Vec::new();
        for description in observed {
            if self.state.add_flag(description) {
                newly.push(description.clone());
            }
        }
        newly.extend(safety::evaluate(text, &mut self.state));
        if newly.is_empty() {
            return None;
        }
        tracing::warn!(
            session_id = %self.state.id,
            flags = ?newly,
            "session escalated"
        );
        self.state.escalate();
        Some(TurnOutcome {
            replies: vec![Reply::new(ReplyKind::Escalation, messages::ESCALATION)],
            newly_escalated: true,
            completed: None,
            recommendation: None,
        })
    }

    /// Acknowledge, then ask the next question or move to safety check.
    fn advance(&mut self, acknowledge: bool) -> TurnOutcome {
        let mut replies = Vec::new();
        if acknowledge {
            replies.push(Reply::new(ReplyKind::Acknowledgment, messages::acknowledgment()));
        }

        if self.state.all_slots_set() {
            self.state.enter_safety_check();
            replies.push(Reply::new(
                ReplyKind::Question,
                messages::safety_question(self.state.condition()),
            ));
            return TurnOutcome::replies(replies);
        }

        if let Some(slot) = self.state.pending_slot() {
            // The asked slot still could not be read: stricter re-ask.
            replies.push(
                Reply::new(ReplyKind::Question, messages::strict_question(slot))
                    .with_suggestions(messages::suggestions(slot)),
            );
            return TurnOutcome::replies(replies);
        }

        if let Some(slot) = self.state.next_unset_slot() {
            self.state.set_pending_slot(slot);
            replies.push(
                Reply::new(ReplyKind::Question, messages::question(slot))
                    .with_suggestions(messages::suggestions(slot)),
            );
        }
        TurnOutcome::replies(replies)
    }

    // ── Safety check ──

    fn safety_turn(&mut self, text: &str) -> TurnOutcome {
        self.state.append_log(text);

        let mut obs = extractor::analyze(text, &self.state);
        if let Some(analyzer) = &self.analyzer {
            extractor::merge_external(&mut obs, analyzer.analyze(text, &self.state));
        }
        if let Some(outcome) = self.screen_for_flags(text, &obs.red_flags) {
            return outcome;
        }

        // Late-arriving values merge opportunistically; nothing is re-asked.
        if self.state.who().is_none() {
            if let Some(who) = obs.who {
                self.state.set_who(who);
            }
        }
        if self.state.condition().is_none() {
            if let Some(condition) = obs.condition {
                self.state.set_condition(condition);
            }
        }
        if self.state.duration().is_none() {
            if let Some(duration) = obs.duration {
                self.state.set_duration(duration);
            }
        }
        if let Some(action) = &obs.action {
            self.state.merge_action(action);
        }
        if let Some(meds) = &obs.meds {
            self.state.merge_meds(meds);
        }

        if self.state.duration().is_none() {
            self.state.set_pending_slot(Slot::Duration);
            return TurnOutcome::replies(vec![Reply::new(
                ReplyKind::Question,
                messages::duration_clarify(),
            )
            .with_suggestions(messages::suggestions(Slot::Duration))]);
        }

        self.state.clear_pending_slot();
        self.complete_handoff()
    }

    /// Freeze the record, consult the recommendation engine, notify the
    /// sink, and reopen free-form conversation.
    fn complete_handoff(&mut self) -> TurnOutcome {
        let record = match handoff::build(&self.state) {
            Ok(record) => record,
            Err(err) => {
                // Unreachable in practice: safety_turn demands the slots first.
                tracing::warn!(error = %err, "handoff build refused");
                self.state.return_to_collecting();
                return self.advance(false);
            }
        };
        self.state.record_handoff(record.clone());

        let mut replies = Vec::new();
        let mut recommendation: Option<Recommendation> = None;
        if let Some(engine) = &self.recommender {
            match engine.evaluate(&record) {
                Ok(result) => {
                    self.state
                        .merge_cautions(result.cautions.iter().map(String::as_str));
                    for flag in &result.flags {
                        self.state.add_flag(flag);
                    }
                    recommendation = Some(result);
                }
                Err(err) => {
                    tracing::warn!(
                        session_id = %self.state.id,
                        error = %err,
                        "recommendation engine failed"
                    );
                    self.state.merge_cautions([
                        "Automated guidance was unavailable for this check; confirm any medicine choice with a pharmacist.",
                    ]);
                    replies.push(Reply::new(ReplyKind::Notice, messages::RECOMMENDER_FAILURE));
                }
            }
        }

        let completed = CompletedIntake {
            record,
            flags: self.state.flags().to_vec(),
            cautions: self.state.cautions().to_vec(),
        };
        if let Some(sink) = &self.sink {
            sink.save(&completed);
        }

        replies.push(Reply::new(
            ReplyKind::Handoff,
            messages::handoff_summary(&self.state, recommendation.as_ref()),
        ));
        self.state.return_to_collecting();

        tracing::info!(
            session_id = %self.state.id,
            condition = completed.record.condition.as_str(),
            flags = completed.flags.len(),
            "intake completed"
        );
        TurnOutcome {
            replies,
            newly_escalated: false,
            completed: Some(completed),
            recommendation,
        }
    }
}

impl Default for DialogueController {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
