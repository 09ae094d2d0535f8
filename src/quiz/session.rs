use std::time::Instant;

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::QuizError;
use crate::quiz::question::{Catalog, Question};
use crate::quiz::result::{ResultSummary, accuracy_percent};
use crate::quiz::select::{pick_questions, shuffled_options};
use crate::quiz::timer::Countdown;

pub const DEFAULT_MAX_QUESTIONS: usize = 100;
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    pub max_questions: usize,
    pub seconds_per_question: u32,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

/// Lifecycle of an attempt. A session only exists once started, so there is
/// no not-started phase; `Closed` follows a successful `finish` or `abandon`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    Finished { timed_out: bool },
    Closed,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Running => "running",
            Phase::Finished { .. } => "finished",
            Phase::Closed => "closed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    pub is_correct: bool,
    pub selected: String,
    pub correct_answer: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to another question.
    Next { skipped: bool },
    /// That was the last question; the session is now finished.
    Finished { skipped: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// No tick applied (none due, or the session is no longer running).
    Idle,
    Tick { remaining: u64 },
    TimedOut,
}

/// One quiz attempt: the drawn questions, position, score, the
/// per-question verification lock and the countdown.
pub struct QuizSession {
    subject: String,
    topic: String,
    questions: Vec<Question>,
    display_options: Vec<String>,
    index: usize,
    score: usize,
    time_remaining: u64,
    selection: Option<String>,
    verification: Option<Verification>,
    phase: Phase,
    timer: Countdown,
    ended_at: Option<Instant>,
    rng: SmallRng,
}

impl QuizSession {
    pub fn start<R: Rng + ?Sized>(
        catalog: &Catalog,
        subject: &str,
        topic: &str,
        settings: QuizSettings,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        Self::start_at(catalog, subject, topic, settings, rng, Instant::now())
    }

    /// Same as [`QuizSession::start`] with an explicit start instant.
    pub fn start_at<R: Rng + ?Sized>(
        catalog: &Catalog,
        subject: &str,
        topic: &str,
        settings: QuizSettings,
        rng: &mut R,
        now: Instant,
    ) -> Result<Self, QuizError> {
        let bank = catalog
            .questions(subject, topic)
            .filter(|bank| !bank.is_empty())
            .ok_or_else(|| QuizError::EmptyBank {
                subject: subject.to_string(),
                topic: topic.to_string(),
            })?;

        let questions = pick_questions(bank, settings.max_questions.max(1), rng);
        let total = questions.len();
        let time_remaining = total as u64 * u64::from(settings.seconds_per_question.max(1));

        let mut session_rng = SmallRng::seed_from_u64(rng.r#gen());
        let display_options = shuffled_options(&questions[0], &mut session_rng);

        info!(
            subject,
            topic,
            total,
            bank_size = bank.len(),
            time_remaining,
            "quiz started"
        );

        Ok(Self {
            subject: subject.to_string(),
            topic: topic.to_string(),
            questions,
            display_options,
            index: 0,
            score: 0,
            time_remaining,
            selection: None,
            verification: None,
            phase: Phase::Running,
            timer: Countdown::start(now),
            ended_at: None,
            rng: session_rng,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_finished(&self) -> bool {
        !self.is_running()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn time_remaining(&self) -> u64 {
        self.time_remaining
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.verification.is_some()
    }

    /// Outcome of the active question once it has been locked in.
    pub fn verification(&self) -> Option<&Verification> {
        self.verification.as_ref()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    /// Share of questions already passed, as `round(index / total * 100)`.
    pub fn progress_percent(&self) -> u8 {
        accuracy_percent(self.index, self.total())
    }

    /// The active question, or `None` once the session has left `Running`.
    pub fn current_question(&self) -> Option<&Question> {
        if !self.is_running() {
            return None;
        }
        self.questions.get(self.index)
    }

    /// Options of the active question in display order, shuffled afresh for
    /// every question.
    pub fn current_options(&self) -> &[String] {
        if self.current_question().is_none() {
            return &[];
        }
        &self.display_options
    }

    /// Choose an option and lock it in immediately. Ignored once the active
    /// question is verified or the session is not running.
    pub fn select_option(&mut self, option: &str) -> Option<Verification> {
        if !self.is_running() || self.is_verified() {
            debug!(option, phase = self.phase.name(), "selection ignored");
            return None;
        }
        self.selection = Some(option.to_string());
        self.verify()
    }

    /// Lock in the current selection and score it. A no-op without a
    /// selection, after verification, or outside `Running`.
    pub fn verify(&mut self) -> Option<Verification> {
        if !self.is_running() || self.is_verified() {
            return None;
        }
        let selected = self.selection.clone()?;
        let question = self.questions.get(self.index)?;

        let is_correct = question.is_correct(&selected);
        if is_correct {
            self.score += 1;
        }
        let verification = Verification {
            is_correct,
            selected,
            correct_answer: question.correct_answer.clone(),
        };
        debug!(
            index = self.index,
            is_correct,
            score = self.score,
            "answer verified"
        );
        self.verification = Some(verification.clone());
        Some(verification)
    }

    /// Move past the active question. An unverified question counts as a
    /// skip: no score, same advance.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        self.advance_at(Instant::now())
    }

    pub fn advance_at(&mut self, now: Instant) -> Result<Advance, QuizError> {
        self.require_running("advance")?;

        let skipped = !self.is_verified();
        if skipped {
            debug!(index = self.index, "question skipped");
        }
        self.index += 1;
        self.selection = None;
        self.verification = None;

        if self.index >= self.total() {
            self.end(now, false);
            return Ok(Advance::Finished { skipped });
        }
        self.display_options = shuffled_options(&self.questions[self.index], &mut self.rng);
        Ok(Advance::Next { skipped })
    }

    /// Apply one elapsed second. Forces the timed-out finish at zero.
    pub fn tick(&mut self) -> TimerEvent {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> TimerEvent {
        if !self.is_running() {
            return TimerEvent::Idle;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            info!(index = self.index, score = self.score, "time ran out");
            self.end(now, true);
            return TimerEvent::TimedOut;
        }
        TimerEvent::Tick {
            remaining: self.time_remaining,
        }
    }

    /// Deliver every tick the countdown owes as of `now`. Returns the last
    /// event applied; `TimedOut` is reported at most once per session.
    pub fn pump_timer(&mut self, now: Instant) -> TimerEvent {
        let due = self.timer.due_ticks(now);
        let mut last = TimerEvent::Idle;
        for _ in 0..due {
            last = self.tick_at(now);
            if last == TimerEvent::TimedOut {
                break;
            }
        }
        last
    }

    /// Produce the summary of a finished attempt and close the session.
    pub fn finish(&mut self) -> Result<ResultSummary, QuizError> {
        let Phase::Finished { timed_out } = self.phase else {
            return Err(self.invalid("finish"));
        };
        self.timer.stop();

        let ended_at = self.ended_at.unwrap_or_else(Instant::now);
        let elapsed_ms = ended_at
            .saturating_duration_since(self.timer.started_at())
            .as_millis() as u64;
        let total = self.total();
        let summary = ResultSummary {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            score: self.score,
            total,
            accuracy_percent: accuracy_percent(self.score, total),
            elapsed_secs: (!timed_out).then(|| (elapsed_ms + 500) / 1000),
            timed_out,
            timestamp: Utc::now(),
        };
        info!(
            subject = %summary.subject,
            topic = %summary.topic,
            score = summary.score,
            total = summary.total,
            accuracy = summary.accuracy_percent,
            timed_out,
            "quiz finished"
        );
        self.phase = Phase::Closed;
        Ok(summary)
    }

    /// Drop the attempt without a summary. Stops the countdown.
    pub fn abandon(&mut self) {
        if self.phase != Phase::Closed {
            debug!(index = self.index, "quiz abandoned");
        }
        self.timer.stop();
        self.phase = Phase::Closed;
    }

    fn end(&mut self, now: Instant, timed_out: bool) {
        self.timer.stop();
        self.ended_at = Some(now);
        self.phase = Phase::Finished { timed_out };
    }

    fn require_running(&self, operation: &'static str) -> Result<(), QuizError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> QuizError {
        QuizError::InvalidState {
            operation,
            phase: self.phase.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn catalog(n: usize) -> Catalog {
        let mut catalog = Catalog::new();
        let questions = (0..n)
            .map(|i| {
                let text = format!("Q{i}");
                let answer = format!("right{i}");
                Question::new(&text, &[&answer, "wrong-a", "wrong-b"], &answer)
            })
            .collect();
        catalog.insert("Math", "Algebra", questions);
        catalog.insert("Math", "Empty", Vec::new());
        catalog
    }

    fn session(n: usize, settings: QuizSettings) -> QuizSession {
        let mut rng = SmallRng::seed_from_u64(11);
        QuizSession::start(&catalog(n), "Math", "Algebra", settings, &mut rng).unwrap()
    }

    fn answer_correctly(s: &mut QuizSession) -> Verification {
        let answer = s.current_question().unwrap().correct_answer.clone();
        s.select_option(&answer).unwrap()
    }

    #[test]
    fn test_start_initial_state() {
        let s = session(3, QuizSettings::default());
        assert_eq!(s.total(), 3);
        assert_eq!(s.index(), 0);
        assert_eq!(s.score(), 0);
        assert_eq!(s.time_remaining(), 180);
        assert!(!s.is_verified());
        assert!(s.is_running());
        assert!(s.timer_running());
        assert_eq!(s.current_options().len(), 3);
    }

    #[test]
    fn test_start_caps_questions() {
        let settings = QuizSettings {
            max_questions: 2,
            seconds_per_question: 30,
        };
        let s = session(5, settings);
        assert_eq!(s.total(), 2);
        assert_eq!(s.time_remaining(), 60);
    }

    #[test]
    fn test_start_clamps_zero_settings() {
        let settings = QuizSettings {
            max_questions: 0,
            seconds_per_question: 0,
        };
        let s = session(5, settings);
        assert_eq!(s.total(), 1);
        assert_eq!(s.time_remaining(), 1);
    }

    #[test]
    fn test_start_empty_or_missing_topic_fails() {
        let mut rng = SmallRng::seed_from_u64(0);
        let c = catalog(3);
        for topic in ["Empty", "Nope"] {
            let err = QuizSession::start(&c, "Math", topic, QuizSettings::default(), &mut rng)
                .err()
                .unwrap();
            assert_eq!(
                err,
                QuizError::EmptyBank {
                    subject: "Math".to_string(),
                    topic: topic.to_string()
                }
            );
        }
    }

    #[test]
    fn test_correct_answer_scores_and_locks() {
        let mut s = session(3, QuizSettings::default());
        let v = answer_correctly(&mut s);
        assert!(v.is_correct);
        assert_eq!(s.score(), 1);
        assert!(s.is_verified());

        // Locked: further selections change nothing.
        assert!(s.select_option("wrong-a").is_none());
        assert!(s.select_option(&v.correct_answer).is_none());
        assert_eq!(s.score(), 1);
        assert_eq!(s.selection(), Some(v.correct_answer.as_str()));
        assert_eq!(s.verification(), Some(&v));
    }

    #[test]
    fn test_wrong_answer_reports_correct_one() {
        let mut s = session(3, QuizSettings::default());
        let expected = s.current_question().unwrap().correct_answer.clone();
        let v = s.select_option("wrong-b").unwrap();
        assert!(!v.is_correct);
        assert_eq!(v.correct_answer, expected);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_verify_without_selection_is_noop() {
        let mut s = session(3, QuizSettings::default());
        assert!(s.verify().is_none());
        assert!(!s.is_verified());
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_skip_advances_without_scoring() {
        let mut s = session(3, QuizSettings::default());
        assert_eq!(s.advance().unwrap(), Advance::Next { skipped: true });
        assert_eq!(s.index(), 1);
        assert_eq!(s.score(), 0);
        assert!(s.selection().is_none());
        assert!(!s.is_verified());
    }

    #[test]
    fn test_advance_resets_selection() {
        let mut s = session(3, QuizSettings::default());
        answer_correctly(&mut s);
        assert_eq!(s.advance().unwrap(), Advance::Next { skipped: false });
        assert!(s.selection().is_none());
        assert!(s.verification().is_none());
        assert!(answer_correctly(&mut s).is_correct);
        assert_eq!(s.score(), 2);
    }

    #[test]
    fn test_natural_finish() {
        let mut s = session(3, QuizSettings::default());
        answer_correctly(&mut s);
        s.advance().unwrap();
        s.select_option("wrong-a").unwrap();
        s.advance().unwrap();
        assert_eq!(s.advance().unwrap(), Advance::Finished { skipped: true });

        assert_eq!(s.phase(), Phase::Finished { timed_out: false });
        assert!(!s.timer_running());
        assert!(s.current_question().is_none());
        assert!(s.current_options().is_empty());

        let summary = s.finish().unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.accuracy_percent, 33);
        assert!(!summary.timed_out);
        assert!(summary.elapsed_secs.is_some());
        assert_eq!(s.phase(), Phase::Closed);
    }

    #[test]
    fn test_operations_after_finish_are_safe() {
        let mut s = session(1, QuizSettings::default());
        s.advance().unwrap();
        assert!(s.select_option("right0").is_none());
        assert!(matches!(
            s.advance(),
            Err(QuizError::InvalidState {
                operation: "advance",
                ..
            })
        ));
        assert_eq!(s.tick(), TimerEvent::Idle);
        assert_eq!(s.index(), 1);

        s.finish().unwrap();
        assert!(s.finish().is_err());
        assert_eq!(s.tick(), TimerEvent::Idle);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_finish_while_running_is_rejected() {
        let mut s = session(2, QuizSettings::default());
        assert_eq!(
            s.finish(),
            Err(QuizError::InvalidState {
                operation: "finish",
                phase: "running"
            })
        );
        assert!(s.is_running());
        assert!(s.timer_running());
    }

    #[test]
    fn test_timeout_after_budget() {
        let mut s = session(2, QuizSettings::default());
        assert_eq!(s.time_remaining(), 120);
        for i in 1..120 {
            assert_eq!(s.tick(), TimerEvent::Tick { remaining: 120 - i });
        }
        assert_eq!(s.tick(), TimerEvent::TimedOut);
        assert_eq!(s.phase(), Phase::Finished { timed_out: true });
        assert!(!s.timer_running());

        // Only one termination event.
        assert_eq!(s.tick(), TimerEvent::Idle);

        let summary = s.finish().unwrap();
        assert!(summary.timed_out);
        assert_eq!(summary.elapsed_secs, None);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.accuracy_percent, 0);
    }

    #[test]
    fn test_timeout_mid_quiz_keeps_score() {
        let settings = QuizSettings {
            max_questions: 100,
            seconds_per_question: 1,
        };
        let mut s = session(3, settings);
        answer_correctly(&mut s);
        s.advance().unwrap();
        s.tick();
        s.tick();
        assert_eq!(s.tick(), TimerEvent::TimedOut);
        assert!(s.select_option("right1").is_none());
        let summary = s.finish().unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.accuracy_percent, 33);
    }

    #[test]
    fn test_pump_timer_delivers_due_ticks() {
        let t0 = Instant::now();
        let mut rng = SmallRng::seed_from_u64(5);
        let settings = QuizSettings {
            max_questions: 1,
            seconds_per_question: 5,
        };
        let mut s =
            QuizSession::start_at(&catalog(2), "Math", "Algebra", settings, &mut rng, t0).unwrap();

        assert_eq!(s.pump_timer(t0 + Duration::from_millis(500)), TimerEvent::Idle);
        assert_eq!(
            s.pump_timer(t0 + Duration::from_millis(2100)),
            TimerEvent::Tick { remaining: 3 }
        );
        assert_eq!(
            s.pump_timer(t0 + Duration::from_secs(30)),
            TimerEvent::TimedOut
        );
        assert_eq!(s.time_remaining(), 0);
        assert_eq!(s.next_deadline(), None);
        assert_eq!(s.pump_timer(t0 + Duration::from_secs(60)), TimerEvent::Idle);
    }

    #[test]
    fn test_tick_after_last_advance_is_noop() {
        let mut s = session(1, QuizSettings::default());
        answer_correctly(&mut s);
        s.advance().unwrap();
        let before = s.time_remaining();
        assert_eq!(s.tick(), TimerEvent::Idle);
        assert_eq!(s.time_remaining(), before);
        assert_eq!(s.phase(), Phase::Finished { timed_out: false });
    }

    #[test]
    fn test_elapsed_is_measured_to_the_finishing_advance() {
        let t0 = Instant::now();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut s = QuizSession::start_at(
            &catalog(1),
            "Math",
            "Algebra",
            QuizSettings::default(),
            &mut rng,
            t0,
        )
        .unwrap();
        s.advance_at(t0 + Duration::from_millis(42_600)).unwrap();
        assert_eq!(s.finish().unwrap().elapsed_secs, Some(43));
    }

    #[test]
    fn test_abandon_stops_timer() {
        let mut s = session(3, QuizSettings::default());
        s.abandon();
        assert!(!s.timer_running());
        assert_eq!(s.phase(), Phase::Closed);
        assert!(s.finish().is_err());
        s.abandon();
        assert_eq!(s.tick(), TimerEvent::Idle);
    }

    #[test]
    fn test_progress_percent() {
        let mut s = session(4, QuizSettings::default());
        assert_eq!(s.progress_percent(), 0);
        s.advance().unwrap();
        assert_eq!(s.progress_percent(), 25);
    }
}
