use std::time::Instant;

use rand::rngs::SmallRng;
use tracing::warn;

use crate::config::Config;
use crate::error::QuizError;
use crate::quiz::question::Catalog;
use crate::quiz::result::ResultSummary;
use crate::quiz::session::{Advance, QuizSession, TimerEvent, Verification};
use crate::store::score_store::{KeyValueStore, ScoreStore};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    SubjectSelect,
    TopicSelect,
    Quiz,
    Results,
}

/// Message shown under the options of the active question, or on the
/// results screen when time ran out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { correct_answer: String },
    Skipped,
    TimeUp,
}

impl Feedback {
    pub fn message(&self) -> String {
        match self {
            Feedback::Correct => "Correct!".to_string(),
            Feedback::Incorrect { correct_answer } => {
                format!("Incorrect. Correct answer: {correct_answer}")
            }
            Feedback::Skipped => "Question skipped.".to_string(),
            Feedback::TimeUp => "Time's up!".to_string(),
        }
    }

    fn from_verification(v: &Verification) -> Self {
        if v.is_correct {
            Feedback::Correct
        } else {
            Feedback::Incorrect {
                correct_answer: v.correct_answer.clone(),
            }
        }
    }
}

pub struct App {
    pub screen: AppScreen,
    pub catalog: Catalog,
    pub config: Config,
    pub theme: &'static Theme,
    pub scores: ScoreStore<Box<dyn KeyValueStore>>,
    pub subject_selected: usize,
    pub topic_selected: usize,
    pub subject: Option<String>,
    pub session: Option<QuizSession>,
    pub option_selected: usize,
    pub feedback: Option<Feedback>,
    pub notice: Option<String>,
    pub last_result: Option<ResultSummary>,
    pub last_best: Option<u8>,
    pub should_quit: bool,
    rng: SmallRng,
}

impl App {
    pub fn new(
        catalog: Catalog,
        config: Config,
        theme: &'static Theme,
        scores: ScoreStore<Box<dyn KeyValueStore>>,
        rng: SmallRng,
    ) -> Self {
        Self {
            screen: AppScreen::SubjectSelect,
            catalog,
            config,
            theme,
            scores,
            subject_selected: 0,
            topic_selected: 0,
            subject: None,
            session: None,
            option_selected: 0,
            feedback: None,
            notice: None,
            last_result: None,
            last_best: None,
            should_quit: false,
            rng,
        }
    }

    pub fn subjects(&self) -> Vec<&str> {
        self.catalog.subjects()
    }

    pub fn topics(&self) -> Vec<&str> {
        match &self.subject {
            Some(subject) => self.catalog.topics(subject),
            None => Vec::new(),
        }
    }

    /// Topic under the cursor on the topic screen.
    pub fn highlighted_topic(&self) -> Option<String> {
        self.topics()
            .get(self.topic_selected)
            .map(|t| t.to_string())
    }

    pub fn best_score(&self, topic: &str) -> Option<u8> {
        let subject = self.subject.as_deref()?;
        self.scores.get(subject, topic)
    }

    pub fn cursor_up(&mut self) {
        self.move_cursor(-1);
    }

    pub fn cursor_down(&mut self) {
        self.move_cursor(1);
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = match self.screen {
            AppScreen::SubjectSelect => self.subjects().len(),
            AppScreen::TopicSelect => self.topics().len(),
            AppScreen::Quiz => self
                .session
                .as_ref()
                .map_or(0, |s| s.current_options().len()),
            AppScreen::Results => return,
        };
        if len == 0 {
            return;
        }
        let cursor = match self.screen {
            AppScreen::SubjectSelect => &mut self.subject_selected,
            AppScreen::TopicSelect => &mut self.topic_selected,
            _ => &mut self.option_selected,
        };
        *cursor = (*cursor as isize + delta).rem_euclid(len as isize) as usize;
    }

    pub fn select_subject(&mut self) {
        let Some(subject) = self.subjects().get(self.subject_selected).map(|s| s.to_string())
        else {
            return;
        };
        self.subject = Some(subject);
        self.topic_selected = 0;
        self.notice = None;
        self.screen = AppScreen::TopicSelect;
    }

    pub fn back_to_subjects(&mut self) {
        self.subject = None;
        self.topic_selected = 0;
        self.screen = AppScreen::SubjectSelect;
    }

    /// Start a fresh attempt on the highlighted topic.
    pub fn start_quiz(&mut self) {
        let (Some(subject), Some(topic)) = (self.subject.clone(), self.highlighted_topic()) else {
            return;
        };
        self.start_session(&subject, &topic);
    }

    fn start_session(&mut self, subject: &str, topic: &str) {
        if let Some(mut old) = self.session.take() {
            old.abandon();
        }
        let settings = self.config.quiz_settings();
        match QuizSession::start(&self.catalog, subject, topic, settings, &mut self.rng) {
            Ok(session) => {
                self.session = Some(session);
                self.option_selected = 0;
                self.feedback = None;
                self.notice = None;
                self.screen = AppScreen::Quiz;
            }
            Err(err @ QuizError::EmptyBank { .. }) => {
                warn!(error = %err, "cannot start quiz");
                self.back_to_subjects();
                self.notice = Some("No questions found for this topic.".to_string());
            }
            Err(err) => warn!(error = %err, "cannot start quiz"),
        }
    }

    /// Pick the option at `index` in display order; it is verified at once.
    pub fn choose_option(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(option) = session.current_options().get(index).cloned() else {
            return;
        };
        if let Some(verification) = session.select_option(&option) {
            self.option_selected = index;
            self.feedback = Some(Feedback::from_verification(&verification));
        }
    }

    pub fn choose_highlighted(&mut self) {
        self.choose_option(self.option_selected);
    }

    pub fn question_verified(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_verified())
    }

    /// Move to the next question; unanswered questions count as skipped.
    pub fn next_question(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.advance() {
            Ok(Advance::Next { skipped }) => {
                self.option_selected = 0;
                self.feedback = skipped.then_some(Feedback::Skipped);
            }
            Ok(Advance::Finished { .. }) => self.end_quiz(),
            Err(err) => warn!(error = %err, "advance rejected"),
        }
    }

    /// Deliver due countdown ticks; ends the quiz when time runs out.
    pub fn on_tick(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.pump_timer(now) == TimerEvent::TimedOut {
            self.end_quiz();
            self.feedback = Some(Feedback::TimeUp);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and_then(QuizSession::next_deadline)
    }

    fn end_quiz(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match session.finish() {
            Ok(summary) => {
                self.feedback = None;
                self.scores
                    .put(&summary.subject, &summary.topic, summary.accuracy_percent);
                self.last_best = self.scores.get(&summary.subject, &summary.topic);
                self.last_result = Some(summary);
                self.screen = AppScreen::Results;
            }
            Err(err) => {
                warn!(error = %err, "finish rejected");
                session.abandon();
                self.back_to_subjects();
            }
        }
    }

    /// Leave the running quiz without recording anything.
    pub fn exit_quiz(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.abandon();
        }
        self.feedback = None;
        self.new_quiz();
    }

    /// Same subject and topic, new shuffle, new timer.
    pub fn restart_quiz(&mut self) {
        let Some(result) = self.last_result.clone() else {
            return;
        };
        self.subject = Some(result.subject.clone());
        self.start_session(&result.subject, &result.topic);
    }

    pub fn new_quiz(&mut self) {
        self.subject_selected = 0;
        self.back_to_subjects();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;

    use super::*;
    use crate::quiz::question::Question;
    use crate::store::score_store::MemoryStore;

    fn test_app() -> App {
        let mut catalog = Catalog::new();
        catalog.insert(
            "Math",
            "Algebra",
            vec![
                Question::new("1+1?", &["2", "3"], "2"),
                Question::new("2+2?", &["4", "5"], "4"),
            ],
        );
        catalog.insert("Math", "Empty", Vec::new());
        catalog.insert("Science", "Physics", vec![Question::new("g?", &["9.8", "1"], "9.8")]);
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        let backend: Box<dyn KeyValueStore> = Box::new(MemoryStore::default());
        App::new(
            catalog,
            Config::default(),
            theme,
            ScoreStore::new(backend),
            SmallRng::seed_from_u64(9),
        )
    }

    fn index_of(app: &App, text: &str) -> usize {
        let session = app.session.as_ref().unwrap();
        session
            .current_options()
            .iter()
            .position(|o| o == text)
            .unwrap()
    }

    fn answer(app: &mut App, correct: bool) {
        let q = app.session.as_ref().unwrap().current_question().unwrap().clone();
        let choice = q
            .options
            .iter()
            .find(|o| (o.as_str() == q.correct_answer) == correct)
            .unwrap()
            .clone();
        let idx = index_of(app, &choice);
        app.choose_option(idx);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = test_app();
        app.cursor_up();
        assert_eq!(app.subject_selected, 1);
        app.cursor_down();
        assert_eq!(app.subject_selected, 0);
        app.select_subject();
        assert_eq!(app.screen, AppScreen::TopicSelect);
        assert_eq!(app.topics(), vec!["Algebra", "Empty"]);
        app.back_to_subjects();
        assert_eq!(app.screen, AppScreen::SubjectSelect);
    }

    #[test]
    fn test_full_quiz_records_best() {
        let mut app = test_app();
        app.select_subject();
        app.start_quiz();
        assert_eq!(app.screen, AppScreen::Quiz);

        answer(&mut app, true);
        assert_eq!(app.feedback, Some(Feedback::Correct));
        app.next_question();
        answer(&mut app, false);
        assert!(matches!(app.feedback, Some(Feedback::Incorrect { .. })));
        app.next_question();

        assert_eq!(app.screen, AppScreen::Results);
        assert!(app.session.is_none());
        let result = app.last_result.clone().unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.accuracy_percent, 50);
        assert_eq!(app.last_best, Some(50));
        assert_eq!(app.best_score("Algebra"), Some(50));
        assert_eq!(app.feedback, None);
    }

    #[test]
    fn test_skip_feedback() {
        let mut app = test_app();
        app.select_subject();
        app.start_quiz();
        app.next_question();
        assert_eq!(app.feedback, Some(Feedback::Skipped));
        assert_eq!(app.feedback.as_ref().unwrap().message(), "Question skipped.");
    }

    #[test]
    fn test_second_choice_is_ignored() {
        let mut app = test_app();
        app.select_subject();
        app.start_quiz();
        answer(&mut app, false);
        let first = app.feedback.clone();
        answer(&mut app, true);
        assert_eq!(app.feedback, first);
        assert_eq!(app.session.as_ref().unwrap().score(), 0);
    }

    #[test]
    fn test_empty_topic_returns_to_subjects() {
        let mut app = test_app();
        app.select_subject();
        app.cursor_down();
        app.start_quiz();
        assert_eq!(app.screen, AppScreen::SubjectSelect);
        assert!(app.session.is_none());
        assert_eq!(
            app.notice.as_deref(),
            Some("No questions found for this topic.")
        );
    }

    #[test]
    fn test_timeout_moves_to_results() {
        let mut app = test_app();
        app.select_subject();
        app.start_quiz();
        let far_future = Instant::now() + Duration::from_secs(3600);
        app.on_tick(far_future);
        assert_eq!(app.screen, AppScreen::Results);
        assert_eq!(app.feedback, Some(Feedback::TimeUp));
        let result = app.last_result.as_ref().unwrap();
        assert!(result.timed_out);
        assert_eq!(app.last_best, Some(0));
    }

    #[test]
    fn test_exit_quiz_persists_nothing() {
        let mut app = test_app();
        app.select_subject();
        app.start_quiz();
        answer(&mut app, true);
        app.exit_quiz();
        assert_eq!(app.screen, AppScreen::SubjectSelect);
        assert!(app.session.is_none());
        assert_eq!(app.scores.get("Math", "Algebra"), None);
    }

    #[test]
    fn test_restart_uses_same_topic() {
        let mut app = test_app();
        app.select_subject();
        app.start_quiz();
        app.next_question();
        app.next_question();
        assert_eq!(app.screen, AppScreen::Results);
        app.restart_quiz();
        assert_eq!(app.screen, AppScreen::Quiz);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.topic(), "Algebra");
        assert_eq!(session.index(), 0);
        assert_eq!(session.score(), 0);
    }
}
