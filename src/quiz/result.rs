use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final tally of one quiz attempt. Produced once by `QuizSession::finish`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub subject: String,
    pub topic: String,
    pub score: usize,
    pub total: usize,
    pub accuracy_percent: u8,
    /// Whole seconds from start to the finishing transition; `None` when the
    /// countdown ran out.
    pub elapsed_secs: Option<u64>,
    pub timed_out: bool,
    pub timestamp: DateTime<Utc>,
}

/// `round(100 * score / total)` with halves rounded up, 0 for an empty quiz.
pub fn accuracy_percent(score: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = score.min(total);
    ((score * 200 + total) / (total * 2)) as u8
}

/// `MM:SS`, as shown for the countdown and the time taken.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
