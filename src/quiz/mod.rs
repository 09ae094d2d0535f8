pub mod question;
pub mod result;
pub mod select;
pub mod session;
pub mod timer;

pub use question::{Catalog, Question};
pub use result::ResultSummary;
pub use session::{Advance, Phase, QuizSession, QuizSettings, TimerEvent, Verification};
