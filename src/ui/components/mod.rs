pub mod progress_bar;
pub mod question_card;
pub mod results;
pub mod select_list;
