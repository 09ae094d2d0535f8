//! Terminal multiple-choice quiz runner.
//!
//! The quiz core lives in [`quiz`] (session state machine, selection, timer,
//! scoring) and [`store`] (best-score persistence); everything else is the
//! terminal front end wired up by the `mcquiz` binary.

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod quiz;
pub mod store;
pub mod ui;
