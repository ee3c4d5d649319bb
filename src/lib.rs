//! Detects the questions on a survey form page, stores their answers, and
//! fills them back in by driving the page's own widgets.
//!
//! Everything works against the [`dom::Page`] trait: an in-memory
//! [`dom::Document`] for snapshots and tests, or a
//! [`browser::session::BrowserSession`] for a live tab.

pub mod browser;
pub mod cli;
pub mod detect;
pub mod dom;
pub mod error;
pub mod field;
pub mod fill;
pub mod orchestrator;
pub mod report;
pub mod store;
pub mod trace;
