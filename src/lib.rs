//! Hypothetical Render Model (HRM) validator for timed-text caption streams.
//!
//! A caption stream is sampled into a sequence of visual snapshots. Each
//! snapshot is costed against a reference decoder: how long it takes to clear
//! the frame, paint backgrounds and draw or copy glyphs. The validator then
//! checks that every snapshot fits the time and glyph-buffer budgets.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod number;
pub mod report;
pub mod sequence;
pub mod time;
pub mod types;
pub mod validator;
