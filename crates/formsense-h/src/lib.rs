//! Chromium over CDP as a script bridge for the form engine.

pub mod backend;
pub mod cdp;
pub mod eval;
