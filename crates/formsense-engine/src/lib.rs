pub mod backend;
pub mod classify;
pub mod cli;
pub mod command;
pub mod config;
pub mod dom;
pub mod executor;
pub mod fields;
pub mod interaction;
pub mod label;
pub mod page;
pub mod report;
pub mod resolution;
pub mod visibility;

pub use formsense_common::error;
pub use formsense_common::protocol;
pub use formsense_common::result;
