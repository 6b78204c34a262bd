pub mod backup;
pub mod cli;
pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod indent;
pub mod locator;
pub mod rewriter;
pub mod scanner;
pub mod splitter;
pub mod unit;

pub use config::{Config, SplitOptions};
pub use error::SplitError;
pub use splitter::{RunReport, split};
