pub mod catalog;
pub mod config;
pub mod errors;
pub mod extract;
pub mod lifecycle;
pub mod llm;
pub mod logging;
pub mod materialize;
pub mod preview;
pub mod prompts;
pub mod runtime;
pub mod session;
pub mod turn;
pub mod ui;
