pub mod analysis;
pub mod checker;
pub mod config;
pub mod ecosystem;
pub mod graph;
pub mod logging;
pub mod output;
pub mod parser;
pub mod rules;
pub mod runtime;
pub mod version;
