#![allow(dead_code)]

mod project;
mod registry;

pub use project::*;
pub use registry::*;
