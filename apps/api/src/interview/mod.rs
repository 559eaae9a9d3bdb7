//! The interview session core: prompts, turns, timer, analysis and the
//! controller that sequences them.

pub mod analyzer;
pub mod controller;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod registry;
pub mod timer;
pub mod turn;

#[cfg(test)]
pub mod testing;
