//! league-pad - drive a top-down game with a gamepad
//!
//! Raw controller snapshots are diffed into discrete events on a sampling
//! thread; stick events feed a fixed-rate movement arbiter, button and trigger
//! events feed the bindings task, and both talk to an [`actuator::Actuator`].

pub mod actuator;
pub mod bindings;
pub mod config;
pub mod input;
pub mod movement;
pub mod paths;
