//! Controller input

pub mod gamepad;
