//! Read entities definitions.

pub mod agent;
pub mod property;
