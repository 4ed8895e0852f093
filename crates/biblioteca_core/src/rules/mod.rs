//! Business rules that must hold regardless of caller.

pub mod availability;
