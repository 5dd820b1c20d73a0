//! REST handlers

pub mod health;
pub mod interviews;
