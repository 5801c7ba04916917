//! Route handlers organized by resource

pub mod clock;
pub mod health;
pub mod students;
