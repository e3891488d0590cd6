//! Command implementations

pub mod machine;
pub mod operation;
pub mod profile;
pub mod wait;
