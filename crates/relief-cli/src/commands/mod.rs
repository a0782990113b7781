//! CLI command implementations

pub mod expand;
pub mod export;
pub mod import;
pub mod inspect;
