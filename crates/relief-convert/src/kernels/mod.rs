//! Blur kernel implementations

pub mod gaussian;
pub mod identity;

pub use gaussian::GaussianKernel;
pub use identity::{IdentityKernel, UnavailableKernel};
