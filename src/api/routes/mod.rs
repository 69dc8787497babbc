//! API Routes
//!
//! Route handlers organized by functionality.

pub mod food;
pub mod health;
pub mod log;
