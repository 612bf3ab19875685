//! Request handlers.

pub mod audio;
pub mod health;
pub mod outputs;
pub mod respond;
pub mod speech;
pub mod voices;

pub use health::{health, ready};
