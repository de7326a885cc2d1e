// src/control/mod.rs

//! State shared across the worker boundary.
//!
//! Only two pieces of state cross from the running worker to its caller:
//! - [`StopFlag`]: the cooperative cancellation signal;
//! - [`SharedStatus`]: the single-writer lifecycle status cell.
//!
//! Both are plain atomics behind an `Arc`, so reads are never torn and no
//! lock is held across a routine's blocking calls.

pub mod status;
pub mod stop;

pub use status::{InvalidTransition, SharedStatus};
pub use stop::StopFlag;
