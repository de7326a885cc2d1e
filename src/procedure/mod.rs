// src/procedure/mod.rs

//! The procedure contract.
//!
//! A procedure is the user-supplied measurement routine. The worker drives
//! its hooks in a fixed order (`startup`, `execute`, `shutdown`) on a
//! blocking thread, after `check_parameters` passed at construction time.
//!
//! Transport details stay out of the procedure: everything it needs is on
//! the [`Context`] the worker injects into each hook.
//!
//! - [`context`] holds the injected [`Context`].
//! - [`registry`] maps stable identifiers to procedure factories.

pub mod context;
pub mod registry;

pub use context::Context;
pub use registry::{ProcedureFactory, ProcedureRegistry};

/// A long-running routine supervised by a [`crate::Worker`].
///
/// Hooks run on a blocking thread, so they may block on instrument I/O.
/// Cancellation is cooperative: long loops should poll
/// [`Context::should_stop`] (or `?` on [`Context::check_stop`]).
pub trait Procedure: Send {
    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Validate parameters. Called once, before anything is started.
    fn check_parameters(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn startup(&mut self, _ctx: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    /// Main body of the run.
    fn execute(&mut self, ctx: &Context) -> anyhow::Result<()>;

    /// Teardown; always called once execution was attempted.
    fn shutdown(&mut self, _ctx: &Context) -> anyhow::Result<()> {
        Ok(())
    }
}
