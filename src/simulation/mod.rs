//! Provides the types needed to pass per tick simulator state
//! into the spoiler system simulation.
mod update_context;
pub use update_context::UpdateContext;
