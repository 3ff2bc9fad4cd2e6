//! The ledger engine.
//!
//! Three concerns live here, layered over the entity crate:
//! - [`schedule`]: turning a bill's cadence into materialized payment
//!   occurrences for a horizon, idempotently.
//! - [`reconcile`]: marking occurrences paid or ignored and keeping each
//!   bill's outstanding debt in line.
//! - [`ledger`]: the per-account transaction store and its running-balance
//!   projection.
//!
//! Every write path that touches more than one row runs inside a database
//! transaction, so concurrent edits on the same account cannot observe a
//! stale tail balance.

pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod schedule;

#[cfg(test)]
pub(crate) mod testing;
