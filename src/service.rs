//! The service façade: boundary validation and orchestration over the
//! engine. Everything here normalizes its input (lookup codes, legacy
//! flags) before any write, then delegates to [`compute`].

pub mod accounts;
pub mod bills;
