//! Router Module Index
//!
//! Splits the console's HTTP surface by access policy. Guarded routes only ever
//! run behind the navigation guard middleware applied in `create_router`.

/// Routes accessible to anyone: health, route table, navigation decisions.
pub mod public;

/// One route per console view, each gated by the navigation guard.
pub mod guarded;
