//! The attendance-reconciliation engine: punches and approved leave in,
//! one derived per-employee per-day view out.

pub mod clock;
pub mod derive;
pub mod expand;
pub mod policy;
pub mod scope;
pub mod undertime;
pub mod views;
