//! Routing domain: flags, table, router, tracker, pending queue, barriers

pub mod barrier;
pub mod flags;
pub mod pending;
pub mod router;
pub mod table;
pub mod tracker;
