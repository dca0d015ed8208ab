//! Recursive directory traversal (the read workload)
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │    DirectoryQuerier     │
//!                     │  - scans root inline    │
//!                     │  - waits for pending=0  │
//!                     └───────────┬─────────────┘
//!                                 │ one task per subdirectory
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │ read_dir  │             │ read_dir  │             │ read_dir  │
//! │ fan out   │             │ fan out   │             │ fan out   │
//! └───────────┘             └───────────┘             └───────────┘
//! ```
//!
//! Sequential mode skips the pool and recurses on the calling thread.

pub mod pending;
pub mod querier;

pub use pending::{PendingTicket, PendingWork};
pub use querier::{DirectoryQuerier, EntryCounters, EntryCounts, QueryMode};
