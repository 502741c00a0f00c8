// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Grouplog - an append-only log of timestamped entries, grouped by time
//! and foldable, with O(log n) lookup of the row at any visible index.
//!
//! A virtualised list only ever asks for the total row count and for the
//! rows in its viewport. `GroupedLog` answers both without building the
//! full list of rows.
//!
//! # Quick Start
//!
//! ```
//! use grouplog::config::Config;
//! use grouplog::log::{Entry, GroupedLog, Row};
//!
//! let mut log = GroupedLog::new(Config::new(2.0).unwrap());
//! log.append(vec![
//!     Entry::new("boot", 3.0),
//!     Entry::new("ready", 4.0),
//!     Entry::new("request", 20.0),
//! ]).unwrap();
//!
//! // Two folded groups: one row each.
//! assert_eq!(log.visible_count(), 2);
//!
//! log.expand(0).unwrap();
//! let rows = log.resolve_visible_range(0..4).unwrap();
//! assert!(matches!(rows[0], Row::Group(g) if g.name == "3"));
//! assert!(matches!(rows[2], Row::Entry(e) if e.content == "ready"));
//! assert!(matches!(rows[3], Row::Group(g) if g.name == "20"));
//! ```

pub mod config;
pub mod error;
pub mod index_tree;
pub mod log;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use index_tree::WeightedIndexTree;
pub use log::Entry;
pub use log::Group;
pub use log::GroupedLog;
pub use log::Position;
pub use log::Row;
pub use log::VisibleRows;
