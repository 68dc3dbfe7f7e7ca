//! # Almanac Core Library
//!
//! Recurring-event materialization and day layout for the Almanac content
//! calendar.
//!
//! ## Features
//!
//! - **Dual Recurrence Encodings**: RFC 5545 RRULE strings and the legacy
//!   daily/weekly/monthly/yearly encoding with weekday subsets
//! - **Exclusions and Completions**: Per-date suppression and done-state,
//!   keyed by date only
//! - **Date-Only Arithmetic**: No ambient clock or time zone; every call is a
//!   pure function of its inputs
//! - **Column Packing**: Greedy minimum-column layout of overlapping events
//!
//! ## Core Modules
//!
//! - [`models`]: Event definitions, records, occurrences and windows
//! - [`recurrence`]: Occurrence expansion engine
//! - [`layout`]: Interval packing and per-day layout
//! - [`diagnostics`]: Sinks for problems recovered during expansion
//! - [`config`]: Expansion configuration
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use almanac_core::{
//!     config::ExpansionConfig,
//!     layout::layout_day,
//!     models::{DateWindow, EventRecord, RecordFrequency},
//!     recurrence::RecurrenceExpander,
//! };
//! use chrono::NaiveDate;
//!
//! let config = ExpansionConfig::default();
//! let definition = EventRecord {
//!     id: "standup".to_string(),
//!     anchor_date: "2024-01-01".to_string(),
//!     time: Some("09:00".to_string()),
//!     recurrence: RecordFrequency::Daily,
//!     ..Default::default()
//! }
//! .into_definition(&config)?;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
//! let window = DateWindow::new(start, end)?;
//!
//! let occurrences = RecurrenceExpander::with_defaults().expand(&[definition], window);
//! assert_eq!(occurrences.len(), 7);
//!
//! let monday = layout_day(start, &occurrences);
//! assert_eq!(monday.column_count, 1);
//! # Ok::<(), almanac_core::error::CoreError>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod models;
pub mod recurrence;

pub use layout::{layout_day, layout_window, pack, pack_intervals};
pub use recurrence::{expand, group_by_day, RecurrenceExpander};
