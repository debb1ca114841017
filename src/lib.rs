//! Audio capture probe.
//!
//! Enumerates host input devices, opens a capture stream whose callback
//! queues every delivered block, falls back once to an alternate
//! configuration when the preferred one cannot be opened, and reports
//! delivery totals after a timed run.
//!
//! * [`audio`] — device inventory, host seam (`cpal`), capture session,
//!   bounded block queue.
//! * [`pipeline`] — fallback policy and timed run driver.
//! * [`config`] — TOML settings and platform paths.

pub mod audio;
pub mod config;
pub mod pipeline;
