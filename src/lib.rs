//! # Study Harness
//!
//! Submit free-form notes, ask grounded questions against them, and export a
//! week of study sessions as an iCalendar file.
//!
//! ## Architecture
//!
//! ```text
//!  note text ──▶ detect ──▶ chunk ──▶ Repository
//!                                        │
//!  question ──▶ detect ──▶ retrieve ◀────┘ ──▶ answer + citations
//!
//!  goals ──▶ detect ──▶ planner ──▶ ics ──▶ detect + size gate ──▶ .ics
//! ```
//!
//! The pipeline pieces are synchronous and pure; the [`store::Repository`]
//! is the only shared state. The HTTP server and the `study` CLI are thin
//! shells over the same functions.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`ids`] | Injectable id generation |
//! | [`chunk`] | Paragraph + sliding-window chunking |
//! | [`detect`] | Adversarial-pattern detection and outbound gate |
//! | [`store`] | Append-only document repository |
//! | [`ingest`] | Note submission pipeline |
//! | [`retrieve`] | Keyword top-K retrieval |
//! | [`ask`] | Grounded answers with citations |
//! | [`planner`] | Weekly study-session planner |
//! | [`ics`] | iCalendar encoder |
//! | [`server`] | JSON HTTP API |

pub mod ask;
pub mod chunk;
pub mod config;
pub mod detect;
pub mod ics;
pub mod ids;
pub mod ingest;
pub mod models;
pub mod planner;
pub mod retrieve;
pub mod server;
pub mod store;
