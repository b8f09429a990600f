//! Evaluation harness run against a live BrewBot server.
//!
//! Each golden case gets a deterministic check (refusal phrases or expected
//! keywords) plus model-graded checks from a [`Judge`]. The bot and the judge
//! are both traits so the harness runs offline in tests.
//!
//! [`Judge`]: brewbot_agent::judge::Judge

pub mod checks;
pub mod client;
pub mod dataset;
pub mod harness;
pub mod report;

pub use client::{BotClient, BotError, HttpBotClient};
pub use dataset::{load_dataset, DatasetError, EvalCase};
pub use harness::{CaseResult, CheckResult, EvalHarness};
pub use report::EvalReport;
