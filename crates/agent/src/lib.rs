//! Conversation runtime for BrewBot.
//!
//! Every turn goes through the same constrained loop:
//! 1. **Input screening** (`backstop`) - distress and out-of-scope messages get
//!    a canned reply and never reach the model
//! 2. **Model call** (`llm`) - the whole session transcript is replayed
//! 3. **Output screening** (`backstop`) - a reply that should have been a
//!    refusal is replaced with one
//!
//! # Key Types
//!
//! - `AgentRuntime` - turn orchestrator (see `runtime` module)
//! - `SessionStore` - in-memory transcripts keyed by session id
//! - `LlmClient` - pluggable trait for OpenAI/Anthropic/Ollama
//! - `Judge` - model-graded scoring used by the evaluation harness
//!
//! # Safety Principle
//!
//! The backstop is deterministic and runs on both sides of the model. Prompt
//! instructions shape tone; they are never the only thing keeping a reply in
//! scope.

pub mod backstop;
pub mod judge;
pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod session;

pub use runtime::{AgentRuntime, TurnError, TurnOutcome, TurnReply};
