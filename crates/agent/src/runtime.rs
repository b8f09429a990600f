use std::sync::Arc;
use std::time::Duration;

use brewbot_core::{ApplicationError, DomainError, Message, SessionId};
use thiserror::Error;
use tracing::{info, warn};

use crate::backstop::{BackstopEngine, BackstopHit};
use crate::llm::{CompletionOptions, LlmClient, LlmError};
use crate::session::SessionStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error(transparent)]
    Transcript(#[from] DomainError),
}

impl From<TurnError> for ApplicationError {
    fn from(value: TurnError) -> Self {
        match value {
            TurnError::Model(error) if error.is_timeout() => {
                ApplicationError::ModelTimeout(error.to_string())
            }
            TurnError::Model(error) => ApplicationError::ModelFailure(error.to_string()),
            TurnError::Transcript(error) => ApplicationError::Domain(error),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered and output screening let the reply through.
    Answered,
    /// Input screening replied without calling the model.
    ShortCircuited { rule: &'static str },
    /// The model answered but output screening replaced the reply.
    Corrected { rule: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReply {
    pub reply: String,
    pub session_id: SessionId,
    pub outcome: TurnOutcome,
}

pub struct AgentRuntime {
    backstop: Arc<BackstopEngine>,
    sessions: SessionStore,
    llm: Arc<dyn LlmClient>,
    options: CompletionOptions,
    model_timeout: Duration,
}

impl AgentRuntime {
    pub fn new(
        backstop: Arc<BackstopEngine>,
        sessions: SessionStore,
        llm: Arc<dyn LlmClient>,
        options: CompletionOptions,
        model_timeout: Duration,
    ) -> Self {
        Self { backstop, sessions, llm, options, model_timeout }
    }

    /// Runs one conversation turn.
    ///
    /// A blank or missing session id mints a new one. Turns on the same
    /// session are serialized by the transcript lock. On model failure the
    /// user message stays in the transcript and no assistant message is added.
    /// A clear that lands mid-turn detaches the transcript this turn writes
    /// to; the next turn with the same id starts from the system prompt.
    pub async fn handle_turn(
        &self,
        session_id: Option<SessionId>,
        message: &str,
    ) -> Result<TurnReply, TurnError> {
        let session_id = session_id
            .filter(|id| !id.as_str().trim().is_empty())
            .unwrap_or_else(SessionId::mint);

        let (handle, created) = self.sessions.get_or_create(&session_id);
        if created {
            info!(
                event_name = "chat.session.created",
                session_id = %session_id,
                "session transcript created"
            );
        }

        let mut transcript = handle.lock().await;
        info!(
            event_name = "chat.turn.started",
            session_id = %session_id,
            transcript_len = transcript.len(),
            "conversation turn started"
        );

        if let Some(hit) = self.backstop.check_input(message) {
            transcript.append(Message::user(message))?;
            transcript.append(Message::assistant(hit.response))?;
            log_backstop_hit("chat.turn.short_circuited", &session_id, &hit);
            return Ok(TurnReply {
                reply: hit.response.to_string(),
                session_id,
                outcome: TurnOutcome::ShortCircuited { rule: hit.rule },
            });
        }

        transcript.append(Message::user(message))?;

        let completion = tokio::time::timeout(
            self.model_timeout,
            self.llm.complete(transcript.messages(), &self.options),
        )
        .await
        .unwrap_or(Err(LlmError::Timeout(self.model_timeout)));

        let model_reply = match completion {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    event_name = "chat.turn.failed",
                    session_id = %session_id,
                    error = %error,
                    "model call failed; assistant reply not recorded"
                );
                return Err(TurnError::Model(error));
            }
        };

        let (reply, outcome) = match self.backstop.check_output(&model_reply, message) {
            Some(hit) => {
                log_backstop_hit("chat.turn.output_corrected", &session_id, &hit);
                (hit.response.to_string(), TurnOutcome::Corrected { rule: hit.rule })
            }
            None => (model_reply, TurnOutcome::Answered),
        };

        transcript.append(Message::assistant(reply.as_str()))?;
        info!(
            event_name = "chat.turn.completed",
            session_id = %session_id,
            transcript_len = transcript.len(),
            "conversation turn completed"
        );

        Ok(TurnReply { reply, session_id, outcome })
    }

    /// Forgets a session. Unknown ids are not an error.
    pub fn clear_session(&self, session_id: &SessionId) {
        let existed = self.sessions.clear(session_id);
        info!(
            event_name = "chat.session.cleared",
            session_id = %session_id,
            existed,
            "session cleared"
        );
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn backstop(&self) -> &BackstopEngine {
        &self.backstop
    }
}

fn log_backstop_hit(event_name: &'static str, session_id: &SessionId, hit: &BackstopHit) {
    info!(
        event_name,
        session_id = %session_id,
        phase = hit.phase.as_str(),
        rule = hit.rule,
        "backstop replaced reply"
    );
}
