//! Narrator backed by a language model.
//!
//! Each call renders a prompt, sends it through a [`CompletionBackend`] and
//! parses the JSON reply. Unparseable replies surface as
//! `NarratorError::Malformed`; retries and fallbacks are the controller's
//! concern.

use async_trait::async_trait;
use mythos_session::application::narrator::{
    InitialScenario, Narrator, NarratorError, TurnRequest, TurnResponse,
};
use tracing::debug;

use crate::backend::CompletionBackend;
use crate::prompts;

/// A narrator that asks `B` for every beat.
#[derive(Debug, Clone)]
pub struct GenerativeNarrator<B> {
    backend: B,
}

impl<B: CompletionBackend> GenerativeNarrator<B> {
    /// Wraps `backend`.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The wrapped backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: CompletionBackend> Narrator for GenerativeNarrator<B> {
    async fn request_initial_scenario(
        &self,
        character_name: &str,
        theme: &str,
    ) -> Result<InitialScenario, NarratorError> {
        let system = prompts::scenario_system_prompt();
        let user = prompts::scenario_user_prompt(character_name, theme);
        let reply = self.backend.complete(&system, &user).await?;
        debug!(bytes = reply.len(), "scenario reply received");
        prompts::parse_reply(&reply)
    }

    async fn request_turn(&self, request: &TurnRequest<'_>) -> Result<TurnResponse, NarratorError> {
        let system = prompts::turn_system_prompt();
        let user = prompts::turn_user_prompt(request);
        let reply = self.backend.complete(&system, &user).await?;
        debug!(bytes = reply.len(), "turn reply received");
        let mut response: TurnResponse = prompts::parse_reply(&reply)?;
        if request.player_input.starts_with(prompts::CHECK_RESULT_MARKER)
            && response.check_request.take().is_some()
        {
            debug!("dropped check request issued in reply to a check result");
        }
        Ok(response)
    }
}
