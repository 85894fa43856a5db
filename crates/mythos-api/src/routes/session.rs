//! Routes for play sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use mythos_core::error::DomainError;
use mythos_rules::domain::character::{Abilities, allocate_skills};
use mythos_session::application::controller::{
    ControllerPhase, RollOutcome, TurnController, TurnOutcome,
};
use mythos_session::domain::log::LogMessage;
use mythos_session::domain::result::SessionResult;
use mythos_session::domain::signals::{CheckRequest, EndSignal};
use mythos_session::domain::state::{Character, Profile, SessionPhase, SessionState, World};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Character identity.
    pub profile: Profile,
    /// Free-text scenario theme. The narrator picks one when blank.
    #[serde(default)]
    pub theme: String,
    /// Points added to catalogue skills on top of their base values.
    #[serde(default)]
    pub skill_points: BTreeMap<String, u32>,
}

/// Request body for POST /{id}/input.
#[derive(Debug, Deserialize)]
pub struct SubmitInputRequest {
    /// Free-text player action.
    pub input: String,
}

/// Player-facing view of a session. Narrator-only fields are omitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session id.
    pub id: Uuid,
    /// Controller phase.
    pub phase: ControllerPhase,
    /// Narrative phase.
    pub session_phase: SessionPhase,
    /// Scenario theme.
    pub theme: String,
    /// Player character.
    pub character: Character,
    /// Objective, flags and NPCs.
    pub world: World,
    /// Full message history.
    pub log: Vec<LogMessage>,
    /// Suggested actions.
    pub choices: Vec<String>,
    /// Check awaiting a roll.
    pub pending_check: Option<CheckRequest>,
    /// End signal, once the session is over.
    pub end_signal: Option<EndSignal>,
}

impl SessionView {
    fn of(controller: &TurnController) -> Self {
        let state = controller.state();
        Self {
            id: controller.id(),
            phase: controller.phase(),
            session_phase: state.session.phase,
            theme: state.session.theme.clone(),
            character: state.character.clone(),
            world: state.world.clone(),
            log: state.log.messages().to_vec(),
            choices: controller.choices().to_vec(),
            pending_check: controller.pending_check().cloned(),
            end_signal: controller.end_signal().cloned(),
        }
    }
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    /// The new session.
    pub session: SessionView,
    /// The opening turn.
    pub turn: TurnOutcome,
}

/// POST /
#[instrument(skip(state, request), fields(theme = %request.theme))]
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let mut rng = state.new_rng();
    let abilities = Abilities::roll(rng.as_mut())
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
    let skills = allocate_skills(&abilities, &request.skill_points)
        .map_err(|e| DomainError::Validation(e.to_string()))?;
    let character = Character::new(request.profile, abilities, skills);

    let session_state =
        SessionState::new(Uuid::new_v4(), request.theme.clone()).with_character(character);
    let mut controller = TurnController::new(
        session_state,
        Arc::clone(&state.narrator),
        rng,
        Arc::clone(&state.clock),
        state.controller_config,
    );

    let turn = controller
        .start(&request.theme)
        .await
        .map_err(DomainError::from)?;
    let session = SessionView::of(&controller);
    state.insert(controller).await;

    info!(session_id = %session.id, "session started");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session, turn }),
    ))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session(id).await?;
    let controller = handle.lock().await;
    Ok(Json(SessionView::of(&controller)))
}

/// POST /{id}/input
#[instrument(skip(state, request))]
async fn submit_input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitInputRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let handle = state.session(id).await?;
    let mut controller = handle.lock().await;

    info!("handling player input");

    let outcome = controller
        .submit_input(&request.input)
        .await
        .map_err(DomainError::from)?;
    Ok(Json(outcome))
}

/// POST /{id}/roll
#[instrument(skip(state))]
async fn roll_check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RollOutcome>, ApiError> {
    let handle = state.session(id).await?;
    let mut controller = handle.lock().await;

    let outcome = controller.roll_check().await.map_err(DomainError::from)?;
    Ok(Json(outcome))
}

/// GET /{id}/result
///
/// The session is evicted once its result has been built.
#[instrument(skip(state))]
async fn session_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResult>, ApiError> {
    let handle = state.session(id).await?;
    let result = handle.lock().await.result().map_err(DomainError::from)?;
    state.remove(id).await;

    info!(session_id = %id, "session result served, session evicted");
    Ok(Json(result))
}

/// Returns the router for sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session))
        .route("/{id}/input", post(submit_input))
        .route("/{id}/roll", post(roll_check))
        .route("/{id}/result", get(session_result))
}
