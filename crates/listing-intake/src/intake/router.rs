use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::controller::{Navigation, SubmitError, WizardController, WizardError};
use super::domain::{FieldErrorMap, FieldValue, Role};
use super::policy;
use super::store::{PropertyStore, SessionDirectory, StoreError};
use super::validation::ValidationEngine;

/// Header carrying the opaque session token the directory resolves.
pub const ROLE_TOKEN_HEADER: &str = "x-intake-role";

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> String {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("session-{id:06}")
}

/// Registry of live wizard sessions. The registry mutex serializes
/// operations per session, which also enforces the single-flight rule at
/// the transport layer.
pub struct WizardSessions<S> {
    engine: Arc<ValidationEngine>,
    store: Arc<S>,
    sessions: Mutex<HashMap<String, WizardController<S>>>,
}

impl<S> WizardSessions<S>
where
    S: PropertyStore,
{
    pub fn new(engine: Arc<ValidationEngine>, store: Arc<S>) -> Self {
        Self {
            engine,
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a fresh session and return its identifier.
    pub fn open(&self) -> String {
        let id = next_session_id();
        let controller = WizardController::new(self.engine.clone(), self.store.clone());
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(id.clone(), controller);
        id
    }

    /// Run a closure against one session's controller, if it exists.
    pub fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut WizardController<S>) -> T,
    ) -> Option<T> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.get_mut(id).map(f)
    }
}

struct IntakeState<S> {
    sessions: Arc<WizardSessions<S>>,
    directory: Arc<dyn SessionDirectory>,
}

impl<S> Clone for IntakeState<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            directory: self.directory.clone(),
        }
    }
}

/// Router exposing the wizard session API. Every response body carrying
/// snapshot data passes through the sensitive-field policy for the
/// caller's role.
pub fn intake_router<S>(
    sessions: Arc<WizardSessions<S>>,
    directory: Arc<dyn SessionDirectory>,
) -> Router
where
    S: PropertyStore + 'static,
{
    let state = IntakeState {
        sessions,
        directory,
    };

    Router::new()
        .route("/api/v1/intake/sessions", post(open_session::<S>))
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(session_view::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/fields",
            put(update_field::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/navigate",
            post(navigate::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/submit",
            post(submit::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/draft",
            post(save_draft::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/progress",
            get(progress::<S>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct FieldEditRequest {
    name: String,
    #[serde(default)]
    value: Option<FieldValue>,
}

#[derive(Debug, Deserialize)]
struct NavigateRequest {
    target: usize,
}

fn resolve_role<S>(state: &IntakeState<S>, headers: &HeaderMap) -> Result<Role, Response> {
    let token = headers
        .get(ROLE_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    match token.and_then(|token| state.directory.current_role(token)) {
        Some(role) => Ok(role),
        None => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "unknown or missing role token",
        )),
    }
}

fn require_mutating_role(role: Role) -> Result<(), Response> {
    if role == Role::ReadOnly {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "read-only role may not modify intake sessions",
        ));
    }
    Ok(())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Error maps are keyed by field name, so they pass through the same
/// visibility policy as field data before leaving the service.
fn visible_errors(errors: FieldErrorMap, role: Role) -> FieldErrorMap {
    errors
        .into_iter()
        .filter(|(field, _)| policy::can_view(role, field))
        .collect()
}

fn unknown_session() -> Response {
    error_response(StatusCode::NOT_FOUND, "unknown session")
}

async fn open_session<S>(
    State(state): State<IntakeState<S>>,
    headers: HeaderMap,
) -> Response
where
    S: PropertyStore + 'static,
{
    let role = match resolve_role(&state, &headers) {
        Ok(role) => role,
        Err(response) => return response,
    };
    if let Err(response) = require_mutating_role(role) {
        return response;
    }

    let session_id = state.sessions.open();
    let payload = state
        .sessions
        .with_session(&session_id, |controller| {
            json!({
                "session_id": session_id.clone(),
                "phase": controller.phase(),
                "step": controller.current_step(role),
            })
        })
        .expect("session just opened");

    (StatusCode::CREATED, Json(payload)).into_response()
}

async fn session_view<S>(
    State(state): State<IntakeState<S>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: PropertyStore + 'static,
{
    let role = match resolve_role(&state, &headers) {
        Ok(role) => role,
        Err(response) => return response,
    };

    let payload = state.sessions.with_session(&session_id, |controller| {
        json!({
            "session_id": session_id.clone(),
            "phase": controller.phase(),
            "step": controller.current_step(role),
            "snapshot": controller.sanitized_snapshot(role),
            "progress": controller.completion(),
            "last_failure": controller.last_failure(),
        })
    });

    match payload {
        Some(payload) => {
            if !role.is_privileged() {
                debug_assert!(
                    policy::find_sensitive(&payload).is_none(),
                    "sensitive field leaked past sanitize"
                );
            }
            (StatusCode::OK, Json(payload)).into_response()
        }
        None => unknown_session(),
    }
}

async fn update_field<S>(
    State(state): State<IntakeState<S>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<FieldEditRequest>,
) -> Response
where
    S: PropertyStore + 'static,
{
    let role = match resolve_role(&state, &headers) {
        Ok(role) => role,
        Err(response) => return response,
    };
    if let Err(response) = require_mutating_role(role) {
        return response;
    }
    if !policy::can_view(role, &request.name) {
        return error_response(
            StatusCode::FORBIDDEN,
            "field requires a privileged role to edit",
        );
    }

    let outcome = state.sessions.with_session(&session_id, |controller| {
        let result = match request.value {
            Some(value) => controller.update_field(&request.name, value),
            None => controller.clear_field(&request.name),
        };
        result.map(|()| controller.completion())
    });

    match outcome {
        Some(Ok(completion)) => {
            (StatusCode::OK, Json(json!({ "progress": completion }))).into_response()
        }
        Some(Err(error)) => wizard_error_response(error),
        None => unknown_session(),
    }
}

async fn navigate<S>(
    State(state): State<IntakeState<S>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<NavigateRequest>,
) -> Response
where
    S: PropertyStore + 'static,
{
    let role = match resolve_role(&state, &headers) {
        Ok(role) => role,
        Err(response) => return response,
    };
    if let Err(response) = require_mutating_role(role) {
        return response;
    }

    let outcome = state.sessions.with_session(&session_id, |controller| {
        controller
            .go_to_step(request.target)
            .map(|navigation| (navigation, controller.current_step(role)))
    });

    match outcome {
        Some(Ok((Navigation::Entered(index), step))) => (
            StatusCode::OK,
            Json(json!({ "entered": index, "step": step })),
        )
            .into_response(),
        Some(Ok((Navigation::Blocked { errors }, step))) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": visible_errors(errors, role), "step": step })),
        )
            .into_response(),
        Some(Err(error)) => wizard_error_response(error),
        None => unknown_session(),
    }
}

async fn submit<S>(
    State(state): State<IntakeState<S>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: PropertyStore + 'static,
{
    let role = match resolve_role(&state, &headers) {
        Ok(role) => role,
        Err(response) => return response,
    };
    if let Err(response) = require_mutating_role(role) {
        return response;
    }

    let outcome = state
        .sessions
        .with_session(&session_id, |controller| controller.submit());

    match outcome {
        Some(Ok(receipt)) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Some(Err(error)) => submit_error_response(error, role),
        None => unknown_session(),
    }
}

async fn save_draft<S>(
    State(state): State<IntakeState<S>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: PropertyStore + 'static,
{
    let role = match resolve_role(&state, &headers) {
        Ok(role) => role,
        Err(response) => return response,
    };
    if let Err(response) = require_mutating_role(role) {
        return response;
    }

    let outcome = state
        .sessions
        .with_session(&session_id, |controller| controller.save_draft());

    match outcome {
        Some(Ok(receipt)) => (StatusCode::ACCEPTED, Json(receipt)).into_response(),
        Some(Err(error)) => submit_error_response(error, role),
        None => unknown_session(),
    }
}

async fn progress<S>(
    State(state): State<IntakeState<S>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: PropertyStore + 'static,
{
    if let Err(response) = resolve_role(&state, &headers) {
        return response;
    }

    let report = state
        .sessions
        .with_session(&session_id, |controller| controller.completion());

    match report {
        Some(report) => (StatusCode::OK, Json(report)).into_response(),
        None => unknown_session(),
    }
}

fn wizard_error_response(error: WizardError) -> Response {
    match error {
        WizardError::UnknownField(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &error.to_string())
        }
        WizardError::StepOutOfRange { .. } => {
            error_response(StatusCode::BAD_REQUEST, &error.to_string())
        }
        WizardError::OperationInFlight | WizardError::SessionComplete => {
            error_response(StatusCode::CONFLICT, &error.to_string())
        }
        WizardError::Catalog(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
        }
    }
}

fn submit_error_response(error: SubmitError, role: Role) -> Response {
    match error {
        SubmitError::Rejected { errors, step } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": visible_errors(errors, role), "first_invalid_step": step })),
        )
            .into_response(),
        SubmitError::InFlight | SubmitError::SessionComplete => {
            error_response(StatusCode::CONFLICT, &error.to_string())
        }
        SubmitError::Store(StoreError::Conflict) => {
            error_response(StatusCode::CONFLICT, &StoreError::Conflict.to_string())
        }
        SubmitError::Store(error @ StoreError::Unavailable(_)) => {
            error_response(StatusCode::BAD_GATEWAY, &error.to_string())
        }
    }
}
