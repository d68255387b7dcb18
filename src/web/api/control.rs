use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::connectivity::ConnectivitySnapshot;
use crate::controller::{Command, ControllerStatus};
use crate::track::SessionSnapshot;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CommandAccepted {
    pub command: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub ssid: String,
    #[serde(default)]
    pub secret: String,
}

fn enqueue(state: &AppState, command: Command) -> ApiResult<(StatusCode, Json<CommandAccepted>)> {
    let name = command.name().to_string();
    state
        .commands
        .send(command)
        .map_err(|_| ApiError::Unavailable)?;
    Ok((StatusCode::ACCEPTED, Json(CommandAccepted { command: name })))
}

#[utoipa::path(
    post,
    path = "/api/home",
    responses(
        (status = 202, description = "Home will be set from the latest fix", body = CommandAccepted),
        (status = 503, description = "Controller stopped", body = ErrorResponse)
    ),
    tag = "control"
)]
pub async fn set_home(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<CommandAccepted>)> {
    enqueue(&state, Command::SetHome)
}

#[utoipa::path(
    post,
    path = "/api/tracking/toggle",
    responses(
        (status = 202, description = "Recording will start or stop", body = CommandAccepted),
        (status = 503, description = "Controller stopped", body = ErrorResponse)
    ),
    tag = "control"
)]
pub async fn toggle_tracking(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<CommandAccepted>)> {
    enqueue(&state, Command::ToggleTracking)
}

#[utoipa::path(
    post,
    path = "/api/tracking/auto/toggle",
    responses(
        (status = 202, description = "Auto tracking will flip", body = CommandAccepted),
        (status = 503, description = "Controller stopped", body = ErrorResponse)
    ),
    tag = "control"
)]
pub async fn toggle_auto_tracking(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<CommandAccepted>)> {
    enqueue(&state, Command::ToggleAutoTracking)
}

#[utoipa::path(
    put,
    path = "/api/credentials",
    request_body = CredentialsRequest,
    responses(
        (status = 202, description = "Credentials will be stored and applied", body = CommandAccepted),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Controller stopped", body = ErrorResponse)
    ),
    tag = "control"
)]
pub async fn update_credentials(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<CommandAccepted>)> {
    if request.ssid.len() > 32 {
        return Err(ApiError::Validation("ssid longer than 32 bytes".into()));
    }
    enqueue(
        &state,
        Command::UpdateCredentials {
            ssid: request.ssid,
            secret: request.secret,
        },
    )
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Controller status", body = ControllerStatus)
    ),
    tag = "status"
)]
pub async fn status(State(state): State<AppState>) -> Json<ControllerStatus> {
    Json(state.status())
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Recording session", body = SessionSnapshot)
    ),
    tag = "status"
)]
pub async fn session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.status().session)
}

#[utoipa::path(
    get,
    path = "/api/connectivity",
    responses(
        (status = 200, description = "Network role", body = ConnectivitySnapshot)
    ),
    tag = "status"
)]
pub async fn connectivity(State(state): State<AppState>) -> Json<ConnectivitySnapshot> {
    Json(state.status().connectivity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionFix;
    use crate::web::state::test_support::state_for;
    use std::time::Instant;
    use tempfile::tempdir;

    #[tokio::test]
    async fn queued_set_home_applies_on_next_cycle() {
        let dir = tempdir().unwrap();
        let (state, mut controller) = state_for(dir.path());

        let (code, Json(body)) = set_home(State(state)).await.ok().unwrap();
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(body.command, "set_home");

        let fix = PositionFix {
            lat: 48.1,
            lon: 11.5,
            altitude_m: 520.0,
            speed_kmh: 0.0,
            valid: true,
            utc: None,
        };
        controller.cycle(Instant::now(), Some(fix));
        assert_eq!(controller.settings().home.latitude_deg, 48.1);
        assert_eq!(controller.settings().home.longitude_deg, 11.5);
    }

    #[tokio::test]
    async fn rejects_oversized_ssid() {
        let dir = tempdir().unwrap();
        let (state, _controller) = state_for(dir.path());
        let request = CredentialsRequest {
            ssid: "x".repeat(33),
            secret: "pw".into(),
        };
        let result = update_credentials(State(state), Json(request)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn stopped_controller_is_unavailable() {
        let dir = tempdir().unwrap();
        let (state, controller) = state_for(dir.path());
        drop(controller);
        let result = toggle_tracking(State(state)).await;
        assert!(matches!(result, Err(ApiError::Unavailable)));
    }
}
