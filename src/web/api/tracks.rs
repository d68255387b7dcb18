use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::track::{list_tracks, remove_track, TrackInfo};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/tracks",
    responses(
        (status = 200, description = "Stored tracks", body = Vec<TrackInfo>),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "tracks"
)]
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<TrackInfo>>> {
    let active = state.status().session.track;
    Ok(Json(list_tracks(&*state.tracks, active.as_deref())?))
}

#[utoipa::path(
    delete,
    path = "/api/tracks/{name}",
    params(
        ("name" = String, Path, description = "Track file name")
    ),
    responses(
        (status = 204, description = "Track deleted"),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 404, description = "Track not found", body = ErrorResponse),
        (status = 409, description = "Track is being recorded", body = ErrorResponse)
    ),
    tag = "tracks"
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    let active = state.status().session.track;
    remove_track(&*state.tracks, &name, active.as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::api::error::ApiError;
    use crate::web::state::test_support::state_for;
    use tempfile::tempdir;

    #[tokio::test]
    async fn lists_and_deletes_finished_tracks() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("20261018T073000Z.gpx"), "<gpx/>").unwrap();
        let (state, _controller) = state_for(dir.path());

        let Json(tracks) = list(State(state.clone())).await.ok().unwrap();
        assert_eq!(
            tracks,
            vec![TrackInfo {
                name: "20261018T073000Z.gpx".into(),
                recording: false
            }]
        );

        let code = delete(State(state.clone()), Path("20261018T073000Z.gpx".into()))
            .await
            .ok()
            .unwrap();
        assert_eq!(code, StatusCode::NO_CONTENT);

        let again = delete(State(state), Path("20261018T073000Z.gpx".into())).await;
        assert!(matches!(again, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn path_escape_is_a_validation_error() {
        let dir = tempdir().unwrap();
        let (state, _controller) = state_for(dir.path());
        let result = delete(State(state), Path("../x.gpx".into())).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn refuses_to_delete_active_track() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.gpx"), "<gpx>").unwrap();
        let (state, _controller) = state_for(dir.path());
        state.status.lock().unwrap().session.track = Some("a.gpx".into());

        let Json(tracks) = list(State(state.clone())).await.ok().unwrap();
        assert!(tracks[0].recording);

        let result = delete(State(state), Path("a.gpx".into())).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
        assert!(dir.path().join("a.gpx").exists());
    }
}
