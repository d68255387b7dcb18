use utoipa::OpenApi;

use super::api::control::{CommandAccepted, CredentialsRequest};
use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::control::set_home,
        super::api::control::toggle_tracking,
        super::api::control::toggle_auto_tracking,
        super::api::control::update_credentials,
        super::api::control::status,
        super::api::control::session,
        super::api::control::connectivity,
        super::api::tracks::list,
        super::api::tracks::delete,
    ),
    components(
        schemas(
            CommandAccepted,
            CredentialsRequest,
            ErrorResponse,
            crate::controller::ControllerStatus,
            crate::track::SessionSnapshot,
            crate::track::SessionState,
            crate::track::TrackInfo,
            crate::connectivity::ConnectivitySnapshot,
            crate::connectivity::Role,
            crate::geo::GeoPoint,
        )
    ),
    info(
        title = "Track-O-Mat Control API",
        description = "Commands and status for the geofence tracker controller",
        version = "0.1.0"
    ),
    tags(
        (name = "control", description = "Operator commands"),
        (name = "status", description = "Controller snapshots"),
        (name = "tracks", description = "Recorded track files")
    )
)]
pub struct ApiDoc;
