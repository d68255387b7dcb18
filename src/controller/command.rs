use serde::Deserialize;
use utoipa::ToSchema;

/// Operator requests, queued by collaborators and applied once per cycle.
#[derive(Clone, PartialEq, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Use the latest valid fix as home.
    SetHome,
    ToggleTracking,
    ToggleAutoTracking,
    UpdateCredentials { ssid: String, secret: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetHome => "set_home",
            Command::ToggleTracking => "toggle_tracking",
            Command::ToggleAutoTracking => "toggle_auto_tracking",
            Command::UpdateCredentials { .. } => "update_credentials",
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::UpdateCredentials { ssid, .. } => f
                .debug_struct("UpdateCredentials")
                .field("ssid", ssid)
                .finish_non_exhaustive(),
            other => f.write_str(other.name()),
        }
    }
}

pub type CommandSender = std::sync::mpsc::Sender<Command>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_commands() {
        let cmd: Command = serde_json::from_str(r#"{"action": "toggle_tracking"}"#).unwrap();
        assert_eq!(cmd, Command::ToggleTracking);

        let cmd: Command = serde_json::from_str(
            r#"{"action": "update_credentials", "ssid": "home-net", "secret": "s3cret"}"#,
        )
        .unwrap();
        assert_eq!(cmd.name(), "update_credentials");
        assert!(!format!("{cmd:?}").contains("s3cret"));
    }
}
