use serde::Serialize;
use utoipa::ToSchema;

use super::error::StorageError;
use super::fs::{valid_track_name, Filesystem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TrackInfo {
    pub name: String,
    pub recording: bool,
}

pub fn list_tracks<F: Filesystem>(
    fs: &F,
    active: Option<&str>,
) -> Result<Vec<TrackInfo>, StorageError> {
    Ok(fs
        .list()?
        .into_iter()
        .map(|name| TrackInfo {
            recording: active == Some(name.as_str()),
            name,
        })
        .collect())
}

/// Deletes a finished track. The track being recorded cannot be removed.
pub fn remove_track<F: Filesystem>(
    fs: &F,
    name: &str,
    active: Option<&str>,
) -> Result<(), StorageError> {
    if !valid_track_name(name) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    if active == Some(name) {
        return Err(StorageError::InUse(name.to_string()));
    }
    if !fs.exists(name) {
        return Err(StorageError::NotFound(name.to_string()));
    }
    fs.remove(name)?;
    log::info!("Removed track {}", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::MemoryFs;

    #[test]
    fn marks_active_track() {
        let fs = MemoryFs::new();
        fs.create("a.gpx").unwrap();
        fs.create("b.gpx").unwrap();

        let tracks = list_tracks(&fs, Some("b.gpx")).unwrap();
        assert_eq!(
            tracks,
            vec![
                TrackInfo {
                    name: "a.gpx".into(),
                    recording: false
                },
                TrackInfo {
                    name: "b.gpx".into(),
                    recording: true
                },
            ]
        );
    }

    #[test]
    fn refuses_to_remove_active_or_missing_track() {
        let fs = MemoryFs::new();
        fs.create("a.gpx").unwrap();

        assert!(matches!(
            remove_track(&fs, "a.gpx", Some("a.gpx")),
            Err(StorageError::InUse(_))
        ));
        assert!(matches!(
            remove_track(&fs, "zzz.gpx", None),
            Err(StorageError::NotFound(_))
        ));

        remove_track(&fs, "a.gpx", None).unwrap();
        assert!(!fs.exists("a.gpx"));
    }

    #[test]
    fn rejects_names_outside_the_track_directory() {
        let fs = MemoryFs::new();
        for name in ["../x.gpx", "sub/x.gpx", ".hidden", ""] {
            assert!(
                matches!(
                    remove_track(&fs, name, None),
                    Err(StorageError::InvalidName(_))
                ),
                "{name}"
            );
        }
    }
}
