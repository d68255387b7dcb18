use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};

use super::error::StorageError;
use super::fs::{Filesystem, TRACK_EXTENSION};

const CREATOR: &str = "track-o-mat";

/// One logged position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation_m: f64,
    pub time: Option<DateTime<Utc>>,
}

/// An open track file. Only obtainable from [`TrackWriter::begin_session`] and
/// consumed by [`TrackWriter::end_session`], so a track cannot be closed twice.
pub struct SessionHandle<W> {
    name: String,
    file: W,
    failed_writes: u32,
}

impl<W> SessionHandle<W> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failed_writes(&self) -> u32 {
        self.failed_writes
    }
}

/// Writes GPX 1.1 tracks, one file per session.
pub struct TrackWriter<F: Filesystem> {
    fs: F,
}

impl<F: Filesystem> TrackWriter<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub fn begin_session(
        &self,
        start: Option<DateTime<Utc>>,
    ) -> Result<SessionHandle<F::File>, StorageError> {
        let (name, mut file) = self.create_unique(start)?;
        let header = header(&name);
        if let Err(source) = file.write_all(header.as_bytes()).and_then(|_| file.flush()) {
            // Never leave a headerless stub behind.
            drop(file);
            if let Err(e) = self.fs.remove(&name) {
                log::warn!("Failed to remove incomplete track {}: {}", name, e);
            }
            return Err(StorageError::Create { name, source });
        }

        log::info!("Opened track {}", name);
        Ok(SessionHandle {
            name,
            file,
            failed_writes: 0,
        })
    }

    /// Best effort: a failed write is logged and the session carries on.
    pub fn append_point(&self, handle: &mut SessionHandle<F::File>, point: &TrackPoint) {
        let record = point_record(point);
        let result = handle
            .file
            .write_all(record.as_bytes())
            .and_then(|_| handle.file.flush());
        if let Err(e) = result {
            handle.failed_writes += 1;
            log::error!("Failed to append point to {}: {}", handle.name, e);
        }
    }

    pub fn end_session(&self, handle: SessionHandle<F::File>) -> Result<(), StorageError> {
        let SessionHandle {
            name,
            mut file,
            failed_writes,
        } = handle;

        let footer = file.write_all(FOOTER.as_bytes());
        let closed = self.fs.close(file);
        footer.and(closed)?;

        if failed_writes > 0 {
            log::warn!("Closed track {} with {} lost points", name, failed_writes);
        } else {
            log::info!("Closed track {}", name);
        }
        Ok(())
    }

    fn create_unique(
        &self,
        start: Option<DateTime<Utc>>,
    ) -> Result<(String, F::File), StorageError> {
        let name = match start {
            Some(start) => format!(
                "{}.{}",
                start.format("%Y%m%dT%H%M%SZ"),
                TRACK_EXTENSION
            ),
            None => placeholder_name(None),
        };

        match self.fs.create(&name) {
            Ok(file) => Ok((name, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let name = placeholder_name(start);
                log::warn!("Track name taken, falling back to {}", name);
                let file = self
                    .fs
                    .create(&name)
                    .map_err(|source| StorageError::Create {
                        name: name.clone(),
                        source,
                    })?;
                Ok((name, file))
            }
            Err(source) => Err(StorageError::Create { name, source }),
        }
    }
}

fn placeholder_name(start: Option<DateTime<Utc>>) -> String {
    let uuid = uuid::Uuid::new_v4();
    match start {
        Some(start) => format!(
            "{}_{}.{}",
            start.format("%Y%m%dT%H%M%SZ"),
            uuid,
            TRACK_EXTENSION
        ),
        None => format!("track_{}.{}", uuid, TRACK_EXTENSION),
    }
}

fn header(name: &str) -> String {
    let title = name.trim_end_matches(&format!(".{TRACK_EXTENSION}"));
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<gpx version=\"1.1\" creator=\"{creator}\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
            "  <trk>\n",
            "    <name>{title}</name>\n",
            "    <trkseg>\n",
        ),
        creator = CREATOR,
        title = title,
    )
}

const FOOTER: &str = "    </trkseg>\n  </trk>\n</gpx>\n";

fn point_record(point: &TrackPoint) -> String {
    let time = point
        .time
        .map(|t| {
            format!(
                "<time>{}</time>",
                t.to_rfc3339_opts(SecondsFormat::Secs, true)
            )
        })
        .unwrap_or_default();
    format!(
        "      <trkpt lat=\"{:.6}\" lon=\"{:.6}\"><ele>{:.2}</ele>{}</trkpt>\n",
        point.lat, point.lon, point.elevation_m, time
    )
}
