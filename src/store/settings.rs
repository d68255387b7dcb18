use serde::{Deserialize, Serialize};

use super::{KeyValueStore, StoreError, StoredValue};
use crate::geo::GeoPoint;

const KEY_SSID: &str = "ssid";
const KEY_SECRET: &str = "password";
const KEY_HOME_LAT: &str = "home_lat";
const KEY_HOME_LON: &str = "home_lon";
const KEY_AUTO_TRACK: &str = "auto_track";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Credentials {
    pub ssid: String,
    pub secret: String,
}

impl Credentials {
    /// Both fields must be present for a client connection to be attempted.
    pub fn from_parts(ssid: &str, secret: &str) -> Option<Self> {
        if ssid.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Self {
            ssid: ssid.to_string(),
            secret: secret.to_string(),
        })
    }
}

/// Settings that outlive a power cycle. Loaded once at startup, written back
/// only when a command changes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub home: GeoPoint,
    pub credentials: Option<Credentials>,
    pub auto_tracking: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: GeoPoint::default(),
            credentials: None,
            auto_tracking: true,
        }
    }
}

impl Settings {
    pub fn load(store: &impl KeyValueStore) -> Self {
        let defaults = Self::default();
        let home = GeoPoint::new(
            store
                .get_f64(KEY_HOME_LAT)
                .unwrap_or(defaults.home.latitude_deg),
            store
                .get_f64(KEY_HOME_LON)
                .unwrap_or(defaults.home.longitude_deg),
        );
        let credentials = Credentials::from_parts(
            &store.get_string(KEY_SSID).unwrap_or_default(),
            &store.get_string(KEY_SECRET).unwrap_or_default(),
        );
        Self {
            home,
            credentials,
            auto_tracking: store
                .get_bool(KEY_AUTO_TRACK)
                .unwrap_or(defaults.auto_tracking),
        }
    }

    pub fn save_home(
        &mut self,
        store: &mut impl KeyValueStore,
        home: GeoPoint,
    ) -> Result<(), StoreError> {
        store.put_all(&[
            (KEY_HOME_LAT, StoredValue::Float(home.latitude_deg)),
            (KEY_HOME_LON, StoredValue::Float(home.longitude_deg)),
        ])?;
        self.home = home;
        Ok(())
    }

    /// Stores the raw values as given; empty fields clear the credentials.
    pub fn save_credentials(
        &mut self,
        store: &mut impl KeyValueStore,
        ssid: &str,
        secret: &str,
    ) -> Result<(), StoreError> {
        store.put_all(&[
            (KEY_SSID, StoredValue::Str(ssid.to_string())),
            (KEY_SECRET, StoredValue::Str(secret.to_string())),
        ])?;
        self.credentials = Credentials::from_parts(ssid, secret);
        Ok(())
    }

    pub fn save_auto_tracking(
        &mut self,
        store: &mut impl KeyValueStore,
        enabled: bool,
    ) -> Result<(), StoreError> {
        store.put_all(&[(KEY_AUTO_TRACK, StoredValue::Bool(enabled))])?;
        self.auto_tracking = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn empty_store_yields_defaults() {
        let settings = Settings::load(&MemoryStore::new());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.home, GeoPoint::new(0.0, 0.0));
    }

    #[test]
    fn saved_values_load_back() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::load(&store);
        settings
            .save_home(&mut store, GeoPoint::new(47.1, 8.5))
            .unwrap();
        settings
            .save_credentials(&mut store, "home-net", "hunter22")
            .unwrap();
        settings.save_auto_tracking(&mut store, false).unwrap();

        assert_eq!(Settings::load(&store), settings);
        assert_eq!(
            settings.credentials,
            Credentials::from_parts("home-net", "hunter22")
        );
    }

    #[test]
    fn failed_home_write_keeps_previous_home() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let mut store = crate::store::YamlFileStore::open(blocker.join("settings.yaml")).unwrap();
        let mut settings = Settings::load(&store);

        assert!(settings
            .save_home(&mut store, GeoPoint::new(47.1, 8.5))
            .is_err());
        assert_eq!(settings.home, GeoPoint::default());
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn either_field_missing_means_no_credentials() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::load(&store);
        settings.save_credentials(&mut store, "home-net", "").unwrap();
        assert_eq!(settings.credentials, None);
        assert_eq!(Settings::load(&store).credentials, None);
    }
}
