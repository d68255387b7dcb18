use super::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance on a spherical Earth (haversine).
///
/// No validity checks: a zeroed or stale point yields a number all the same,
/// callers gate on fix validity.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let delta_lat = b.lat_rad() - a.lat_rad();
    let delta_lon = b.lon_rad() - a.lon_rad();

    let h = (delta_lat / 2.0).sin().powi(2)
        + a.lat_rad().cos() * b.lat_rad().cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn berlin_to_paris() {
        let berlin = GeoPoint::new(52.5200, 13.4050);
        let paris = GeoPoint::new(48.8566, 2.3522);
        let d = distance_km(berlin, paris);
        assert!(d > 870.0 && d < 885.0, "got {d}");
    }

    #[test]
    fn geofence_example_points() {
        let home = GeoPoint::default();
        assert!(distance_km(home, GeoPoint::new(0.2, 0.2)) > 0.1);
        assert!(distance_km(home, GeoPoint::new(0.0001, 0.0001)) < 0.1);
    }

    proptest! {
        #[test]
        fn prop_zero_for_identical_points(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            let p = GeoPoint::new(lat, lon);
            prop_assert_eq!(distance_km(p, p), 0.0);
        }

        #[test]
        fn prop_symmetric(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0
        ) {
            let a = GeoPoint::new(lat1, lon1);
            let b = GeoPoint::new(lat2, lon2);
            prop_assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
        }

        #[test]
        fn prop_monotonic_along_meridian(lat in -80.0f64..0.0, step in 0.001f64..10.0) {
            let origin = GeoPoint::new(lat, 0.0);
            let near = distance_km(origin, GeoPoint::new(lat + step, 0.0));
            let far = distance_km(origin, GeoPoint::new(lat + 2.0 * step, 0.0));
            prop_assert!(far > near);
        }
    }
}
