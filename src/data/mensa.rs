//! Static catalog of eat-api canteens
//!
//! The keys match the location segment of eat-api URLs. The catalog is only
//! used to offer names and nearest-canteen lookup; menu fetching accepts any
//! key.

use super::Mensa;

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Static array of known canteens
pub static MENSAS: [Mensa; 10] = [
    Mensa {
        id: "mensa-garching",
        name: "Mensa Garching",
        latitude: 48.2681,
        longitude: 11.6723,
    },
    Mensa {
        id: "mensa-arcisstr",
        name: "Mensa Arcisstraße",
        latitude: 48.1474,
        longitude: 11.5673,
    },
    Mensa {
        id: "mensa-leopoldstr",
        name: "Mensa Leopoldstraße",
        latitude: 48.1561,
        longitude: 11.5822,
    },
    Mensa {
        id: "mensa-lothstr",
        name: "Mensa Lothstraße",
        latitude: 48.1540,
        longitude: 11.5527,
    },
    Mensa {
        id: "mensa-martinsried",
        name: "Mensa Martinsried",
        latitude: 48.1100,
        longitude: 11.4600,
    },
    Mensa {
        id: "mensa-pasing",
        name: "Mensa Pasing",
        latitude: 48.1418,
        longitude: 11.4510,
    },
    Mensa {
        id: "mensa-weihenstephan",
        name: "Mensa Weihenstephan",
        latitude: 48.3999,
        longitude: 11.7232,
    },
    Mensa {
        id: "stubistro-arcisstr",
        name: "StuBistro Arcisstraße",
        latitude: 48.1486,
        longitude: 11.5676,
    },
    Mensa {
        id: "stubistro-goethestr",
        name: "StuBistro Goethestraße",
        latitude: 48.1316,
        longitude: 11.5634,
    },
    Mensa {
        id: "stucafe-garching",
        name: "StuCafé Garching",
        latitude: 48.2685,
        longitude: 11.6712,
    },
];

/// Get a canteen by its eat-api key
pub fn get_mensa_by_id(id: &str) -> Option<&'static Mensa> {
    MENSAS.iter().find(|mensa| mensa.id == id)
}

/// Get all known canteens
pub fn all_mensas() -> &'static [Mensa] {
    &MENSAS
}

/// Great-circle distance between two coordinates in kilometers
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Find the canteen closest to the given coordinates
pub fn nearest_mensa(latitude: f64, longitude: f64) -> Option<&'static Mensa> {
    MENSAS.iter().min_by(|a, b| {
        let da = distance_km(latitude, longitude, a.latitude, a.longitude);
        let db = distance_km(latitude, longitude, b.latitude, b.longitude);
        da.total_cmp(&db)
    })
}
