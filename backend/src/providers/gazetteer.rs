use shared::Coordinate;

/// Fixed set of named demo places, used for geocoding before any provider
/// is asked.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    places: Vec<(String, Coordinate)>,
}

const DEMO_PLACES: [(&str, f64, f64); 10] = [
    ("City Center", 40.712, -74.006),
    ("Airport", 40.640, -73.779),
    ("Downtown", 40.702, -74.015),
    ("Midtown", 40.754, -73.984),
    ("Brooklyn", 40.678, -73.944),
    ("Queens", 40.728, -73.794),
    ("Bronx", 40.837, -73.846),
    ("Central Park", 40.785, -73.968),
    ("Times Square", 40.758, -73.985),
    ("Financial District", 40.707, -74.011),
];

impl Default for Gazetteer {
    fn default() -> Self {
        Self::demo()
    }
}

impl Gazetteer {
    pub fn demo() -> Self {
        Self::new(
            DEMO_PLACES
                .iter()
                .map(|&(name, lat, lon)| (name.to_string(), Coordinate::new(lat, lon))),
        )
    }

    pub fn new(places: impl IntoIterator<Item = (String, Coordinate)>) -> Self {
        Self {
            places: places.into_iter().collect(),
        }
    }

    /// Case-insensitive, whitespace-trimmed lookup.
    pub fn lookup(&self, name: &str) -> Option<Coordinate> {
        let name = name.trim();
        self.places
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, coord)| *coord)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.places.iter().map(|(name, _)| name.as_str())
    }
}
