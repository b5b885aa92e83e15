use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// Upper bound (exclusive) of the `low` band.
pub const LOW_CONGESTION_MAX: f64 = 0.34;
/// Upper bound (exclusive) of the `medium` band.
pub const MEDIUM_CONGESTION_MAX: f64 = 0.67;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    pub const ALL: [CongestionLevel; 3] = [Self::Low, Self::Medium, Self::High];

    /// Score band covered by this level, `[lower, upper)` (`high` is closed at 1.0).
    pub fn band(self) -> (f64, f64) {
        match self {
            Self::Low => (0.0, LOW_CONGESTION_MAX),
            Self::Medium => (LOW_CONGESTION_MAX, MEDIUM_CONGESTION_MAX),
            Self::High => (MEDIUM_CONGESTION_MAX, 1.0),
        }
    }

    /// Representative score stored when only a category is known.
    pub fn score(self) -> f64 {
        let (lower, upper) = self.band();
        (lower + upper) / 2.0
    }

    pub fn from_score(score: f64) -> Self {
        if score < LOW_CONGESTION_MAX {
            Self::Low
        } else if score < MEDIUM_CONGESTION_MAX {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn color(self) -> TrafficColor {
        match self {
            Self::Low => TrafficColor::Green,
            Self::Medium => TrafficColor::Orange,
            Self::High => TrafficColor::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficColor {
    Green,
    Orange,
    Red,
}

/// Continuous congestion score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Congestion(f64);

impl Congestion {
    pub fn new(score: f64) -> Self {
        if score.is_nan() {
            return Self(0.0);
        }
        Self(score.clamp(0.0, 1.0))
    }

    pub fn score(self) -> f64 {
        self.0
    }

    pub fn level(self) -> CongestionLevel {
        CongestionLevel::from_score(self.0)
    }

    pub fn color(self) -> TrafficColor {
        self.level().color()
    }

    /// Whole-percent density used in "Traffic density: N%" labels.
    pub fn density_percent(self) -> u8 {
        (self.0 * 100.0).floor() as u8
    }
}

impl From<CongestionLevel> for Congestion {
    fn from(level: CongestionLevel) -> Self {
        Self(level.score())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CongestionSegment {
    pub start: usize,
    pub end: usize,
    pub congestion: Congestion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionStep {
    pub instruction: String,
    pub distance_km: f64,
    pub duration_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub path_index: usize,
    pub location: Coordinate,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub congestion: Congestion,
    pub segments: Vec<CongestionSegment>,
    pub uses_tolls: bool,
    pub uses_highways: bool,
    pub steps: Vec<DirectionStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident: Option<Incident>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteInvariantError {
    TooFewPoints(usize),
    NegativeMeasure,
    SegmentGap { expected: usize, found: usize },
    EmptySegment(usize),
    UncoveredTail { covered: usize, last: usize },
    EndpointMismatch,
}

impl std::fmt::Display for RouteInvariantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints(n) => write!(f, "path has {n} point(s), need at least 2"),
            Self::NegativeMeasure => write!(f, "distance or duration is negative or not finite"),
            Self::SegmentGap { expected, found } => {
                write!(f, "segment starts at {found}, expected {expected}")
            }
            Self::EmptySegment(at) => write!(f, "empty segment at path index {at}"),
            Self::UncoveredTail { covered, last } => {
                write!(f, "segments end at {covered}, path ends at {last}")
            }
            Self::EndpointMismatch => write!(f, "path endpoints differ from origin/destination"),
        }
    }
}

impl std::error::Error for RouteInvariantError {}

impl Route {
    pub fn origin(&self) -> Option<Coordinate> {
        self.path.first().copied()
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.path.last().copied()
    }

    /// Checks the structural invariants every produced route must hold.
    pub fn check_invariants(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<(), RouteInvariantError> {
        if self.path.len() < 2 {
            return Err(RouteInvariantError::TooFewPoints(self.path.len()));
        }
        let measures_ok = [self.distance_km, self.duration_min]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !measures_ok {
            return Err(RouteInvariantError::NegativeMeasure);
        }
        if self.origin() != Some(origin) || self.destination() != Some(destination) {
            return Err(RouteInvariantError::EndpointMismatch);
        }

        let mut expected = 0;
        for segment in &self.segments {
            if segment.start != expected {
                return Err(RouteInvariantError::SegmentGap {
                    expected,
                    found: segment.start,
                });
            }
            if segment.end <= segment.start {
                return Err(RouteInvariantError::EmptySegment(segment.start));
            }
            expected = segment.end;
        }
        let last = self.path.len() - 1;
        if expected != last {
            return Err(RouteInvariantError::UncoveredTail {
                covered: expected,
                last,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeFor {
    #[default]
    Time,
    Distance,
    Eco,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePreferences {
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub optimize_for: OptimizeFor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentKind {
    Accident,
    Construction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficIncident {
    pub kind: IncidentKind,
    pub location: String,
    pub delay_min: u32,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Provider,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub routes: Vec<Route>,
    pub recommended: usize,
    pub source: RouteSource,
    #[serde(default)]
    pub incidents: Vec<TrafficIncident>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionLine {
    pub instruction: String,
    pub distance: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub name: String,
    pub distance: String,
    pub duration: String,
    pub congestion: String,
    pub features: String,
    pub color: TrafficColor,
    /// Where the route name is drawn on a map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_at: Option<Coordinate>,
}

/// One colored span of the congestion layer, covering `path[start..=end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySegment {
    pub start: usize,
    pub end: usize,
    pub color: TrafficColor,
    pub tooltip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
