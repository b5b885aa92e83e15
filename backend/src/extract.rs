use shared::{DirectionLine, OverlaySegment, Route, RouteSummary};

use crate::geometry;

const PLACEHOLDER_STEPS: [&str; 3] = [
    "Head toward your destination",
    "Follow the highlighted route",
    "Arrive at destination",
];
const UNKNOWN_DISTANCE: &str = "-- km";
const UNKNOWN_DURATION: &str = "-- min";

pub fn format_distance(km: f64) -> String {
    format!("{km:.2} km")
}

pub fn format_duration(min: f64) -> String {
    format!("{min:.1} min")
}

fn usable(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Display lines for each step, or the fixed placeholder list when the steps
/// are missing or any of them is malformed.
pub fn directions(route: &Route) -> Vec<DirectionLine> {
    let well_formed = !route.steps.is_empty()
        && route.steps.iter().all(|step| {
            !step.instruction.trim().is_empty() && usable(step.distance_km) && usable(step.duration_min)
        });

    if !well_formed {
        tracing::debug!("route {:?} has no usable steps, using placeholders", route.name);
        return placeholder_directions();
    }

    route
        .steps
        .iter()
        .map(|step| DirectionLine {
            instruction: step.instruction.clone(),
            distance: format_distance(step.distance_km),
            duration: format_duration(step.duration_min),
        })
        .collect()
}

pub fn placeholder_directions() -> Vec<DirectionLine> {
    PLACEHOLDER_STEPS
        .iter()
        .map(|instruction| DirectionLine {
            instruction: instruction.to_string(),
            distance: UNKNOWN_DISTANCE.to_string(),
            duration: UNKNOWN_DURATION.to_string(),
        })
        .collect()
}

pub fn summary(route: &Route) -> RouteSummary {
    let features = format!(
        "{}, {}",
        if route.uses_tolls { "Uses toll roads" } else { "No tolls" },
        if route.uses_highways { "Uses highways" } else { "Avoids highways" },
    );

    let (distance, duration) = if usable(route.distance_km) && usable(route.duration_min) {
        (format_distance(route.distance_km), format_duration(route.duration_min))
    } else {
        (UNKNOWN_DISTANCE.to_string(), UNKNOWN_DURATION.to_string())
    };

    RouteSummary {
        name: route.name.clone(),
        distance,
        duration,
        congestion: format!("{}%", route.congestion.density_percent()),
        features,
        color: route.congestion.color(),
        label_at: geometry::midpoint(&route.path),
    }
}

/// Congestion layer for a map: one colored span per segment.
pub fn overlay(route: &Route) -> Vec<OverlaySegment> {
    route
        .segments
        .iter()
        .map(|segment| OverlaySegment {
            start: segment.start,
            end: segment.end,
            color: segment.congestion.color(),
            tooltip: format!("Traffic density: {}%", segment.congestion.density_percent()),
        })
        .collect()
}
