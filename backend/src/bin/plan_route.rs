use clap::{Parser, ValueEnum};
use route_planner::{
    config::PlannerConfig,
    extract,
    planner::{PlanRequest, RoutePlanner, Waypoint},
};
use shared::{OptimizeFor, RoutePlan, RoutePreferences, RouteSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Goal {
    Time,
    Distance,
    Eco,
}

impl From<Goal> for OptimizeFor {
    fn from(goal: Goal) -> Self {
        match goal {
            Goal::Time => OptimizeFor::Time,
            Goal::Distance => OptimizeFor::Distance,
            Goal::Eco => OptimizeFor::Eco,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Plan three driving options between two places")]
struct Args {
    /// Start: a named place (e.g. "Times Square") or "lat,lon"
    #[arg(long)]
    from: Waypoint,

    /// Destination: a named place or "lat,lon"
    #[arg(long)]
    to: Waypoint,

    #[arg(long)]
    avoid_tolls: bool,

    #[arg(long)]
    avoid_highways: bool,

    #[arg(long, value_enum, default_value_t = Goal::Time)]
    optimize_for: Goal,

    /// Seed for reproducible synthetic data
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides ROUTE_PROVIDER (none, openrouteservice, google)
    #[arg(long)]
    provider: Option<String>,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = PlannerConfig::from_lookup(|key| match (key, &args.provider) {
        ("ROUTE_PROVIDER", Some(name)) => Some(name.clone()),
        _ => std::env::var(key).ok(),
    })?;
    let planner = RoutePlanner::new(&config, config.build_provider()?);

    let request = PlanRequest {
        origin: args.from.clone(),
        destination: args.to.clone(),
        preferences: RoutePreferences {
            avoid_tolls: args.avoid_tolls,
            avoid_highways: args.avoid_highways,
            optimize_for: args.optimize_for.into(),
        },
        seed: args.seed,
    };
    tracing::info!("planning {} -> {}", request.origin, request.destination);
    let plan = planner.plan(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &RoutePlan) {
    if plan.source == RouteSource::Synthetic {
        println!("(simulated routes)");
    }
    for (index, route) in plan.routes.iter().enumerate() {
        let summary = extract::summary(route);
        let marker = if index == plan.recommended { " [recommended]" } else { "" };
        println!();
        println!("{}{marker}", summary.name);
        println!(
            "  {} | {} | congestion {} ({:?}) | {}",
            summary.distance, summary.duration, summary.congestion, summary.color, summary.features
        );
        let layer: Vec<String> = extract::overlay(route)
            .iter()
            .map(|span| format!("{}-{} {:?}", span.start, span.end, span.color))
            .collect();
        if !layer.is_empty() {
            println!("  traffic: {}", layer.join(", "));
        }
        if let Some(incident) = &route.incident {
            println!("  ! {}", incident.description);
        }
        for (n, line) in extract::directions(route).iter().enumerate() {
            println!(
                "  {:>2}. {} ({}, {})",
                n + 1,
                line.instruction,
                line.distance,
                line.duration
            );
        }
    }

    if !plan.incidents.is_empty() {
        println!();
        println!("Traffic conditions:");
        for incident in &plan.incidents {
            println!(
                "  {:?} at {}: +{} min ({:?})",
                incident.kind, incident.location, incident.delay_min, incident.severity
            );
        }
    }
}
