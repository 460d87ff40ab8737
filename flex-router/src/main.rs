use std::path::PathBuf;
use std::process::ExitCode;

use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use flex_router::flex::FlexTripKind;
use flex_router::network::FlexNetwork;
use flex_router::planner::{FlexRouter, RoutingConfig};

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|err| {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            eprintln!(
                "invalid {}, falling back to level '{}' - {}",
                EnvFilter::DEFAULT_ENV,
                default_level,
                err,
            );
        }
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

fn usage() -> ExitCode {
    eprintln!("usage: flex-router <network.json> [config.json]");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    init_logger();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(network_path) = args.next() else {
        return usage();
    };
    let config_path = args.next();
    if args.next().is_some() {
        return usage();
    }

    let config = match &config_path {
        Some(path) => match RoutingConfig::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => RoutingConfig::default(),
    };

    let router = match FlexRouter::with_direct_paths(config) {
        Ok(router) => router,
        Err(e) => {
            error!(error = %e, "failed to create router");
            return ExitCode::FAILURE;
        }
    };
    info!(config = ?router.config(), "router ready");

    let network = match FlexNetwork::load(&network_path) {
        Ok(network) => network,
        Err(e) => {
            error!(path = %network_path.display(), error = %e, "failed to load network");
            return ExitCode::FAILURE;
        }
    };

    let summary = network.summary();
    println!("Loaded {} stops", network.stops().len());
    println!(
        "Classified {} of {} trips as flex:",
        summary.classified(),
        summary.inspected
    );
    for (kind, count) in [
        (FlexTripKind::Unscheduled, summary.unscheduled),
        (FlexTripKind::ScheduledDeviated, summary.scheduled_deviated),
        (FlexTripKind::ContinuousPickupDropOff, summary.continuous),
    ] {
        println!("  {:<20} {}", kind.as_str(), count);
    }
    println!("  {:<20} {}", "not flex", summary.skipped());
    println!(
        "Loaded {} fixed-schedule patterns",
        network.patterns().len()
    );

    ExitCode::SUCCESS
}
