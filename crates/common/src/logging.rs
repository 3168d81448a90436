use tracing_core::{Level, LevelFilter};
use tracing_subscriber::{
    filter::Targets,
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config;

/// Dependencies whose output is capped at [`Level::WARN`] regardless of the configured level.
///
/// SQL statements and HTTP connection events would otherwise drown the
/// assignment repository lifecycle messages at `info` and `debug` levels.
const NOISY_TARGETS: [&str; 4] = ["sqlx", "sea_orm_migration", "reqwest", "hyper"];

/// Per-target filters for the configured default level.
fn targets(level: LevelFilter) -> Targets {
    NOISY_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, Level::WARN)
        })
        .with_default(level)
}

/// Install the global tracing subscriber.
pub fn init(config: &config::Logging) -> Result<(), TryInitError> {
    let format = fmt::format().with_target(false).compact();

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(targets(config.level))
        .try_init()
}

#[cfg(test)]
mod tests {
    use tracing_core::{Level, LevelFilter};

    use super::targets;

    #[test]
    fn noisy_targets_are_capped() {
        let filters = targets(LevelFilter::DEBUG);

        assert!(filters.would_enable("db::assignment_repo", &Level::DEBUG));
        assert!(!filters.would_enable("sqlx::query", &Level::INFO));
        assert!(!filters.would_enable("hyper::proto", &Level::DEBUG));
        assert!(filters.would_enable("reqwest::connect", &Level::WARN));
    }

    #[test]
    fn configured_default() {
        let filters = targets(LevelFilter::WARN);

        assert!(!filters.would_enable("db::assignment_repo", &Level::INFO));
        assert!(filters.would_enable("db::assignment_repo", &Level::ERROR));
    }
}
