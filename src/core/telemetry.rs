use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

// HTTP client internals are only interesting when explicitly requested.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "reqwest=warn", "h2=warn"];

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = vec![settings.telemetry().log_level.clone()];
        directives.extend(QUIET_DEPENDENCIES.iter().map(|item| item.to_string()));
        EnvFilter::new(directives.join(","))
    });

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    let result = if settings.telemetry().json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
