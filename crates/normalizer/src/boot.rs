//! Boot — logging init, config load, rulebase compilation.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use normtail_engine::{rulebase, Context};

use crate::conf::NormalizerConfig;

/// Initialise the tracing / logging subsystem. Diagnostics go to stderr so
/// stdout stays a clean record stream.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "normtail=info,normtail_engine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load config, compile and optimize the rulebase.
pub fn boot() -> anyhow::Result<(Context, NormalizerConfig)> {
    let mut config = NormalizerConfig::load()?;
    if let Some(path) = std::env::args().nth(1) {
        config.rulebase = path;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    info!("Loading rulebase: {}", config.rulebase);
    let text = std::fs::read_to_string(&config.rulebase)?;

    let mut ctx = Context::new();
    ctx.set_debug(config.debug_graph);
    rulebase::load(&mut ctx, &text)?;
    ctx.optimize();
    info!("Compiled rulebase: {} graph nodes", ctx.node_count());

    if config.report_stats {
        eprintln!("{}", ctx.full_stats());
    }

    Ok((ctx, config))
}
