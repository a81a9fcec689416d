use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins when set; otherwise our crates log at info, or debug with `-v`.
pub fn init_logger(verbose: bool) {
    let default = if verbose {
        "ledgerlens=debug,ledgerlens_core=debug,ledgerlens_ingest=debug,ledgerlens_finance=debug,warn"
    } else {
        "ledgerlens=info,ledgerlens_core=info,ledgerlens_ingest=info,ledgerlens_finance=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}
