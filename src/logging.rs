use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so they never mix with prompts and tables.
/// `RUST_LOG` wins over the level picked here.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "pos_invoice=debug,info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}
