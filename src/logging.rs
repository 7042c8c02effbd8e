use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `SCRIPTORIUM_LOG` takes priority over the verbosity flags so operators can
/// target individual modules without recompiling.
pub fn init(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SCRIPTORIUM_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
