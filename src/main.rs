use anyhow::Result;
use site_sentry::app::App;
use site_sentry::cli;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    // Process CLI arguments first (one-shot subcommands exit here)
    let runtime_options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // CLI --log-level flag takes highest precedence, then RUST_LOG, then config (applied later).
    site_sentry::debug::init_log_bridge(runtime_options.log_level);

    log::info!("Starting site-sentry {}", site_sentry::VERSION);

    // Timers, the navigation feed and signal handling run on this runtime
    let runtime = Arc::new(Runtime::new()?);

    let app = App::new(Arc::clone(&runtime), runtime_options)?;
    let result = app.run();

    log::info!("Host exited, shutting down runtime");
    if let Ok(rt) = Arc::try_unwrap(runtime) {
        // The stdin reader may still be blocked; don't wait on it forever.
        rt.shutdown_timeout(std::time::Duration::from_secs(2));
    }

    if let Err(ref e) = result {
        eprintln!("site-sentry: error: {e:#}");
    }
    result
}
