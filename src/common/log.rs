use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_tree::HierarchicalLayer;
use tracing_tree::time::Uptime;

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `SPACELABEL_LOG=spacelabel=trace`.
pub const LOG_ENV: &str = "SPACELABEL_LOG";

fn subscriber() -> impl Subscriber + Send + Sync {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(
        HierarchicalLayer::default()
            .with_writer(std::io::stderr)
            .with_indent_amount(2)
            .with_indent_lines(true)
            .with_targets(true)
            .with_deferred_spans(true)
            .with_timer(Uptime::default()),
    )
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging() {
    if tracing::subscriber::set_global_default(subscriber()).is_err() {
        tracing::debug!("Logging already initialized");
    }
}
