use logkeeper::{debug, error, info, ConsoleLogger};

fn main() {
    let logger = ConsoleLogger::new();

    info!(logger, "System startup on port {}", 8080);
    debug!(logger, "Loaded {} configuration entries", 12);
    error!(logger, "Upstream {} did not answer", "billing");

    // Uncomment to see the process exit with status 1:
    // logkeeper::fatal!(logger, "Cannot continue without {}", "a database");
}
