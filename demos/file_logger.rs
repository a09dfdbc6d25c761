use logkeeper::{FileLogger, Level};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = FileLogger::new("./logs/logger.log")?;

    logger.info("This is an info message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");
    logger.log(Level::Debug, "Entries below the rotation threshold stay in logger.log");

    if let Err(err) = logger.check_network_path() {
        eprintln!("Log path is unreachable: {err}");
    }
    logger.close()?;

    Ok(())
}
