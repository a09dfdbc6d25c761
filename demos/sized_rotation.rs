use {
    logkeeper::{FileLoggerBuilder, RotationSize},
    std::time::Instant,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut logger = FileLoggerBuilder::new("./logs/sized.log")
        .max_size(RotationSize::KB(64)) // Rotate at 64KB
        .file_mode(0o640) // Set file permissions to: owner rw, group r, others none
        .build()?;

    // Simulate writing logs that will trigger size-based rotation
    for i in 1..=2000 {
        logger.info(&format!(
            "Log entry #{i}: This is a sample log message that will contribute to file size"
        ));
    }
    logger.close()?;

    println!("Done logging: {:?}", start.elapsed());
    Ok(())
}
