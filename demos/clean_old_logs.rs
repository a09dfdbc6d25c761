use {
    logkeeper::{Diagnostics, FileLoggerBuilder},
    std::{
        fs,
        time::{Duration, SystemTime},
    },
};

const LOG_FOLDER: &str = "./logs/cleanup";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = FileLoggerBuilder::new(format!("{LOG_FOLDER}/app.log"))
        .retention_days(30)
        .diagnostics(Diagnostics::Stderr)
        .build()?;

    // Pretend two rotations happened: one long ago, one last week
    for (name, age_days) in [("app.01022026150405.BAK", 45), ("app.10122026090000.BAK", 7)] {
        let path = format!("{LOG_FOLDER}/{name}");
        fs::write(&path, "rotated content\n")?;
        fs::OpenOptions::new()
            .write(true)
            .open(&path)?
            .set_modified(SystemTime::now() - Duration::from_secs(age_days * 24 * 60 * 60))?;
    }

    let removed = logger.clean_old_logs();
    println!("Removed {removed} expired backup(s)");
    for entry in fs::read_dir(LOG_FOLDER)?.flatten() {
        println!("{:?}", entry.file_name());
    }

    Ok(())
}
