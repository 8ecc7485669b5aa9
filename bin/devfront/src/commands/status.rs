use devfront_core::config::TESTING_ENV;
use devfront_core::{Config, Paths};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("devfront status");
    println!("===============");
    println!();

    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_exists { "✓" } else { "✗ (using defaults)" }
    );

    let config = Config::load_or_default(&paths)?;
    let flags = config.runtime_flags();
    println!("Endpoint: {}", config.client.endpoint);
    println!("Timeout:  {}ms", config.client.request_timeout_ms);
    println!(
        "Testing:  {}{}",
        flags.testing,
        if std::env::var_os(TESTING_ENV).is_some() {
            format!(" (from {})", TESTING_ENV)
        } else {
            String::new()
        }
    );
    Ok(())
}
