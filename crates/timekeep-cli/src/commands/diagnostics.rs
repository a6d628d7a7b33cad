use timekeep_core::{Config, HttpSessionOwner, SessionOwner};

/// Probe the configured session owner.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let owner = HttpSessionOwner::from_config(&config.owner)?;

    let started = std::time::Instant::now();
    owner.ping()?;
    println!(
        "pong from {} ({} ms)",
        config.owner.base_url,
        started.elapsed().as_millis()
    );
    Ok(())
}
