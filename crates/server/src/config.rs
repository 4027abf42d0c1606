//! Server configuration read from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variables:
/// - `SURVIVAL_DATA_DIR` - Directory holding `config.toml` and `items.ron` (default: `data`)
/// - `SURVIVAL_TICK_MS` - Simulation step of the scripted match (default: 50)
/// - `SURVIVAL_SUMMARY` - Print the final world summary as JSON (default: true)
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub tick: Duration,
    pub print_summary: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tick: Duration::from_millis(50),
            print_summary: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("SURVIVAL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(tick) = read_env::<u64>("SURVIVAL_TICK_MS") {
            config.tick = Duration::from_millis(tick.max(1));
        }
        if let Some(summary) = read_env::<bool>("SURVIVAL_SUMMARY") {
            config.print_summary = summary;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
