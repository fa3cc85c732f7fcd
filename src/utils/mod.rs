pub mod build_info;
pub mod persistence;

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Once,
};

use dirs::home_dir;

const DEFAULT_DIR_NAME: &str = ".credit_ledger";
const CONFIG_FILE: &str = "config.json";
pub const HOME_ENV: &str = "CREDIT_LEDGER_HOME";
pub const DEFAULT_LOG_FILTER: &str = "credit_ledger=info";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
        tracing::info!("Credit Ledger tracing initialized.");
    });
}

/// Returns the application data directory, defaulting to `~/.credit_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.as_os_str().is_empty() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_setup_runs_once_for_every_entry_point() {
        crate::init();
        init_tracing("credit_ledger=debug");
        crate::init_with_filter("credit_ledger=off");
        assert!(TRACING_INIT.is_completed());
    }

    #[test]
    fn config_file_lives_in_the_data_dir() {
        let base = Path::new("/tmp/credit");
        assert_eq!(config_file_in(base), base.join("config.json"));
    }
}
