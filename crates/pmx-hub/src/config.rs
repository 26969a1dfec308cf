use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DB_PATH: &str = "db/cjn-dakota.db";
pub const DEFAULT_LOG_DIR: &str = ".pmx/logs";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: String,
    pub db_path: PathBuf,
    pub debug: bool,
    pub seed: bool,
    pub log_dir: String,
}

#[derive(Parser, Debug)]
#[command(name = "pmx-hub", about = "Priority matrix checklist service")]
pub struct Args {
    #[arg(long, default_value = "")]
    pub addr: String,
    #[arg(long, default_value = "")]
    pub db: String,
    #[arg(long, default_value_t = false)]
    pub debug: bool,
    /// Skip seeding an empty store at startup.
    #[arg(long, default_value_t = false)]
    pub no_seed: bool,
    #[arg(long, default_value = "")]
    pub log_dir: String,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        Self {
            addr: resolve_addr(&args.addr),
            db_path: resolve_db_path(&args.db),
            debug: args.debug || env_true("PMX_HUB_DEBUG"),
            seed: !args.no_seed,
            log_dir: resolve_log_dir(&args.log_dir),
        }
    }
}

pub fn load_config() -> Config {
    Config::from_args(Args::parse())
}

pub fn env_true(key: &str) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

fn flag_or_env(flag: &str, key: &str) -> Option<String> {
    if !flag.trim().is_empty() {
        return Some(flag.to_string());
    }
    if let Ok(value) = std::env::var(key) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }
    None
}

pub fn resolve_addr(addr_flag: &str) -> String {
    flag_or_env(addr_flag, "PMX_HUB_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

pub fn resolve_db_path(db_flag: &str) -> PathBuf {
    PathBuf::from(flag_or_env(db_flag, "PMX_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()))
}

pub fn resolve_log_dir(log_dir_flag: &str) -> String {
    flag_or_env(log_dir_flag, "PMX_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())
}
