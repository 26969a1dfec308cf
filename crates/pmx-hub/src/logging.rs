use crate::config::Config;
use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::{
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    EnvFilter,
};

/// Keeps the log file open for the life of the process.
pub struct LogGuard {
    path: Option<PathBuf>,
    _file: Option<Arc<File>>,
}

impl LogGuard {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

pub fn init_logging(config: &Config) -> Option<LogGuard> {
    let level = if config.debug {
        "debug".to_string()
    } else {
        std::env::var("PMX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (path, file) = match open_log_file(&config.log_dir, &config.addr) {
        Ok(Some((path, file))) => (Some(path), Some(Arc::new(file))),
        Ok(None) => (None, None),
        Err(err) => {
            eprintln!("log_file_error: {err}");
            (None, None)
        }
    };
    let make_writer = match &file {
        Some(file) => BoxMakeWriter::new(io::stdout.and(file.clone())),
        None => BoxMakeWriter::new(io::stdout),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return None;
    }
    Some(LogGuard { path, _file: file })
}

/// One file per listen port, so hubs sharing a log dir do not interleave.
fn log_file_name(addr: &str) -> String {
    match addr.rsplit_once(':') {
        Some((_, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            format!("pmx-hub-{port}.log")
        }
        _ => "pmx-hub.log".to_string(),
    }
}

fn open_log_file(log_dir: &str, addr: &str) -> io::Result<Option<(PathBuf, File)>> {
    if log_dir.trim().is_empty() {
        return Ok(None);
    }
    let dir = PathBuf::from(log_dir);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(log_file_name(addr));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok(Some((path, file)))
}
