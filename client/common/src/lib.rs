use std::{
    env,
    fs,
    path::{Path, PathBuf},
    panic,
    str::FromStr,
    thread,
    time::{Duration, SystemTime},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub struct TracingGuards {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_tracing(app_name: &str) -> TracingGuards {
    // Stdout always; a daily file sink only when LOG_DIR is set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_ansi(false);
    let mut file_guard: Option<WorkerGuard> = None;
    let mut file_layer = None;
    let log_root = env::var("LOG_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|dir| PathBuf::from(dir).join(app_name));

    if let Some(log_root) = log_root.as_ref() {
        if fs::create_dir_all(log_root).is_ok() {
            let appender = panic::catch_unwind(|| {
                tracing_appender::rolling::daily(log_root, format!("{app_name}.log"))
            })
            .ok();

            if let Some(appender) = appender {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                file_layer = Some(fmt::layer().with_writer(writer).with_ansi(false));
                file_guard = Some(guard);
            }
        }
    }

    if let Some(layer) = file_layer {
        let subscriber = Registry::default()
            .with(filter)
            .with(stdout_layer)
            .with(layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = Registry::default().with(filter).with(stdout_layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    if let (Some(log_root), true) = (log_root, file_guard.is_some()) {
        let retention_days = env_or("LOG_RETENTION_DAYS", 14u64);
        let cleanup_interval = env_or("LOG_CLEANUP_INTERVAL_MINUTES", 360u64);
        spawn_log_cleanup(log_root, retention_days, cleanup_interval);
    }

    TracingGuards {
        _file_guard: file_guard,
    }
}

pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env_opt(key).unwrap_or(default)
}

/// Typed environment lookup; unset or unparsable values yield `None`.
pub fn env_opt<T: FromStr>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn spawn_log_cleanup(log_root: PathBuf, retention_days: u64, cleanup_interval_minutes: u64) {
    if retention_days == 0 || cleanup_interval_minutes == 0 {
        return;
    }

    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let interval = Duration::from_secs(cleanup_interval_minutes * 60);

    thread::spawn(move || loop {
        let cutoff = SystemTime::now().checked_sub(retention);
        if let Some(cutoff) = cutoff {
            cleanup_old_logs(&log_root, cutoff);
        }
        thread::sleep(interval);
    });
}

fn cleanup_old_logs(root: &Path, cutoff: SystemTime) {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            cleanup_old_logs(&path, cutoff);
            continue;
        }
        let modified = match fs::metadata(&path).and_then(|metadata| metadata.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        if modified < cutoff {
            let _ = fs::remove_file(&path);
        }
    }
}

pub async fn shutdown_signal() {
    // Handle ctrl-c and SIGTERM so loops can stop cleanly.
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "sigterm handler unavailable");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_garbage() {
        assert_eq!(env_or("BOOKSHELF_TEST_UNSET_KEY", 42u64), 42);
        env::set_var("BOOKSHELF_TEST_GARBAGE_KEY", "not-a-number");
        assert_eq!(env_or("BOOKSHELF_TEST_GARBAGE_KEY", 7u32), 7);
        env::set_var("BOOKSHELF_TEST_PADDED_KEY", " 15 ");
        assert_eq!(env_opt::<u32>("BOOKSHELF_TEST_PADDED_KEY"), Some(15));
    }

    #[test]
    fn cleanup_removes_only_files_older_than_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a.log"), "a").unwrap();
        fs::write(nested.join("b.log"), "b").unwrap();

        cleanup_old_logs(dir.path(), SystemTime::UNIX_EPOCH);
        assert!(dir.path().join("a.log").exists());

        let future = SystemTime::now() + Duration::from_secs(3600);
        cleanup_old_logs(dir.path(), future);
        assert!(!dir.path().join("a.log").exists());
        assert!(!nested.join("b.log").exists());
    }
}
