//! helpers for logging.
use log::*;

/// Log to stderr.
///
/// Without `verbose` only warnings and errors are shown; with it, progress messages at info level are too.  `RUST_LOG`
/// overrides either default.
///
/// If called multiple times in the same process, only applies once.
pub fn log_to_stderr(verbose: bool) {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        let default_level = if verbose { "info" } else { "warn" };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format(|buf, record| {
                use std::io::Write;

                let now = time::OffsetDateTime::now_utc();

                writeln!(
                    buf,
                    "{} {} time={} target={}",
                    record.level(),
                    record.args(),
                    now,
                    record.target()
                )
            })
            .init();
    });
}

/// Run `work`, logging how long it took under `label`.
///
/// Used around the long phases of a dictionary build (parsing, loading, indexing).
pub fn timed<T>(label: &str, work: impl FnOnce() -> T) -> T {
    let start = std::time::Instant::now();
    let ret = work();
    info!("{}: took {:.3}s", label, start.elapsed().as_secs_f64());
    ret
}
