//! Sync progress reporting.
//!
//! Reports per-record progress during `folio sync` so users see which
//! essay is being translated and whether it came from the cache. Progress
//! is emitted on **stderr** so the stdout summary stays parseable for
//! scripts.

use std::io::Write;

/// A single progress event for sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncProgressEvent {
    /// Reading a corpus (directory scan or remote query). Total unknown.
    Discovering { corpus: String },
    /// Essay `n` of `total` has been translated or served from cache.
    Translating {
        n: usize,
        total: usize,
        title: String,
        cached: bool,
    },
}

/// Reports sync progress.
pub trait SyncProgressReporter: Send + Sync {
    fn report(&self, event: SyncProgressEvent);
}

/// Human-friendly progress on stderr: `  [3/12] 京都 (cached)`.
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = format_event(&event);
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

fn format_event(event: &SyncProgressEvent) -> String {
    match event {
        SyncProgressEvent::Discovering { corpus } => format!("sync {}  discovering...\n", corpus),
        SyncProgressEvent::Translating {
            n,
            total,
            title,
            cached,
        } => {
            let state = if *cached { "cached" } else { "translated" };
            format!("  [{}/{}] {} ({})\n", n, total, title, state)
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}

/// Progress mode for the CLI.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translating_line() {
        let line = format_event(&SyncProgressEvent::Translating {
            n: 3,
            total: 12,
            title: "京都".into(),
            cached: true,
        });
        assert_eq!(line, "  [3/12] 京都 (cached)\n");

        let line = format_event(&SyncProgressEvent::Translating {
            n: 1,
            total: 1,
            title: "t".into(),
            cached: false,
        });
        assert_eq!(line, "  [1/1] t (translated)\n");
    }

    #[test]
    fn discovering_line() {
        let line = format_event(&SyncProgressEvent::Discovering {
            corpus: "essays".into(),
        });
        assert_eq!(line, "sync essays  discovering...\n");
    }
}
