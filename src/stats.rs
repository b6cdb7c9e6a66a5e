use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide counters for played sessions and relayed audio.
#[derive(Default)]
pub struct SessionStats {
    pub active_sessions: AtomicU64,
    pub total_sessions: AtomicU64,
    pub aborted_sessions: AtomicU64,
    pub audio_bytes: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub active_sessions: u64,
    pub total_sessions: u64,
    pub aborted_sessions: u64,
    pub audio_bytes: u64,
}

impl SessionStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn session_started(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_finished(&self, aborted: bool) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
        if aborted {
            self.aborted_sessions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn audio_relayed(&self, bytes: u64) {
        self.audio_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            total_sessions: self.total_sessions.load(Ordering::Relaxed),
            aborted_sessions: self.aborted_sessions.load(Ordering::Relaxed),
            audio_bytes: self.audio_bytes.load(Ordering::Relaxed),
        }
    }

    pub fn log(&self) {
        let s = self.snapshot();
        tracing::info!(
            active = s.active_sessions,
            total = s.total_sessions,
            aborted = s.aborted_sessions,
            audio_mb = s.audio_bytes as f64 / 1_048_576.0,
            "session stats"
        );
    }
}
