use crate::llm::ProviderRole;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing request activity.
#[derive(Default)]
pub struct ServiceMetrics {
    minutes_generated: AtomicU64,
    questions_answered: AtomicU64,
    questions_unanswered: AtomicU64,
    backup_used: AtomicU64,
}

impl ServiceMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rendered minutes document and the endpoint that produced its text.
    pub fn record_minutes(&self, served_by: Option<ProviderRole>) {
        self.minutes_generated.fetch_add(1, Ordering::Relaxed);
        self.record_provider(served_by);
    }

    /// Record the outcome of a question.
    pub fn record_question(&self, served_by: Option<ProviderRole>) {
        match served_by {
            Some(_) => self.questions_answered.fetch_add(1, Ordering::Relaxed),
            None => self.questions_unanswered.fetch_add(1, Ordering::Relaxed),
        };
        self.record_provider(served_by);
    }

    fn record_provider(&self, served_by: Option<ProviderRole>) {
        if served_by == Some(ProviderRole::Backup) {
            self.backup_used.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            minutes_generated: self.minutes_generated.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            questions_unanswered: self.questions_unanswered.load(Ordering::Relaxed),
            backup_used: self.backup_used.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of request counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Minutes documents rendered since startup.
    pub minutes_generated: u64,
    /// Questions that received an answer.
    pub questions_answered: u64,
    /// Questions for which every provider failed.
    pub questions_unanswered: u64,
    /// Calls served by the backup provider.
    pub backup_used: u64,
}
