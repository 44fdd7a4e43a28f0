//! Screenshot throttling for protected viewing.
//!
//! Students may take a limited number of screenshots of a content item per
//! time window (3 per 15 minutes by default). Attempts are stored by an
//! external [`ScreenshotLog`]; [`ScreenshotPolicy`] makes the decision.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use coursevault_store::ContentId;

use crate::config::VaultConfig;
use crate::error::Result;

/// Identifier of a portal user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Timestamped record of screenshot attempts.
pub trait ScreenshotLog: Send + Sync {
    /// Times of attempts by `user` on `content` at or after `since`.
    fn attempts_since(
        &self,
        user: UserId,
        content: ContentId,
        since: SystemTime,
    ) -> Result<Vec<SystemTime>>;

    /// Record an attempt.
    fn record(&self, user: UserId, content: ContentId, at: SystemTime) -> Result<()>;
}

/// In-memory screenshot log.
#[derive(Debug, Default)]
pub struct MemoryScreenshotLog {
    attempts: Mutex<HashMap<(UserId, ContentId), Vec<SystemTime>>>,
}

impl MemoryScreenshotLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScreenshotLog for MemoryScreenshotLog {
    fn attempts_since(
        &self,
        user: UserId,
        content: ContentId,
        since: SystemTime,
    ) -> Result<Vec<SystemTime>> {
        let attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(attempts
            .get(&(user, content))
            .map(|times| times.iter().copied().filter(|t| *t >= since).collect())
            .unwrap_or_default())
    }

    fn record(&self, user: UserId, content: ContentId, at: SystemTime) -> Result<()> {
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        attempts.entry((user, content)).or_default().push(at);
        Ok(())
    }
}

/// Outcome of a screenshot attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotDecision {
    /// Recorded; `remaining` more are allowed in the current window.
    Allowed { remaining: u32 },
    /// Limit reached; the oldest attempt leaves the window after `retry_after`.
    Denied { retry_after: Duration },
}

impl ScreenshotDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ScreenshotDecision::Allowed { .. })
    }

    /// Message for the viewer.
    pub fn message(&self) -> String {
        match self {
            ScreenshotDecision::Allowed { remaining } => format!(
                "Screenshot taken. You have {} screenshot{} remaining in this period.",
                remaining,
                if *remaining == 1 { "" } else { "s" }
            ),
            ScreenshotDecision::Denied { retry_after } => format!(
                "Screenshot limit reached. Please try again in {} minute(s).",
                retry_after.as_secs().div_ceil(60).max(1)
            ),
        }
    }
}

/// Limits screenshot attempts per user and content item.
pub struct ScreenshotPolicy<L: ScreenshotLog> {
    log: L,
    limit: u32,
    window: Duration,
    // Serialises check-then-record so concurrent attempts cannot overshoot.
    gate: Mutex<()>,
}

impl<L: ScreenshotLog> ScreenshotPolicy<L> {
    /// Create a policy allowing `limit` attempts per `window`.
    pub fn new(log: L, limit: u32, window: Duration) -> Self {
        Self {
            log,
            limit,
            window,
            gate: Mutex::new(()),
        }
    }

    /// Create a policy from the vault configuration.
    pub fn from_config(config: &VaultConfig, log: L) -> Self {
        Self::new(log, config.screenshot_limit, config.screenshot_window())
    }

    /// The underlying log.
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Attempt a screenshot now.
    pub fn attempt(&self, user: UserId, content: ContentId) -> Result<ScreenshotDecision> {
        self.attempt_at(user, content, SystemTime::now())
    }

    /// Attempt a screenshot at `now`.
    pub fn attempt_at(
        &self,
        user: UserId,
        content: ContentId,
        now: SystemTime,
    ) -> Result<ScreenshotDecision> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let since = now.checked_sub(self.window).unwrap_or(UNIX_EPOCH);
        let recent = self.log.attempts_since(user, content, since)?;
        let count = recent.len() as u32;

        if count >= self.limit {
            let oldest = recent.iter().min().copied().unwrap_or(now);
            let retry_after = (oldest + self.window)
                .duration_since(now)
                .unwrap_or(Duration::ZERO);
            tracing::info!(
                user = user.0,
                content = %content,
                count,
                "screenshot denied"
            );
            return Ok(ScreenshotDecision::Denied { retry_after });
        }

        self.log.record(user, content, now)?;
        Ok(ScreenshotDecision::Allowed {
            remaining: self.limit - (count + 1),
        })
    }
}
