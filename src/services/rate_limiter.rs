use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindowEntry {
    pub count: u32,
    pub reset_at_epoch_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Fixed-window request counter keyed by client identity.
///
/// Windows are half-open: a request at exactly `reset_at_epoch_ms` opens a new
/// window. A client can therefore burst up to twice the ceiling across a
/// boundary. Each key's read-modify-write happens under its DashMap shard lock.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, RateWindowEntry>>,
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_requests,
            window,
            clock,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count a request from `key` and decide whether it may proceed
    pub fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.now_millis();
        let window_ms = self.window.as_millis() as u64;

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateWindowEntry {
                count: 0,
                reset_at_epoch_ms: now + window_ms,
            });

        if entry.count == 0 || now >= entry.reset_at_epoch_ms {
            *entry = RateWindowEntry {
                count: 1,
                reset_at_epoch_ms: now + window_ms,
            };
            return RateDecision::Allowed {
                remaining: self.max_requests.saturating_sub(1),
            };
        }

        if entry.count >= self.max_requests {
            return RateDecision::Limited {
                retry_after: Duration::from_millis(entry.reset_at_epoch_ms - now),
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests.saturating_sub(entry.count),
        }
    }

    /// Drop entries whose window has passed. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.reset_at_epoch_ms);
        before.saturating_sub(self.entries.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, key: &str) -> Option<RateWindowEntry> {
        self.entries.get(key).map(|e| *e)
    }
}

/// Periodically sweep expired windows until the runtime shuts down
pub fn spawn_sweeper(limiter: RateLimiter, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = limiter.sweep_expired();
            if removed > 0 {
                tracing::debug!(
                    removed,
                    remaining = limiter.tracked_keys(),
                    "Swept expired rate-limit windows"
                );
            }
        }
    })
}
