use std::future::Future;
use std::time::Duration;

/// Bounded retry budget. There is no separate abort signal in this layer:
/// every polling or scanning loop runs under one of these and ends when its
/// attempts are used up.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollBudget {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Run `probe` up to `budget.max_attempts` times, sleeping `interval`
/// between attempts, until it yields a value. Strictly sequential:
/// delay-then-check, one probe in flight at a time, so polls for the same
/// handle can never overlap.
///
/// The probe receives the 1-based attempt number. Returning `None` means
/// "not yet"; the probe is expected to swallow transient errors itself.
pub async fn poll_until<T, F, Fut>(budget: PollBudget, mut probe: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=budget.max_attempts {
        if let Some(value) = probe(attempt).await {
            return Some(value);
        }
        if attempt < budget.max_attempts {
            tokio::time::sleep(budget.interval).await;
        }
    }
    None
}
