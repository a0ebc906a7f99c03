use std::time::Duration;

use shared::domain::SETTLE_DELAY;

/// How the controller waits for a confirmed write to become readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub initial_delay: Duration,
    pub backoff_factor: u32,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2,
            max_delay: SETTLE_DELAY,
            max_attempts: 6,
        }
    }
}

impl RefreshPolicy {
    /// One read after the full settle delay.
    pub fn fixed_settle() -> Self {
        Self {
            initial_delay: SETTLE_DELAY,
            backoff_factor: 1,
            max_delay: SETTLE_DELAY,
            max_attempts: 1,
        }
    }

    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            initial_delay: Duration::ZERO,
            backoff_factor: 1,
            max_delay: Duration::ZERO,
            max_attempts,
        }
    }

    /// Delay to wait before each read attempt.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let mut next = self.initial_delay.min(self.max_delay);
        (0..self.max_attempts).map(move |_| {
            let current = next;
            next = next
                .saturating_mul(self.backoff_factor.max(1))
                .min(self.max_delay);
            current
        })
    }

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The expected state was read back.
    Visible(u64),
    /// Attempts ran out while the account still showed the old value.
    Pending { last_seen: Option<u64> },
    /// The last attempt could not read the account at all.
    Unreadable { reason: String },
}

impl RefreshOutcome {
    /// Counter value last read from the ledger, if any.
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::Visible(value) => Some(*value),
            Self::Pending { last_seen } => *last_seen,
            Self::Unreadable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_backs_off_up_to_settle_delay() {
        let delays: Vec<u64> = RefreshPolicy::default()
            .delays()
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![500, 1_000, 2_000, 4_000, 5_000, 5_000]);
    }

    #[test]
    fn fixed_settle_waits_once() {
        let policy = RefreshPolicy::fixed_settle();
        assert_eq!(policy.delays().collect::<Vec<_>>(), vec![SETTLE_DELAY]);
    }

    #[test]
    fn immediate_policy_never_sleeps() {
        let policy = RefreshPolicy::immediate(3);
        assert!(policy.delays().eq(std::iter::repeat(Duration::ZERO).take(3)));
    }

    #[test]
    fn zero_backoff_factor_is_treated_as_constant() {
        let policy = RefreshPolicy {
            initial_delay: Duration::from_millis(10),
            backoff_factor: 0,
            max_delay: Duration::from_millis(100),
            max_attempts: 3,
        };
        assert_eq!(
            policy.delays().collect::<Vec<_>>(),
            vec![Duration::from_millis(10); 3]
        );
    }
}
