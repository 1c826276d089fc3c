//! Sweep lease — Redis-backed best-effort single-sweeper guard.
//!
//! Before each sweep period the worker takes a short lease so that, with
//! several worker replicas deployed, only one of them runs the sweep. The
//! lease is advisory, not a lock: if Redis is unavailable the sweep proceeds
//! anyway, because a duplicated delivery attempt is acceptable under the
//! at-least-once contract while a silently stopped sweeper is not.
//!
//! Uses Redis `SET NX EX` for atomic check-and-set with automatic TTL expiry.

use redis::aio::ConnectionManager;

const LEASE_KEY: &str = "herald:sweep:lease";

/// Redis-backed sweep lease.
pub struct SweepLease {
    ttl_secs: u64,
}

impl SweepLease {
    /// `ttl_secs` should expire just before the next sweep tick so a healthy
    /// worker can re-acquire its own lease every period.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs: ttl_secs.max(1),
        }
    }

    /// Try to take the lease for this sweep period.
    ///
    /// Returns `true` when this worker should run the sweep:
    /// - the key was set (no other worker holds the lease), or
    /// - Redis errored (fail-open).
    pub async fn try_acquire(&self, redis: &mut ConnectionManager, owner: &str) -> bool {
        // SET key owner NX EX ttl
        // Some("OK") → lease acquired; None → held by another worker.
        let result: Result<Option<String>, redis::RedisError> = redis::cmd("SET")
            .arg(LEASE_KEY)
            .arg(owner)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(redis)
            .await;

        match result {
            Ok(reply) => {
                let acquired = reply.is_some();
                if !acquired {
                    tracing::debug!("Sweep lease held elsewhere, skipping this period");
                }
                acquired
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sweep lease check failed, proceeding without it");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_never_zero() {
        let lease = SweepLease::new(0);
        assert_eq!(lease.ttl_secs, 1);

        let lease = SweepLease::new(59);
        assert_eq!(lease.ttl_secs, 59);
    }
}
