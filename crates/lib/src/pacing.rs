//! # Request Pacing
//!
//! The uploader pauses after every store call so a batch never bursts against
//! the service's rate limits. The policy is injected, so tests can run with
//! `NoDelay` instead of real wall-clock sleeps.

use crate::constants::DEFAULT_UPLOAD_DELAY;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;
use std::time::Duration;

/// A policy deciding how long to wait between consecutive store calls.
#[async_trait]
pub trait Pacer: Send + Sync + Debug + DynClone {
    /// Called after each attempt, whether it succeeded or not.
    async fn pause(&self);
}

dyn_clone::clone_trait_object!(Pacer);

/// Sleeps for the same interval after every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedInterval(pub Duration);

impl Default for FixedInterval {
    fn default() -> Self {
        Self(DEFAULT_UPLOAD_DELAY)
    }
}

#[async_trait]
impl Pacer for FixedInterval {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Never waits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_fixed_interval_waits_at_least_its_interval() {
        let pacer = FixedInterval(Duration::from_millis(30));
        let started = Instant::now();
        pacer.pause().await;
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(FixedInterval::default().0, Duration::from_millis(500));
    }
}
