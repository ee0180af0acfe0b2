//! # Shell configuration.
//!
//! Provides [`Config`], the centralized settings handed to
//! [`Shell::builder`](crate::Shell::builder).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → treated as 1
//! - `removal_delay = 0` → treated as 1 (a removal is never applied in the quantum that requested it)

/// Configuration for a [`Shell`](crate::Shell).
///
/// ## Field semantics
/// - `bus_capacity`: lifecycle event ring buffer size (min 1)
/// - `removal_delay`: quanta between an unsubscribe request and its application (min 1)
///
/// ## Notes
/// All fields are public. Prefer the clamping accessors to avoid sprinkling
/// sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the lifecycle broadcast channel.
    ///
    /// Observers that lag behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Number of scheduling quanta an unsubscribe stays pending.
    ///
    /// A removal requested during quantum `n` is applied when quantum
    /// `n + removal_delay` begins.
    pub removal_delay: u64,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a removal delay clamped to a minimum of 1.
    #[inline]
    pub fn removal_delay_clamped(&self) -> u64 {
        self.removal_delay.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `removal_delay = 1` (one frame, matching the host's frame quantum)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            removal_delay: 1,
        }
    }
}
