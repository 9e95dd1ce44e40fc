//! Time and randomness collaborators for the publication engine.
//!
//! The original drives its publication timer off `k_work_delayable` and
//! `k_uptime_get_32()`. Grounded on how `btmesh-driver` already depends on
//! `embassy-time` for monotonic time, this crate borrows `embassy_time`'s
//! duration/instant types but keeps the actual "now" source behind a trait
//! so the state machine in `publication.rs` can be driven from a fake clock
//! in tests without a real timer queue.

use embassy_time::Instant;

/// A source of monotonic time for the publication engine.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// A source of randomness for the publication engine's delay windows.
pub trait Rng {
    fn next_u32(&mut self) -> u32;
}

impl<T: rand_core::RngCore> Rng for T {
    fn next_u32(&mut self) -> u32 {
        rand_core::RngCore::next_u32(self)
    }
}

/// Outbound transport used by the publication engine and the send path.
///
/// Stands in for `bt_mesh_trans_send`. The spec treats transport send as
/// synchronous from the access layer's point of view (completion reported
/// on the same cooperative queue before the next work item runs), so no
/// executor/future machinery is required here.
pub trait Transport {
    /// Send `sdu` from `src` with the given application/device key handle
    /// and destination embedded in `sdu`'s caller-supplied context.
    fn send(&mut self, src: btmesh_common::address::UnicastAddress, sdu: &[u8]) -> Result<(), crate::AccessError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use core::cell::Cell;

    pub struct TestClock(Cell<u64>);

    impl TestClock {
        pub fn new() -> Self {
            Self(Cell::new(0))
        }

        pub fn advance(&self, millis: u64) {
            self.0.set(self.0.get() + millis);
        }

        pub fn set(&self, millis: u64) {
            self.0.set(millis);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            Instant::from_millis(self.0.get())
        }
    }

    pub struct TestRng(pub u32);

    impl Rng for TestRng {
        fn next_u32(&mut self) -> u32 {
            // Deterministic linear congruential step, good enough to spread
            // values across a test's delay windows without pulling in a
            // dependency solely for test determinism.
            self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            self.0
        }
    }
}
