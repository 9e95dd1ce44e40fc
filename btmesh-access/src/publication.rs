//! C6 — Publication Engine.
//!
//! Grounded on `access.c`'s `bt_mesh_model_pub_period_get`, `next_period`,
//! `publish_sent`/`publish_start`/`publish_transmit`/`pub_period_start`,
//! `pub_delay_get`/`pub_delay_schedule`, and `mod_publish`. The original
//! drives this off `k_work_delayable`; here `PublicationEngine::tick` is a
//! plain function the integrator calls from whatever work-queue or
//! executor they use, matching §5's single-threaded cooperative model
//! (nothing in this state machine itself suspends, so no `async` is
//! needed).

use crate::clock::{Clock, Rng, Transport};
use crate::config::{RANDOM_DELAY_BASE_MS, RANDOM_DELAY_LONG_MS, RANDOM_DELAY_SHORT_MS};
use crate::error::AccessError;
use crate::log_macros::{error, warn};
use btmesh_common::address::{Address, UnicastAddress};
use embassy_time::Instant;
use heapless::Vec;

pub const MAX_SDU: usize = crate::config::MAX_SDU;
const MIC_LEN: usize = crate::config::MIC_LEN;

/// §3: base period unit selected by the period byte's bits 6–7.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PeriodUnit {
    Ms100,
    Sec1,
    Sec10,
    Min10,
}

impl PeriodUnit {
    fn millis(&self) -> u32 {
        match self {
            Self::Ms100 => 100,
            Self::Sec1 => 1_000,
            Self::Sec10 => 10_000,
            Self::Min10 => 600_000,
        }
    }
}

/// The publication period byte: base steps in the 6 LSBs, unit in bits
/// 6–7. **Deliberately not the teacher's `btmesh_models::PublishPeriod`**
/// — that struct puts steps in bits 2–7 and resolution in bits 0–1, the
/// opposite of this spec's (and the original Zephyr source's) layout. See
/// `DESIGN.md` for the divergence.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct PublishPeriod(pub u8);

impl PublishPeriod {
    pub fn new(steps: u8, unit: PeriodUnit) -> Self {
        let unit_bits = match unit {
            PeriodUnit::Ms100 => 0,
            PeriodUnit::Sec1 => 1,
            PeriodUnit::Sec10 => 2,
            PeriodUnit::Min10 => 3,
        };
        Self(((unit_bits & 0b11) << 6) | (steps & 0b0011_1111))
    }

    pub fn steps(&self) -> u8 {
        self.0 & 0b0011_1111
    }

    pub fn unit(&self) -> PeriodUnit {
        match (self.0 >> 6) & 0b11 {
            0 => PeriodUnit::Ms100,
            1 => PeriodUnit::Sec1,
            2 => PeriodUnit::Sec10,
            _ => PeriodUnit::Min10,
        }
    }

    /// Base period in milliseconds; `0` means publication is disabled.
    pub fn base_millis(&self) -> u32 {
        self.steps() as u32 * self.unit().millis()
    }
}

/// The retransmit byte: count in the 3 LSBs, interval steps in the 5 MSBs;
/// `interval_ms = (steps + 1) * 50`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct PublishRetransmit(pub u8);

impl PublishRetransmit {
    pub fn new(count: u8, interval_steps: u8) -> Self {
        Self(((interval_steps & 0b1_1111) << 3) | (count & 0b111))
    }

    pub fn count(&self) -> u8 {
        self.0 & 0b111
    }

    pub fn interval_steps(&self) -> u8 {
        (self.0 >> 3) & 0b1_1111
    }

    pub fn interval_millis(&self) -> u32 {
        (self.interval_steps() as u32 + 1) * 50
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PublicationMessageState {
    Idle,
    ArmedPeriod,
    Delayed,
    Transmitting,
    Retransmitting,
}

pub struct PublicationState {
    pub dst: Address,
    pub app_idx: u16,
    pub friendship_cred: bool,
    pub ttl: u8,
    pub period: PublishPeriod,
    pub retransmit: PublishRetransmit,
    pub period_div: u8,
    pub fast_period: bool,
    pub delayable: bool,
    pub message: Vec<u8, MAX_SDU>,
    pub remaining_count: u8,
    pub period_start: Option<Instant>,
    pub state: PublicationMessageState,
    /// Virtual-address-store label index for `dst`, populated only when
    /// `dst` is a virtual address — needed to disambiguate the `/pub`
    /// record's `uuidx` field (§4.7) since distinct label UUIDs can hash to
    /// the same 16-bit virtual address.
    pub label_idx: Option<u16>,
}

impl Default for PublicationState {
    fn default() -> Self {
        Self {
            dst: Address::Unassigned,
            app_idx: 0,
            friendship_cred: false,
            ttl: 0,
            period: PublishPeriod::default(),
            retransmit: PublishRetransmit::default(),
            period_div: 0,
            fast_period: false,
            delayable: false,
            message: Vec::new(),
            remaining_count: 0,
            period_start: None,
            state: PublicationMessageState::Idle,
            label_idx: None,
        }
    }
}

impl PublicationState {
    /// Effective base period after §4.6's fast-period halving, floored at
    /// 100 ms.
    fn effective_period_millis(&self) -> u32 {
        let base = self.period.base_millis();
        if base == 0 {
            return 0;
        }
        if self.fast_period {
            (base >> self.period_div).max(100)
        } else {
            base
        }
    }

    /// `next_period` — computes the delay, in milliseconds, until the next
    /// timer firing.
    fn next_period_millis(&self, now: Instant) -> u32 {
        let elapsed = self
            .period_start
            .map(|start| now.saturating_duration_since(start).as_millis() as u32)
            .unwrap_or(0);

        if self.remaining_count > 0 {
            let total_count = 1 + self.retransmit.count();
            let interval = self.retransmit.interval_millis();
            let candidate = interval.saturating_mul(total_count as u32);
            if candidate > 0 && elapsed >= candidate {
                warn!("publication retransmit overrun; sacrificing next period");
                return interval;
            }
            return interval;
        }

        let period = self.effective_period_millis();
        if period == 0 {
            return 0;
        }
        if elapsed >= period {
            1
        } else {
            period - elapsed
        }
    }
}

/// `pub_delay_get` — uniform random delay `20 + rand() mod window`, short
/// window spanning 30 ms, long window spanning 480 ms.
fn delay_get(rng: &mut impl Rng, long: bool) -> u32 {
    let window = if long { RANDOM_DELAY_LONG_MS } else { RANDOM_DELAY_SHORT_MS };
    RANDOM_DELAY_BASE_MS + rng.next_u32() % window
}

/// Error surfaced by a publication model's update callback.
pub struct UpdateError;

pub struct PublicationEngine;

impl PublicationEngine {
    /// `bt_mesh_model_publish` — validates the address, message, and
    /// `len + MIC <= MAX_SDU`; initializes the retransmit counter and
    /// period-start timestamp; schedules the first send immediately or,
    /// if delayable, after a uniform long-window random delay.
    ///
    /// Per Open Question (b): calling `publish` while a series is already
    /// in progress overwrites the counter and abandons the prior series —
    /// this is intentional and preserved here.
    pub fn publish(
        pub_state: &mut PublicationState,
        message: &[u8],
        clock: &impl Clock,
        rng: &mut impl Rng,
    ) -> Result<u32, AccessError> {
        if pub_state.dst == Address::Unassigned {
            return Err(AccessError::AddressUnassigned);
        }
        if message.is_empty() {
            return Err(AccessError::InvalidArgument);
        }
        if message.len() + MIC_LEN > MAX_SDU {
            return Err(AccessError::MessageTooLarge);
        }

        pub_state.message.clear();
        pub_state.message.extend_from_slice(message).map_err(|_| AccessError::NoBuffer)?;
        pub_state.remaining_count = 1 + pub_state.retransmit.count();
        pub_state.period_start = Some(clock.now());

        let delay = if pub_state.delayable {
            pub_state.state = PublicationMessageState::Delayed;
            delay_get(rng, true)
        } else {
            pub_state.state = PublicationMessageState::Transmitting;
            0
        };
        Ok(delay)
    }

    /// The publication timer body (`mod_publish`). `suspended` models the
    /// global unprovision/suspend flag the original checks at the top of
    /// the callback — a no-op when set. `update` is the model's publish
    /// update callback (rebuild the outbound message for this period);
    /// returning `Err` skips this period but leaves the timer armed for
    /// the next one, per §7's policy on publication update-callback
    /// errors.
    ///
    /// Returns `Some(delay_ms)` for the next firing, or `None` if the
    /// model should stay idle (unassigned address, suspended, or
    /// `period == 0` with no retransmission in progress).
    pub fn tick(
        pub_state: &mut PublicationState,
        elem_addr: UnicastAddress,
        suspended: bool,
        clock: &impl Clock,
        rng: &mut impl Rng,
        transport: &mut impl Transport,
        mut update: impl FnMut(&mut Vec<u8, MAX_SDU>) -> Result<(), UpdateError>,
    ) -> Option<u32> {
        if pub_state.dst == Address::Unassigned || suspended {
            pub_state.state = PublicationMessageState::Idle;
            return None;
        }

        if pub_state.remaining_count > 0 {
            pub_state.remaining_count -= 1;
            pub_state.state = PublicationMessageState::Retransmitting;
        } else {
            pub_state.period_start = Some(clock.now());
            if update(&mut pub_state.message).is_err() {
                warn!("publish update callback failed; skipping this period");
                let next = pub_state.next_period_millis(clock.now());
                return if next == 0 { None } else { Some(next) };
            }
            // This transmission accounts for one of the `count() + 1`
            // total sends; `remaining_count` tracks what's left after it.
            pub_state.remaining_count = pub_state.retransmit.count();
            pub_state.state = PublicationMessageState::Transmitting;

            if pub_state.delayable {
                // Delay this send by a short random window; restore the
                // count this tick implicitly consumed so the retransmit
                // series on the next firing still totals `count() + 1`.
                pub_state.remaining_count += 1;
                return Some(delay_get(rng, false));
            }
        }

        let send_result = transport.send(elem_addr, &pub_state.message);
        if let Err(e) = send_result {
            error!("publication send failed: {:?}", e);
        }

        let next = pub_state.next_period_millis(clock.now());
        if next == 0 {
            pub_state.state = PublicationMessageState::Idle;
            None
        } else {
            pub_state.state = if pub_state.remaining_count > 0 {
                PublicationMessageState::Retransmitting
            } else {
                PublicationMessageState::ArmedPeriod
            };
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::{TestClock, TestRng};

    struct NullTransport;
    impl Transport for NullTransport {
        fn send(&mut self, _src: UnicastAddress, _sdu: &[u8]) -> Result<(), AccessError> {
            Ok(())
        }
    }

    #[test]
    fn period_byte_layout_matches_spec() {
        // unit=1s, steps=1 -> 1000 ms (scenario 4).
        let period = PublishPeriod(0x41);
        assert_eq!(period.unit(), PeriodUnit::Sec1);
        assert_eq!(period.steps(), 1);
        assert_eq!(period.base_millis(), 1000);
    }

    #[test]
    fn retransmit_byte_layout_matches_spec() {
        // count=2, steps=5 -> interval 300 ms (scenario 4).
        let retransmit = PublishRetransmit(0x2A);
        assert_eq!(retransmit.count(), 2);
        assert_eq!(retransmit.interval_steps(), 5);
        assert_eq!(retransmit.interval_millis(), 300);
    }

    #[test]
    fn fast_period_floors_at_100ms() {
        let mut pub_state = PublicationState {
            period: PublishPeriod::new(60, PeriodUnit::Sec1),
            fast_period: true,
            period_div: 10,
            ..Default::default()
        };
        pub_state.period_start = Some(Instant::from_millis(0));
        assert_eq!(pub_state.effective_period_millis(), 100);
    }

    #[test]
    fn publish_rejects_unassigned_address() {
        let mut pub_state = PublicationState::default();
        let clock = TestClock::new();
        let mut rng = TestRng(1);
        let err = PublicationEngine::publish(&mut pub_state, &[1, 2, 3], &clock, &mut rng).unwrap_err();
        assert_eq!(err, AccessError::AddressUnassigned);
    }

    #[test]
    fn publish_rejects_oversized_message() {
        let mut pub_state = PublicationState {
            dst: Address::Unicast(UnicastAddress::new(0x0001).unwrap()),
            ..Default::default()
        };
        let clock = TestClock::new();
        let mut rng = TestRng(1);
        let big = [0u8; MAX_SDU];
        let err = PublicationEngine::publish(&mut pub_state, &big, &clock, &mut rng).unwrap_err();
        assert_eq!(err, AccessError::MessageTooLarge);
    }

    // Scenario 4: period=1000ms, retransmit count=2/interval=300ms ->
    // sends at t=0,300,600 (3 total), next period near t=1000.
    #[test]
    fn retransmission_schedule_matches_scenario() {
        let dst = Address::Unicast(UnicastAddress::new(0x0001).unwrap());
        let mut pub_state = PublicationState {
            dst,
            period: PublishPeriod::new(1, PeriodUnit::Sec1),
            retransmit: PublishRetransmit::new(2, 5),
            ..Default::default()
        };
        let clock = TestClock::new();
        let mut rng = TestRng(7);
        let mut transport = NullTransport;
        let elem_addr = UnicastAddress::new(0x0001).unwrap();

        let delay = PublicationEngine::publish(&mut pub_state, &[1, 2, 3], &clock, &mut rng).unwrap();
        assert_eq!(delay, 0);

        // t=0: first send, remaining_count becomes 2 after decrement inside tick.
        let next = PublicationEngine::tick(&mut pub_state, elem_addr, false, &clock, &mut rng, &mut transport, |_| Ok(())).unwrap();
        assert_eq!(next, 300);
        assert_eq!(pub_state.remaining_count, 2);

        clock.advance(300);
        let next = PublicationEngine::tick(&mut pub_state, elem_addr, false, &clock, &mut rng, &mut transport, |_| Ok(())).unwrap();
        assert_eq!(next, 300);
        assert_eq!(pub_state.remaining_count, 1);

        clock.advance(300);
        let next = PublicationEngine::tick(&mut pub_state, elem_addr, false, &clock, &mut rng, &mut transport, |_| Ok(())).unwrap();
        assert_eq!(pub_state.remaining_count, 0);
        assert!(next > 0);
    }

    #[test]
    fn suspend_idles_without_clearing_state() {
        let mut pub_state = PublicationState {
            dst: Address::Unicast(UnicastAddress::new(0x0001).unwrap()),
            ..Default::default()
        };
        let clock = TestClock::new();
        let mut rng = TestRng(1);
        let mut transport = NullTransport;
        let elem_addr = UnicastAddress::new(0x0001).unwrap();
        let next = PublicationEngine::tick(&mut pub_state, elem_addr, true, &clock, &mut rng, &mut transport, |_| Ok(()));
        assert_eq!(next, None);
        assert_eq!(pub_state.state, PublicationMessageState::Idle);
        assert_eq!(pub_state.dst, Address::Unicast(UnicastAddress::new(0x0001).unwrap()));
    }
}
