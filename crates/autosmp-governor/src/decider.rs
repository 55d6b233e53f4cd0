//! Sampler/Decider — the per-tick hotplug decision.
//!
//! Each tick samples the clock rate of every online core, classifies the
//! system as HIGH, LOW or NEUTRAL against thresholds derived from core 0's
//! maximum rate, and emits at most one hotplug action once the class has
//! held for enough consecutive ticks.
//!
//! ```text
//! up_rate   = max_rate(core0) * up_threshold_pct   / 100
//! down_rate = max_rate(core0) * down_threshold_pct / 100
//!
//! HIGH:    slowest online rate (core 0 included) > up_rate
//! LOW:     a non-primary core is online and the fastest of them < down_rate
//! NEUTRAL: otherwise
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use autosmp_core::{
    CoreId, Decision, FrequencyOracle, LoadClass, PlatformResult, Rate, TunableSnapshot,
    PRIMARY_CORE,
};

/// Clock rates observed across the online set during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Maximum rate of the primary core.
    pub max_rate: Rate,
    /// Lowest rate among the online cores, core 0 included.
    pub slowest_rate: Rate,
    /// The slowest non-primary online core, if any.
    pub slowest_core: Option<CoreId>,
    /// Highest rate among the non-primary online cores, if any.
    pub fastest_rate: Option<Rate>,
    pub online_count: u32,
}

/// Query the oracle across `online` (ascending) and build a `Sample`.
///
/// Ties for the slowest core keep the lowest-numbered one.
pub fn sample(oracle: &dyn FrequencyOracle, online: &BTreeSet<CoreId>) -> PlatformResult<Sample> {
    let max_rate = oracle.max_rate(PRIMARY_CORE)?;
    let primary_rate = oracle.rate(PRIMARY_CORE)?;

    let mut slowest: Option<(CoreId, Rate)> = None;
    let mut fastest_rate: Option<Rate> = None;

    for &core in online.iter().filter(|&&c| c != PRIMARY_CORE) {
        let rate = oracle.rate(core)?;
        if slowest.is_none_or(|(_, r)| rate < r) {
            slowest = Some((core, rate));
        }
        fastest_rate = Some(fastest_rate.map_or(rate, |f| f.max(rate)));
    }

    let slowest_rate = match slowest {
        Some((_, rate)) => rate.min(primary_rate),
        None => primary_rate,
    };

    Ok(Sample {
        max_rate,
        slowest_rate,
        slowest_core: slowest.map(|(core, _)| core),
        fastest_rate,
        online_count: online.len() as u32,
    })
}

fn pct_of(rate: Rate, pct: u32) -> Rate {
    rate.saturating_mul(pct as Rate) / 100
}

/// Classify a sample against the configured thresholds.
pub fn classify(sample: &Sample, params: &TunableSnapshot) -> LoadClass {
    let up_rate = pct_of(sample.max_rate, params.up_threshold_pct);
    let down_rate = pct_of(sample.max_rate, params.down_threshold_pct);

    if sample.slowest_rate > up_rate {
        return LoadClass::High;
    }
    match (sample.slowest_core, sample.fastest_rate) {
        (Some(_), Some(fastest)) if fastest < down_rate => LoadClass::Low,
        _ => LoadClass::Neutral,
    }
}

/// Hysteresis state carried from tick to tick.
#[derive(Debug, Default)]
pub struct Decider {
    last_class: Option<LoadClass>,
    /// Consecutive ticks observed in `last_class` since the last action.
    cycles: u32,
}

impl Decider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_class(&self) -> Option<LoadClass> {
        self.last_class
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Forget all hysteresis. Used on lifecycle transitions.
    pub fn reset(&mut self) {
        self.last_class = None;
        self.cycles = 0;
    }

    /// Record the tick's class and advance the cycle counter.
    fn observe(&mut self, class: LoadClass) {
        if self.last_class == Some(class) {
            self.cycles = self.cycles.saturating_add(1);
        } else {
            self.last_class = Some(class);
            self.cycles = 1;
        }
    }

    /// Run the decision for one tick.
    ///
    /// `present` is used to pick the core to bring online: the
    /// lowest-numbered present core missing from `online`.
    pub fn decide(
        &mut self,
        sample: &Sample,
        online: &BTreeSet<CoreId>,
        present: &BTreeSet<CoreId>,
        params: &TunableSnapshot,
    ) -> Decision {
        let class = classify(sample, params);
        self.observe(class);

        let decision = match class {
            LoadClass::High
                if sample.online_count < params.max_cores
                    && self.cycles >= params.cycles_up =>
            {
                present
                    .iter()
                    .copied()
                    .find(|core| !online.contains(core))
                    .map_or(Decision::NoChange, Decision::Online)
            }
            LoadClass::Low
                if sample.online_count > params.min_cores
                    && self.cycles >= params.cycles_down =>
            {
                sample
                    .slowest_core
                    .map_or(Decision::NoChange, Decision::Offline)
            }
            _ => Decision::NoChange,
        };

        if decision != Decision::NoChange {
            self.cycles = 0;
        }

        debug!(
            %class,
            cycles = self.cycles,
            online = sample.online_count,
            slowest_rate = sample.slowest_rate,
            fastest_rate = ?sample.fastest_rate,
            max_rate = sample.max_rate,
            ?decision,
            "tick evaluated"
        );

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosmp_platform::SimPlatform;

    const MAX: Rate = 2_000_000;

    fn params() -> TunableSnapshot {
        TunableSnapshot::defaults(4)
    }

    fn set(cores: &[CoreId]) -> BTreeSet<CoreId> {
        cores.iter().copied().collect()
    }

    fn sim(online: &[CoreId], rates: &[(CoreId, Rate)]) -> SimPlatform {
        let sim = SimPlatform::new(4, MAX);
        sim.set_online(online.iter().copied());
        for &(core, rate) in rates {
            sim.set_rate(core, rate);
        }
        sim
    }

    #[test]
    fn sample_tracks_slowest_and_fastest() {
        let online = set(&[0, 1, 2, 3]);
        let sim = sim(&[0, 1, 2, 3], &[(0, 1_500_000), (1, 900), (2, 1_800_000), (3, 1_200)]);

        let s = sample(&sim, &online).unwrap();
        assert_eq!(s.max_rate, MAX);
        assert_eq!(s.slowest_core, Some(1));
        assert_eq!(s.slowest_rate, 900);
        assert_eq!(s.fastest_rate, Some(1_800_000));
        assert_eq!(s.online_count, 4);
    }

    #[test]
    fn slowest_tie_keeps_first_core() {
        let online = set(&[0, 1, 2, 3]);
        let sim = sim(&[0, 1, 2, 3], &[(0, MAX), (1, 500), (2, 500), (3, 500)]);

        let s = sample(&sim, &online).unwrap();
        assert_eq!(s.slowest_core, Some(1));
    }

    #[test]
    fn primary_lowers_floor_but_is_never_slowest_core() {
        let online = set(&[0, 1]);
        let sim = sim(&[0, 1], &[(0, 10), (1, 1_000_000)]);

        let s = sample(&sim, &online).unwrap();
        assert_eq!(s.slowest_rate, 10);
        assert_eq!(s.slowest_core, Some(1));
    }

    #[test]
    fn primary_only_has_no_candidates() {
        let online = set(&[0]);
        let sim = sim(&[0], &[(0, 100)]);

        let s = sample(&sim, &online).unwrap();
        assert_eq!(s.slowest_core, None);
        assert_eq!(s.fastest_rate, None);
        assert_eq!(s.slowest_rate, 100);
    }

    #[test]
    fn sample_propagates_oracle_failure() {
        let sim = sim(&[0, 1], &[]);
        sim.set_oracle_down(true);
        assert!(sample(&sim, &set(&[0, 1])).is_err());
    }

    fn sample_of(slowest_rate: Rate, slowest_core: Option<CoreId>, fastest: Option<Rate>, online: u32) -> Sample {
        Sample {
            max_rate: MAX,
            slowest_rate,
            slowest_core,
            fastest_rate: fastest,
            online_count: online,
        }
    }

    #[test]
    fn classify_high_low_neutral() {
        let p = params();
        // 90% of 2 GHz is 1.8 GHz; 60% is 1.2 GHz.
        assert_eq!(classify(&sample_of(1_800_001, Some(1), Some(MAX), 2), &p), LoadClass::High);
        assert_eq!(classify(&sample_of(1_800_000, Some(1), Some(MAX), 2), &p), LoadClass::Neutral);
        assert_eq!(classify(&sample_of(100, Some(1), Some(1_199_999), 2), &p), LoadClass::Low);
        assert_eq!(classify(&sample_of(100, Some(1), Some(1_200_000), 2), &p), LoadClass::Neutral);
    }

    #[test]
    fn single_core_is_never_low() {
        let p = params();
        assert_eq!(classify(&sample_of(0, None, None, 1), &p), LoadClass::Neutral);
    }

    #[test]
    fn high_onlines_lowest_offline_core() {
        let mut d = Decider::new();
        let online = set(&[0, 2]);
        let present = set(&[0, 1, 2, 3]);
        let s = sample_of(MAX, Some(2), Some(MAX), 2);

        assert_eq!(d.decide(&s, &online, &present, &params()), Decision::Online(1));
        assert_eq!(d.cycles(), 0);
        assert_eq!(d.last_class(), Some(LoadClass::High));
    }

    #[test]
    fn high_respects_max_cores() {
        let mut d = Decider::new();
        let mut p = params();
        p.max_cores = 2;
        let s = sample_of(MAX, Some(1), Some(MAX), 2);

        let decision = d.decide(&s, &set(&[0, 1]), &set(&[0, 1, 2, 3]), &p);
        assert_eq!(decision, Decision::NoChange);
        assert_eq!(d.cycles(), 1);
    }

    #[test]
    fn high_with_everything_online_is_no_change() {
        let mut d = Decider::new();
        let mut p = params();
        p.max_cores = 8;
        let s = sample_of(MAX, Some(1), Some(MAX), 4);

        let decision = d.decide(&s, &set(&[0, 1, 2, 3]), &set(&[0, 1, 2, 3]), &p);
        assert_eq!(decision, Decision::NoChange);
    }

    #[test]
    fn cycles_up_requires_consecutive_high_ticks() {
        let mut d = Decider::new();
        let mut p = params();
        p.cycles_up = 3;
        let online = set(&[0]);
        let present = set(&[0, 1, 2, 3]);
        let high = sample_of(MAX, None, None, 1);

        assert_eq!(d.decide(&high, &online, &present, &p), Decision::NoChange);
        assert_eq!(d.decide(&high, &online, &present, &p), Decision::NoChange);
        assert_eq!(d.decide(&high, &online, &present, &p), Decision::Online(1));
    }

    #[test]
    fn class_change_resets_cycles() {
        let mut d = Decider::new();
        let mut p = params();
        p.cycles_up = 2;
        let online = set(&[0, 1]);
        let present = set(&[0, 1, 2, 3]);
        let high = sample_of(MAX, Some(1), Some(MAX), 2);
        let neutral = sample_of(1_500_000, Some(1), Some(1_500_000), 2);

        assert_eq!(d.decide(&high, &online, &present, &p), Decision::NoChange);
        assert_eq!(d.decide(&neutral, &online, &present, &p), Decision::NoChange);
        assert_eq!(d.cycles(), 1);
        assert_eq!(d.decide(&high, &online, &present, &p), Decision::NoChange);
        assert_eq!(d.decide(&high, &online, &present, &p), Decision::Online(2));
    }

    #[test]
    fn cycles_down_two_low_ticks_drop_one_core() {
        let mut d = Decider::new();
        let mut p = params();
        p.cycles_down = 2;
        let online = set(&[0, 1]);
        let present = set(&[0, 1, 2, 3]);
        let low = sample_of(MAX / 2, Some(1), Some(MAX / 2), 2);

        assert_eq!(d.decide(&low, &online, &present, &p), Decision::NoChange);
        assert_eq!(d.cycles(), 1);
        assert_eq!(d.decide(&low, &online, &present, &p), Decision::Offline(1));
        assert_eq!(d.cycles(), 0);
    }

    #[test]
    fn low_respects_min_cores() {
        let mut d = Decider::new();
        let mut p = params();
        p.min_cores = 2;
        let low = sample_of(0, Some(1), Some(0), 2);

        let decision = d.decide(&low, &set(&[0, 1]), &set(&[0, 1, 2, 3]), &p);
        assert_eq!(decision, Decision::NoChange);
    }

    #[test]
    fn zero_cycles_acts_every_tick() {
        let mut d = Decider::new();
        let mut p = params();
        p.cycles_up = 0;
        let high = sample_of(MAX, None, None, 1);

        let decision = d.decide(&high, &set(&[0]), &set(&[0, 1]), &p);
        assert_eq!(decision, Decision::Online(1));
    }

    #[test]
    fn inverted_thresholds_run_as_configured() {
        let mut d = Decider::new();
        let mut p = params();
        p.up_threshold_pct = 10;
        p.down_threshold_pct = 95;
        // Above 10% so HIGH wins before LOW is considered.
        let s = sample_of(MAX / 2, Some(1), Some(MAX / 2), 2);

        let decision = d.decide(&s, &set(&[0, 1]), &set(&[0, 1, 2, 3]), &p);
        assert_eq!(decision, Decision::Online(2));
    }

    #[test]
    fn contradictory_bounds_never_act() {
        let mut d = Decider::new();
        let mut p = params();
        p.min_cores = 4;
        p.max_cores = 1;
        let online = set(&[0, 1]);
        let present = set(&[0, 1, 2, 3]);

        let high = sample_of(MAX, Some(1), Some(MAX), 2);
        let low = sample_of(0, Some(1), Some(0), 2);
        for _ in 0..3 {
            assert_eq!(d.decide(&high, &online, &present, &p), Decision::NoChange);
            assert_eq!(d.decide(&low, &online, &present, &p), Decision::NoChange);
        }
    }
}
