//! Whack rules
//!
//! Two periodic triggers while playing: a one-second countdown and a spawn
//! attempt that raises a random idle slot and arms a hide for it. Whacking an
//! active slot clears it at once and cancels its hide.

use std::collections::BTreeMap;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::engine::{Rules, Step, StepCtx};
use super::session::{EndReason, GameEvent, GameTheme};
use super::timers::{Fired, TimerId, TimerRegistry};
use crate::settings::WhackTuning;

/// Timer keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhackTimer {
    Countdown,
    Spawn,
    Hide(usize),
}

/// State of one slot's deferred hide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HideHandle {
    Armed { timer: TimerId, due_ms: u64 },
    /// Parked across a pause with the stay time left
    Frozen { remaining_ms: u64 },
}

/// Deferred hide actions keyed by slot, at most one per slot
#[derive(Debug, Clone, Default)]
pub struct PendingHides {
    by_slot: BTreeMap<usize, HideHandle>,
}

impl PendingHides {
    /// Arm a hide for `slot`, replacing (and cancelling) any earlier one
    pub fn arm(&mut self, slot: usize, timers: &mut TimerRegistry<WhackTimer>, delay_ms: u64) -> TimerId {
        self.cancel(slot, timers);
        let timer = timers.arm_once(WhackTimer::Hide(slot), delay_ms);
        let due_ms = timers.now_ms() + delay_ms;
        self.by_slot.insert(slot, HideHandle::Armed { timer, due_ms });
        timer
    }

    /// Cancel the hide for `slot`; false if none was pending
    pub fn cancel(&mut self, slot: usize, timers: &mut TimerRegistry<WhackTimer>) -> bool {
        match self.by_slot.remove(&slot) {
            Some(HideHandle::Armed { timer, .. }) => {
                timers.cancel(timer);
                true
            }
            Some(HideHandle::Frozen { .. }) => true,
            None => false,
        }
    }

    /// Consume the entry for a hide that just fired. False if `id` is not the
    /// hide currently armed for `slot`.
    pub fn take_fired(&mut self, slot: usize, id: TimerId) -> bool {
        match self.by_slot.get(&slot) {
            Some(HideHandle::Armed { timer, .. }) if *timer == id => {
                self.by_slot.remove(&slot);
                true
            }
            _ => false,
        }
    }

    /// Park every armed hide with its remaining time (timers are about to be
    /// cancelled wholesale)
    pub fn freeze(&mut self, now_ms: u64) {
        for handle in self.by_slot.values_mut() {
            if let HideHandle::Armed { due_ms, .. } = *handle {
                *handle = HideHandle::Frozen {
                    remaining_ms: due_ms.saturating_sub(now_ms),
                };
            }
        }
    }

    /// Re-arm parked hides
    pub fn thaw(&mut self, timers: &mut TimerRegistry<WhackTimer>) {
        for (&slot, handle) in self.by_slot.iter_mut() {
            if let HideHandle::Frozen { remaining_ms } = *handle {
                let timer = timers.arm_once(WhackTimer::Hide(slot), remaining_ms);
                *handle = HideHandle::Armed {
                    timer,
                    due_ms: timers.now_ms() + remaining_ms,
                };
            }
        }
    }

    /// Forget every entry (the owning engine cancels the timers)
    pub fn clear(&mut self) {
        self.by_slot.clear();
    }

    pub fn len(&self) -> usize {
        self.by_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slot.is_empty()
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.by_slot.contains_key(&slot)
    }

    /// Fire time of an armed hide
    pub fn due_at(&self, slot: usize) -> Option<u64> {
        match self.by_slot.get(&slot) {
            Some(HideHandle::Armed { due_ms, .. }) => Some(*due_ms),
            _ => None,
        }
    }
}

/// Render-facing Whack state
#[derive(Debug, Clone, Serialize)]
pub struct WhackBoard {
    pub slots: Vec<bool>,
    pub time_left: u32,
    /// When each slot's hide fires, if armed
    pub hides_due_ms: Vec<Option<u64>>,
}

/// Whack rules for [`Engine`](super::engine::Engine)
#[derive(Debug, Clone)]
pub struct WhackRules {
    tuning: WhackTuning,
    slots: Vec<bool>,
    time_left: u32,
    hides: PendingHides,
}

impl WhackRules {
    pub fn new(tuning: WhackTuning) -> Self {
        let tuning = tuning.sanitized();
        Self {
            slots: vec![false; tuning.slots],
            time_left: tuning.duration_secs,
            hides: PendingHides::default(),
            tuning,
        }
    }

    pub fn slots(&self) -> &[bool] {
        &self.slots
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn pending_hides(&self) -> &PendingHides {
        &self.hides
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| **s).count()
    }

    fn countdown(&mut self) -> Step {
        if self.time_left <= 1 {
            self.time_left = 0;
            return Step::Ended(EndReason::TimeUp);
        }
        self.time_left -= 1;
        Step::Advanced
    }

    fn try_spawn(&mut self, ctx: &mut StepCtx<'_, WhackTimer>) -> Step {
        let slot = ctx.rng.random_range(0..self.slots.len());
        if self.slots[slot] {
            // Dropped, no retry this period
            log::trace!("Spawn attempt on busy slot {}", slot);
            return Step::Quiet;
        }
        self.slots[slot] = true;
        self.hides.arm(slot, ctx.timers, self.tuning.stay_ms);
        Step::Advanced
    }
}

impl Rules for WhackRules {
    type Action = usize;
    type Timer = WhackTimer;
    type Board = WhackBoard;

    fn theme(&self) -> GameTheme {
        GameTheme::Whack
    }

    fn fresh(&mut self, _rng: &mut Pcg32) {
        self.slots = vec![false; self.tuning.slots];
        self.time_left = self.tuning.duration_secs;
        self.hides.clear();
    }

    fn arm(&mut self, timers: &mut TimerRegistry<WhackTimer>) {
        timers.arm_periodic(WhackTimer::Countdown, self.tuning.countdown_ms);
        timers.arm_periodic(WhackTimer::Spawn, self.tuning.spawn_interval_ms);
        self.hides.thaw(timers);
    }

    fn suspend(&mut self, timers: &TimerRegistry<WhackTimer>) {
        self.hides.freeze(timers.now_ms());
    }

    fn clear_on_end(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = false);
        self.hides.clear();
    }

    fn on_timer(&mut self, fired: Fired<WhackTimer>, ctx: &mut StepCtx<'_, WhackTimer>) -> Step {
        match fired.key {
            WhackTimer::Countdown => self.countdown(),
            WhackTimer::Spawn => self.try_spawn(ctx),
            WhackTimer::Hide(slot) => {
                if self.hides.take_fired(slot, fired.id) {
                    self.slots[slot] = false;
                    Step::Advanced
                } else {
                    Step::Quiet
                }
            }
        }
    }

    fn on_action(&mut self, slot: usize, ctx: &mut StepCtx<'_, WhackTimer>) -> bool {
        if !self.slots.get(slot).copied().unwrap_or(false) {
            return false;
        }
        self.slots[slot] = false;
        self.hides.cancel(slot, ctx.timers);
        *ctx.score += 1;
        ctx.events.push(GameEvent::Whacked {
            slot,
            score: *ctx.score,
        });
        true
    }

    fn board(&self) -> WhackBoard {
        WhackBoard {
            slots: self.slots.clone(),
            time_left: self.time_left,
            hides_due_ms: (0..self.slots.len()).map(|i| self.hides.due_at(i)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::BestScore;
    use crate::platform::storage::MemoryStore;
    use crate::sim::engine::Engine;
    use crate::sim::session::{Intent, SessionStatus};
    use proptest::prelude::*;
    use rand::SeedableRng;

    struct Harness {
        rules: WhackRules,
        timers: TimerRegistry<WhackTimer>,
        rng: Pcg32,
        score: u32,
        events: Vec<GameEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let mut rng = Pcg32::seed_from_u64(9);
            let mut rules = WhackRules::new(WhackTuning::default());
            rules.fresh(&mut rng);
            Self {
                rules,
                timers: TimerRegistry::new(),
                rng,
                score: 0,
                events: Vec::new(),
            }
        }

        fn raise(&mut self, slot: usize) {
            self.rules.slots[slot] = true;
            self.rules.hides.arm(slot, &mut self.timers, 800);
        }

        fn run_until(&mut self, until: u64) -> Vec<Step> {
            let mut steps = Vec::new();
            while let Some(fired) = self.timers.pop_due(until) {
                let mut ctx = StepCtx {
                    timers: &mut self.timers,
                    rng: &mut self.rng,
                    score: &mut self.score,
                    events: &mut self.events,
                };
                steps.push(self.rules.on_timer(fired, &mut ctx));
            }
            self.timers.settle(until);
            steps
        }

        fn whack(&mut self, slot: usize) -> bool {
            let mut ctx = StepCtx {
                timers: &mut self.timers,
                rng: &mut self.rng,
                score: &mut self.score,
                events: &mut self.events,
            };
            self.rules.on_action(slot, &mut ctx)
        }
    }

    #[test]
    fn test_hide_fires_after_stay() {
        let mut h = Harness::new();
        h.raise(4);
        assert!(h.run_until(799).is_empty());
        assert!(h.rules.slots()[4]);
        assert_eq!(h.run_until(800), vec![Step::Advanced]);
        assert!(!h.rules.slots()[4]);
        assert!(h.rules.pending_hides().is_empty());
    }

    #[test]
    fn test_whack_cancels_hide() {
        let mut h = Harness::new();
        h.raise(4);
        h.run_until(200);
        assert!(h.whack(4));
        assert_eq!(h.score, 1);
        assert!(!h.rules.slots()[4]);
        assert!(!h.rules.pending_hides().contains(4));
        assert!(h.timers.is_empty());
        assert!(h.run_until(800).is_empty());
        assert!(matches!(h.events[..], [GameEvent::Whacked { slot: 4, score: 1 }]));
    }

    #[test]
    fn test_whack_idle_or_out_of_range_is_noop() {
        let mut h = Harness::new();
        assert!(!h.whack(3));
        assert!(!h.whack(9));
        assert!(!h.whack(usize::MAX));
        h.raise(2);
        assert!(h.whack(2));
        assert!(!h.whack(2));
        assert_eq!(h.score, 1);
    }

    #[test]
    fn test_stale_hide_id_is_ignored() {
        let mut h = Harness::new();
        h.raise(1);
        let first = h.timers.pop_due(800).expect("hide due");
        // Slot re-raised before the old firing is processed
        h.rules.hides.arm(1, &mut h.timers, 800);
        let mut ctx = StepCtx {
            timers: &mut h.timers,
            rng: &mut h.rng,
            score: &mut h.score,
            events: &mut h.events,
        };
        assert_eq!(h.rules.on_timer(first, &mut ctx), Step::Quiet);
        assert!(h.rules.slots()[1]);
    }

    #[test]
    fn test_countdown_clamps_and_ends() {
        let mut h = Harness::new();
        h.rules.time_left = 2;
        h.timers.arm_periodic(WhackTimer::Countdown, 1000);
        assert_eq!(h.run_until(1000), vec![Step::Advanced]);
        assert_eq!(h.rules.time_left(), 1);
        assert_eq!(h.run_until(2000), vec![Step::Ended(EndReason::TimeUp)]);
        assert_eq!(h.rules.time_left(), 0);
    }

    #[test]
    fn test_spawn_on_busy_slot_dropped() {
        let mut h = Harness::new();
        for slot in 0..9 {
            h.raise(slot);
        }
        let armed = h.timers.len();
        let mut ctx = StepCtx {
            timers: &mut h.timers,
            rng: &mut h.rng,
            score: &mut h.score,
            events: &mut h.events,
        };
        assert_eq!(h.rules.try_spawn(&mut ctx), Step::Quiet);
        assert_eq!(h.timers.len(), armed);
    }

    #[test]
    fn test_freeze_and_thaw_keep_remaining_stay() {
        let mut h = Harness::new();
        h.raise(6);
        h.run_until(300);
        h.rules.suspend(&h.timers);
        h.timers.cancel_all();
        h.timers.settle(5000);
        assert_eq!(h.rules.pending_hides().due_at(6), None);
        assert!(h.rules.pending_hides().contains(6));

        h.rules.hides.thaw(&mut h.timers);
        assert_eq!(h.rules.pending_hides().due_at(6), Some(5500));
        assert!(h.run_until(5499).is_empty());
        assert_eq!(h.run_until(5500), vec![Step::Advanced]);
        assert!(!h.rules.slots()[6]);
    }

    fn engine(seed: u64) -> Engine<WhackRules> {
        Engine::new(
            WhackRules::new(WhackTuning::default()),
            seed,
            BestScore::open("whack", Box::new(MemoryStore::default())),
        )
    }

    #[test]
    fn test_session_runs_out_and_clears() {
        let mut e = engine(11);
        assert!(!e.handle(Intent::Action(0)));
        assert_eq!(e.status(), SessionStatus::Idle);
        e.handle(Intent::Start);
        e.advance(29_500);
        assert_eq!(e.status(), SessionStatus::Playing);
        assert_eq!(e.rules().time_left(), 1);

        e.advance(500);
        assert_eq!(e.status(), SessionStatus::GameOver);
        let board = e.snapshot().board;
        assert_eq!(board.time_left, 0);
        assert!(board.slots.iter().all(|s| !s));
        assert!(board.hides_due_ms.iter().all(Option::is_none));
        assert_eq!(e.armed_timers(), 0);
    }

    #[test]
    fn test_pause_freezes_board() {
        let mut e = engine(4);
        e.handle(Intent::Start);
        e.advance(1700);
        let before = e.snapshot().board;
        e.handle(Intent::TogglePause);
        assert_eq!(e.armed_timers(), 0);
        e.advance(60_000);
        let after = e.snapshot().board;
        assert_eq!(before.slots, after.slots);
        assert_eq!(before.time_left, after.time_left);

        e.handle(Intent::TogglePause);
        let active = after.slots.iter().filter(|s| **s).count();
        // countdown + spawn + one hide per visible slot
        assert_eq!(e.armed_timers(), 2 + active);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Whack(usize),
        Wait(u64),
        TogglePause,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0usize..12).prop_map(Op::Whack),
            4 => (0u64..1500).prop_map(Op::Wait),
            1 => Just(Op::TogglePause),
        ]
    }

    proptest! {
        #[test]
        fn prop_whack_scoring(seed in any::<u64>(), ops in prop::collection::vec(op(), 1..200)) {
            let mut e = engine(seed);
            e.handle(Intent::Start);

            for op in ops {
                let before = e.snapshot();
                match op {
                    Op::Whack(slot) => {
                        let hit = before.status == SessionStatus::Playing
                            && before.board.slots.get(slot).copied().unwrap_or(false);
                        e.handle(Intent::Action(slot));
                        prop_assert_eq!(e.score(), before.score + u32::from(hit));
                        if hit {
                            prop_assert!(!e.rules().slots()[slot]);
                            prop_assert!(!e.rules().pending_hides().contains(slot));
                        }
                    }
                    Op::Wait(ms) => {
                        e.advance(ms);
                        prop_assert_eq!(e.score(), before.score);
                    }
                    Op::TogglePause => {
                        e.handle(Intent::TogglePause);
                    }
                }

                if before.status == SessionStatus::GameOver {
                    let after = e.snapshot();
                    prop_assert_eq!(after.score, before.score);
                    prop_assert_eq!(after.board.slots, before.board.slots);
                    prop_assert_eq!(after.board.time_left, before.board.time_left);
                }
                if e.status() != SessionStatus::Playing {
                    prop_assert_eq!(e.armed_timers(), 0);
                }
            }
        }
    }
}
