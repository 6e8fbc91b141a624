//! Generic tick/session engine
//!
//! `Engine<R>` owns the session lifecycle, the timer registry, the RNG and the
//! best-score bridge. Game-specific behavior plugs in through [`Rules`].
//!
//! Every mutation is one call (`handle`, `advance_to`) that runs to
//! completion. Timers are armed only on entering Playing and every timer is
//! cancelled on leaving it, so no callback can reach a paused, finished or
//! reset session.

use std::fmt::Debug;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::session::{
    CommentarySlot, EndReason, GameEvent, GameTheme, Intent, Session, SessionStatus,
};
use super::timers::{Fired, TimerRegistry};
use crate::commentary::{CommentaryRequest, Delivery};
use crate::highscores::BestScore;

/// Mutable view handed to game rules during a step
pub struct StepCtx<'a, K> {
    pub timers: &'a mut TimerRegistry<K>,
    pub rng: &'a mut Pcg32,
    pub score: &'a mut u32,
    pub events: &'a mut Vec<GameEvent>,
}

/// Outcome of a timer step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing observable changed (e.g. a dropped spawn attempt)
    Quiet,
    /// State changed, session continues
    Advanced,
    /// Session must end
    Ended(EndReason),
}

/// Game-specific rules layered on the shared skeleton
pub trait Rules {
    /// Game-specific player action
    type Action: Copy + Debug;
    /// Timer key
    type Timer: Copy + Debug;
    /// Render-facing entity state
    type Board: Clone + Debug + Serialize;

    fn theme(&self) -> GameTheme;

    /// Reinitialize per-session entities
    fn fresh(&mut self, rng: &mut Pcg32);

    /// Arm this game's timers on entering Playing
    fn arm(&mut self, timers: &mut TimerRegistry<Self::Timer>);

    /// Called right before every timer is cancelled for a pause
    fn suspend(&mut self, _timers: &TimerRegistry<Self::Timer>) {}

    /// Session ended; drop transient entity state
    fn clear_on_end(&mut self) {}

    fn on_timer(
        &mut self,
        fired: Fired<Self::Timer>,
        ctx: &mut StepCtx<'_, Self::Timer>,
    ) -> Step;

    /// Apply an action while Playing; false if it was dropped
    fn on_action(&mut self, action: Self::Action, ctx: &mut StepCtx<'_, Self::Timer>) -> bool;

    /// Whether an action received while Idle starts the session
    fn starts_on_action(&self) -> bool {
        false
    }

    /// Apply an action received while Idle (only if `starts_on_action`)
    fn steer_idle(&mut self, _action: Self::Action) -> bool {
        false
    }

    fn board(&self) -> Self::Board;
}

/// Render-friendly, read-only copy of engine state
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<B> {
    pub status: SessionStatus,
    pub score: u32,
    pub high_score: u32,
    pub epoch: u64,
    pub now_ms: u64,
    pub revision: u64,
    pub end_reason: Option<EndReason>,
    pub board: B,
    pub commentary: CommentarySlot,
}

#[derive(Debug, Clone, Copy)]
struct EndSummary {
    reason: EndReason,
    score: u32,
    previous_best: u32,
}

/// Tick/session skeleton shared by both games
pub struct Engine<R: Rules> {
    rules: R,
    session: Session,
    timers: TimerRegistry<R::Timer>,
    rng: Pcg32,
    seed: u64,
    best: BestScore,
    events: Vec<GameEvent>,
    commentary: CommentarySlot,
    ended: Option<EndSummary>,
    revision: u64,
}

impl<R: Rules> Engine<R> {
    /// Build an Idle engine with fresh per-session entities
    pub fn new(mut rules: R, seed: u64, best: BestScore) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        rules.fresh(&mut rng);
        Self {
            rules,
            session: Session::new(),
            timers: TimerRegistry::new(),
            rng,
            seed,
            best,
            events: Vec::new(),
            commentary: CommentarySlot::Empty,
            ended: None,
            revision: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn high_score(&self) -> u32 {
        self.best.value()
    }

    pub fn epoch(&self) -> u64 {
        self.session.epoch
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Bumped after every state-mutating step
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Number of armed timers (zero whenever not Playing)
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn snapshot(&self) -> Snapshot<R::Board> {
        Snapshot {
            status: self.session.status,
            score: self.session.score,
            high_score: self.best.value(),
            epoch: self.session.epoch,
            now_ms: self.timers.now_ms(),
            revision: self.revision,
            end_reason: self.ended.map(|e| e.reason),
            board: self.rules.board(),
            commentary: self.commentary.clone(),
        }
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply one intent. Returns true if any state changed.
    pub fn handle(&mut self, intent: Intent<R::Action>) -> bool {
        let changed = match intent {
            Intent::Action(action) => self.act(action),
            Intent::Start => self.start(),
            Intent::TogglePause => self.toggle_pause(),
            Intent::Reset => {
                self.reset();
                true
            }
        };
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Run every timer due up to `now_ms`. Returns the number of steps run.
    pub fn advance_to(&mut self, now_ms: u64) -> usize {
        let mut steps = 0;
        while let Some(fired) = self.timers.pop_due(now_ms) {
            debug_assert!(self.session.is_playing(), "timer fired while {:?}", self.session.status);
            steps += 1;

            let mut ctx = StepCtx {
                timers: &mut self.timers,
                rng: &mut self.rng,
                score: &mut self.session.score,
                events: &mut self.events,
            };
            match self.rules.on_timer(fired, &mut ctx) {
                Step::Quiet => {}
                Step::Advanced => self.revision += 1,
                Step::Ended(reason) => {
                    self.end(reason);
                    self.revision += 1;
                }
            }
        }
        self.timers.settle(now_ms);
        steps
    }

    /// Advance the virtual clock by `dt_ms`
    pub fn advance(&mut self, dt_ms: u64) -> usize {
        let target = self.timers.now_ms().saturating_add(dt_ms);
        self.advance_to(target)
    }

    /// Commentary for a finished session, if one is awaited
    pub fn commentary_request(&self) -> Option<(u64, CommentaryRequest)> {
        match (&self.commentary, self.ended) {
            (CommentarySlot::Pending { epoch }, Some(summary)) => Some((
                *epoch,
                CommentaryRequest::new(self.rules.theme(), summary.score, summary.previous_best),
            )),
            _ => None,
        }
    }

    /// Store commentary text if it belongs to the session that just ended.
    /// Late answers for an older epoch are discarded.
    pub fn deliver_commentary(&mut self, delivery: Delivery) -> bool {
        let current = matches!(
            self.commentary,
            CommentarySlot::Pending { epoch } if epoch == delivery.epoch
        );
        if !current || self.session.status != SessionStatus::GameOver {
            log::debug!(
                "Discarding commentary for epoch {} (current epoch {})",
                delivery.epoch,
                self.session.epoch
            );
            return false;
        }
        self.commentary = CommentarySlot::Ready {
            epoch: delivery.epoch,
            text: delivery.text,
        };
        self.revision += 1;
        true
    }

    fn act(&mut self, action: R::Action) -> bool {
        match self.session.status {
            SessionStatus::Playing => {
                let mut ctx = StepCtx {
                    timers: &mut self.timers,
                    rng: &mut self.rng,
                    score: &mut self.session.score,
                    events: &mut self.events,
                };
                self.rules.on_action(action, &mut ctx)
            }
            SessionStatus::Idle if self.rules.starts_on_action() => {
                self.rules.steer_idle(action);
                self.start()
            }
            SessionStatus::Idle | SessionStatus::Paused | SessionStatus::GameOver => {
                log::trace!("Dropped {:?} while {:?}", action, self.session.status);
                false
            }
        }
    }

    fn start(&mut self) -> bool {
        match self.session.status {
            SessionStatus::Idle => {
                self.session.status = SessionStatus::Playing;
                self.rules.arm(&mut self.timers);
                self.events.push(GameEvent::Started {
                    epoch: self.session.epoch,
                });
                log::info!(
                    "{} session {} started",
                    self.rules.theme().as_str(),
                    self.session.epoch
                );
                true
            }
            SessionStatus::Paused => {
                self.session.status = SessionStatus::Playing;
                self.rules.arm(&mut self.timers);
                self.events.push(GameEvent::Resumed);
                log::info!("Resumed at {} ms", self.timers.now_ms());
                true
            }
            SessionStatus::Playing | SessionStatus::GameOver => false,
        }
    }

    fn toggle_pause(&mut self) -> bool {
        match self.session.status {
            SessionStatus::Playing => {
                self.rules.suspend(&self.timers);
                let cancelled = self.timers.cancel_all();
                self.session.status = SessionStatus::Paused;
                self.events.push(GameEvent::Paused);
                log::info!("Paused ({} timers cancelled)", cancelled);
                true
            }
            SessionStatus::Paused | SessionStatus::Idle => self.start(),
            SessionStatus::GameOver => false,
        }
    }

    fn reset(&mut self) {
        self.timers.cancel_all();
        self.rules.fresh(&mut self.rng);
        self.session.begin_next();
        self.commentary = CommentarySlot::Empty;
        self.ended = None;
        self.rules.arm(&mut self.timers);
        self.events.push(GameEvent::Started {
            epoch: self.session.epoch,
        });
        log::info!(
            "{} session {} reset and started",
            self.rules.theme().as_str(),
            self.session.epoch
        );
    }

    fn end(&mut self, reason: EndReason) {
        self.rules.clear_on_end();
        let cancelled = self.timers.cancel_all();
        self.session.status = SessionStatus::GameOver;

        let score = self.session.score;
        let previous_best = self.best.value();
        if self.best.record(score) {
            log::info!("New best {} for {}", score, self.best.key());
            self.events.push(GameEvent::NewHighScore { score });
        }
        self.ended = Some(EndSummary {
            reason,
            score,
            previous_best,
        });
        self.commentary = CommentarySlot::Pending {
            epoch: self.session.epoch,
        };
        self.events.push(GameEvent::GameOver {
            epoch: self.session.epoch,
            reason,
            score,
            previous_best,
        });
        log::info!(
            "{} session {} over ({:?}), score {} best {} ({} timers cancelled)",
            self.rules.theme().as_str(),
            self.session.epoch,
            reason,
            score,
            self.best.value(),
            cancelled
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;

    /// Counts ticks; ends after `limit`
    struct Counter {
        limit: u32,
        ticks: u32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Tick;

    impl Rules for Counter {
        type Action = u32;
        type Timer = Tick;
        type Board = u32;

        fn theme(&self) -> GameTheme {
            GameTheme::Snake
        }

        fn fresh(&mut self, _rng: &mut Pcg32) {
            self.ticks = 0;
        }

        fn arm(&mut self, timers: &mut TimerRegistry<Tick>) {
            timers.arm_periodic(Tick, 100);
        }

        fn on_timer(&mut self, _fired: Fired<Tick>, ctx: &mut StepCtx<'_, Tick>) -> Step {
            self.ticks += 1;
            *ctx.score += 1;
            if self.ticks >= self.limit {
                Step::Ended(EndReason::TimeUp)
            } else {
                Step::Advanced
            }
        }

        fn on_action(&mut self, action: u32, ctx: &mut StepCtx<'_, Tick>) -> bool {
            *ctx.score += action;
            true
        }

        fn board(&self) -> u32 {
            self.ticks
        }
    }

    fn engine(limit: u32) -> Engine<Counter> {
        Engine::new(
            Counter { limit, ticks: 0 },
            1,
            BestScore::open("test", Box::new(MemoryStore::default())),
        )
    }

    #[test]
    fn test_idle_does_not_tick() {
        let mut e = engine(10);
        assert_eq!(e.advance_to(1000), 0);
        assert_eq!(e.armed_timers(), 0);
        // Counter does not start on action
        assert!(!e.handle(Intent::Action(5)));
        assert_eq!(e.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_pause_cancels_and_resume_rearms() {
        let mut e = engine(10);
        assert!(e.handle(Intent::Start));
        assert_eq!(e.advance(250), 2);
        assert!(e.handle(Intent::TogglePause));
        assert_eq!(e.armed_timers(), 0);
        assert_eq!(e.advance(1000), 0);
        assert_eq!(e.snapshot().board, 2);

        assert!(e.handle(Intent::TogglePause));
        assert_eq!(e.status(), SessionStatus::Playing);
        assert_eq!(e.advance(100), 1);
    }

    #[test]
    fn test_huge_advance_saturates() {
        let mut e = engine(u32::MAX);
        e.handle(Intent::Start);
        e.advance(50);
        e.handle(Intent::TogglePause);
        assert_eq!(e.advance(u64::MAX), 0);
        assert_eq!(e.now_ms(), u64::MAX);
        assert_eq!(e.advance(1), 0);
        assert_eq!(e.now_ms(), u64::MAX);
    }

    #[test]
    fn test_game_over_is_inert_until_reset() {
        let mut e = engine(3);
        e.handle(Intent::Start);
        e.advance(10_000);
        assert_eq!(e.status(), SessionStatus::GameOver);
        assert_eq!(e.score(), 3);
        assert_eq!(e.high_score(), 3);
        assert_eq!(e.armed_timers(), 0);

        let rev = e.revision();
        assert!(!e.handle(Intent::Action(7)));
        assert!(!e.handle(Intent::TogglePause));
        assert!(!e.handle(Intent::Start));
        assert_eq!(e.advance(10_000), 0);
        assert_eq!(e.revision(), rev);
        assert_eq!(e.score(), 3);

        assert!(e.handle(Intent::Reset));
        assert_eq!(e.status(), SessionStatus::Playing);
        assert_eq!(e.score(), 0);
        assert_eq!(e.epoch(), 1);
        assert_eq!(e.high_score(), 3);
    }

    #[test]
    fn test_stale_commentary_discarded() {
        let mut e = engine(1);
        e.handle(Intent::Start);
        e.advance(100);
        let (epoch, request) = e.commentary_request().expect("pending commentary");
        assert_eq!(epoch, 0);
        assert!(request.new_high_score);

        e.handle(Intent::Reset);
        assert!(!e.deliver_commentary(Delivery {
            epoch,
            text: "late".into()
        }));
        assert_eq!(e.snapshot().commentary, CommentarySlot::Empty);

        e.advance(100);
        let (epoch, _) = e.commentary_request().expect("pending commentary");
        assert_eq!(epoch, 1);
        assert!(e.deliver_commentary(Delivery {
            epoch,
            text: "on time".into()
        }));
        assert_eq!(e.snapshot().commentary.text(), Some("on time"));
        assert!(e.commentary_request().is_none());
    }

    #[test]
    fn test_events_track_lifecycle() {
        let mut e = engine(1);
        e.handle(Intent::TogglePause);
        e.advance(100);
        let events = e.drain_events();
        assert_eq!(events[0], GameEvent::Started { epoch: 0 });
        assert!(events.contains(&GameEvent::NewHighScore { score: 1 }));
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameOver {
                reason: EndReason::TimeUp,
                score: 1,
                previous_best: 0,
                ..
            })
        ));
        assert!(e.drain_events().is_empty());
    }
}
