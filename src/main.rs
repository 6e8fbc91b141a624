//! Tick Arcade entry point
//!
//! Headless driver: the autopilot plays a few sessions of either game, each
//! finished session gets its commentary, and a summary is printed.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Result;
    use clap::{Parser, ValueEnum};

    use tick_arcade::BestScore;
    use tick_arcade::commentary::{
        CannedProvider, CommentaryDesk, CommentaryProvider, Delivery, GeminiProvider,
    };
    use tick_arcade::consts::{SNAKE_SCORE_KEY, WHACK_SCORE_KEY};
    use tick_arcade::platform::{
        Clock, FileStore, ManualClock, MemoryStore, RawInput, ScoreStore, SystemClock,
        route_snake, route_whack,
    };
    use tick_arcade::settings::{Difficulty, Settings};
    use tick_arcade::sim::{
        EndReason, Engine, GameEvent, Intent, Rules, SessionStatus, SnakeBoard, SnakeRules, Snapshot,
        WhackBoard, WhackPilot, WhackRules, steer_snake,
    };

    /// Engine poll step (ms)
    const STEP_MS: u64 = 10;
    /// Wall time per step beyond this is dropped instead of replayed
    const MAX_STEP_MS: u64 = 100;
    /// A session still running after this long is abandoned
    const MAX_SESSION_MS: u64 = 10 * 60 * 1000;
    /// Autopilot reaction time for Whack (ms)
    const WHACK_REACTION_MS: u64 = 250;
    const WHACK_ACCURACY: f64 = 0.85;

    #[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
    enum Game {
        Snake,
        Whack,
    }

    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// Which game the autopilot plays
        #[arg(value_enum, default_value = "snake")]
        game: Game,

        /// RNG seed (same seed, same sessions)
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Number of sessions to play
        #[arg(long, default_value_t = 3)]
        sessions: u32,

        /// Pace the clock in real time instead of running as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Settings file (TOML)
        #[arg(long, default_value = "tick-arcade.toml")]
        config: String,

        /// Override the difficulty preset (relaxed, classic, frantic)
        #[arg(long)]
        difficulty: Option<String>,

        /// Use canned commentary instead of the network service
        #[arg(long)]
        offline: bool,

        /// Keep best scores in memory only
        #[arg(long)]
        no_save: bool,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    }

    /// Clock source behind the engine
    enum Source {
        Virtual(ManualClock),
        Real(SystemClock),
    }

    /// Turns clock readings into engine time, one step at a time.
    ///
    /// Only the time since the previous step is forwarded, capped at
    /// `MAX_STEP_MS`, so a stall between steps is never replayed as a burst
    /// of ticks.
    struct Pace {
        source: Source,
        last_ms: u64,
    }

    impl Pace {
        fn new(realtime: bool) -> Self {
            let source = if realtime {
                Source::Real(SystemClock::new())
            } else {
                Source::Virtual(ManualClock::new())
            };
            Self { source, last_ms: 0 }
        }

        /// Let one step pass and return the engine time to advance to
        async fn step(&mut self, engine_now: u64) -> u64 {
            let now = match &mut self.source {
                Source::Virtual(clock) => clock.advance(STEP_MS),
                Source::Real(clock) => {
                    tokio::time::sleep(Duration::from_millis(STEP_MS)).await;
                    clock.now_ms()
                }
            };
            let dt = now.saturating_sub(self.last_ms).min(MAX_STEP_MS);
            self.last_ms = now;
            engine_now.saturating_add(dt)
        }
    }

    /// What the CLI reports for one session
    #[derive(Debug, Clone)]
    struct SessionSummary {
        epoch: u64,
        started_ms: u64,
        ended_ms: u64,
        score: u32,
        high_score: u32,
        end_reason: Option<EndReason>,
        commentary: Option<String>,
    }

    fn score_store(settings: &Settings, no_save: bool) -> Box<dyn ScoreStore> {
        if no_save {
            Box::new(MemoryStore::default())
        } else {
            Box::new(FileStore::new(&settings.best_score_dir))
        }
    }

    fn provider(settings: &Settings, offline: bool) -> Arc<dyn CommentaryProvider> {
        if offline || !settings.commentary.enabled {
            return Arc::new(CannedProvider);
        }
        match GeminiProvider::from_settings(&settings.commentary) {
            Ok(gemini) => Arc::new(gemini),
            Err(e) => {
                log::warn!("Commentary service unavailable ({}), using canned lines", e);
                Arc::new(CannedProvider)
            }
        }
    }

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::Ate { score } => log::debug!("cue: eat (score {})", score),
            GameEvent::Whacked { slot, score } => {
                log::debug!("cue: whack slot {} (score {})", slot, score)
            }
            GameEvent::NewHighScore { score } => log::info!("New best score: {}", score),
            other => log::debug!("cue: {:?}", other),
        }
    }

    /// Print an answer, attach it to its session and offer it to the engine.
    /// The engine keeps it only if that session is still the current one.
    fn file_commentary<R: Rules>(
        engine: &mut Engine<R>,
        delivery: Delivery,
        summaries: &mut [SessionSummary],
        outstanding: &mut usize,
    ) {
        *outstanding = outstanding.saturating_sub(1);
        println!("#{} commentary: {}", delivery.epoch, delivery.text);
        if let Some(summary) = summaries.iter_mut().find(|s| s.epoch == delivery.epoch) {
            summary.commentary = Some(delivery.text.clone());
        }
        engine.deliver_commentary(delivery);
    }

    /// Play `args.sessions` sessions, feeding pilot input through `route`.
    /// Commentary is collected while the next session runs; only the last
    /// answers are awaited once every session is over.
    async fn play<R, P, F>(
        engine: &mut Engine<R>,
        desk: &mut CommentaryDesk,
        args: &Args,
        route: F,
        mut pilot: P,
    ) -> Result<Vec<SessionSummary>>
    where
        R: Rules,
        P: FnMut(&Snapshot<R::Board>) -> Option<RawInput>,
        F: Fn(RawInput, SessionStatus) -> Option<Intent<R::Action>>,
    {
        let mut pace = Pace::new(args.realtime);
        let mut summaries: Vec<SessionSummary> = Vec::new();
        let mut outstanding = 0usize;

        for round in 0..args.sessions {
            let opener = if round == 0 {
                RawInput::StartPause
            } else {
                RawInput::PlayAgain
            };
            if let Some(intent) = route(opener, engine.status()) {
                engine.handle(intent);
            }
            let started_ms = engine.now_ms();

            while engine.status() == SessionStatus::Playing {
                if engine.now_ms() - started_ms > MAX_SESSION_MS {
                    log::warn!("Session {} still running, abandoning it", engine.epoch());
                    break;
                }
                while let Some(delivery) = desk.try_recv() {
                    file_commentary(engine, delivery, &mut summaries, &mut outstanding);
                }
                let snapshot = engine.snapshot();
                if let Some(intent) = pilot(&snapshot).and_then(|input| route(input, snapshot.status)) {
                    engine.handle(intent);
                }
                let now = pace.step(engine.now_ms()).await;
                engine.advance_to(now);
            }

            for event in engine.drain_events() {
                log_event(&event);
            }

            if let Some((epoch, request)) = engine.commentary_request() {
                desk.request(epoch, request);
                outstanding += 1;
            }

            let snapshot = engine.snapshot();
            let summary = SessionSummary {
                epoch: snapshot.epoch,
                started_ms,
                ended_ms: snapshot.now_ms,
                score: snapshot.score,
                high_score: snapshot.high_score,
                end_reason: snapshot.end_reason,
                commentary: None,
            };
            println!(
                "#{} seed {} {} score {} (best {}) in {} ms",
                summary.epoch,
                engine.seed(),
                summary
                    .end_reason
                    .map_or("abandoned", |reason| reason.describe()),
                summary.score,
                summary.high_score,
                summary.ended_ms - summary.started_ms
            );
            summaries.push(summary);
        }

        while outstanding > 0 {
            match desk.recv().await {
                Some(delivery) => {
                    file_commentary(engine, delivery, &mut summaries, &mut outstanding)
                }
                None => break,
            }
        }
        for summary in summaries.iter().filter(|s| s.end_reason.is_some() && s.commentary.is_none()) {
            log::warn!("No commentary arrived for session {}", summary.epoch);
        }

        if args.json {
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        Ok(summaries)
    }

    #[tokio::main]
    pub async fn main() -> Result<()> {
        env_logger::init();
        let args = Args::parse();

        let mut settings = Settings::load(&args.config);
        if let Some(name) = args.difficulty.as_deref() {
            match Difficulty::from_str(name) {
                Some(preset) => settings.apply_preset(preset),
                None => log::warn!("Unknown difficulty '{}', keeping {}", name, settings.difficulty.as_str()),
            }
        }
        log::info!(
            "Tick Arcade starting: {:?}, seed {}, {} sessions, {} difficulty",
            args.game,
            args.seed,
            args.sessions,
            settings.difficulty.as_str()
        );

        let timeout = Duration::from_millis(settings.commentary.timeout_ms);
        let mut desk = CommentaryDesk::new(provider(&settings, args.offline), timeout);
        let store = score_store(&settings, args.no_save);

        match args.game {
            Game::Snake => {
                let best = BestScore::open(SNAKE_SCORE_KEY, store);
                let mut engine = Engine::new(SnakeRules::new(settings.snake.clone()), args.seed, best);
                let pilot = |snapshot: &Snapshot<SnakeBoard>| {
                    steer_snake(&snapshot.board)
                        .filter(|d| *d != snapshot.board.pending)
                        .map(RawInput::Pad)
                };
                play(&mut engine, &mut desk, &args, route_snake, pilot).await?;
            }
            Game::Whack => {
                let best = BestScore::open(WHACK_SCORE_KEY, store);
                let mut engine = Engine::new(WhackRules::new(settings.whack.clone()), args.seed, best);
                let mut whacker = WhackPilot::new(args.seed, WHACK_REACTION_MS, WHACK_ACCURACY);
                let pilot = move |snapshot: &Snapshot<WhackBoard>| {
                    whacker
                        .decide(&snapshot.board, snapshot.now_ms)
                        .map(RawInput::Tap)
                };
                play(&mut engine, &mut desk, &args, route_whack, pilot).await?;
            }
        }
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive the library directly
}
