//! Engine session manager.
//!
//! Owns one slot per [`EngineKind`]. Each slot guards its adapter with an
//! async mutex, so requests against the same engine queue up while requests
//! against different engines run in parallel. A slot's `live` flag can be
//! read without waiting for the lock, which keeps the health probes cheap.
//!
//! A caller that abandons a request (drops the future) does not stop the
//! engine's search. The adapter notices the unfinished search on its next
//! request, sends `stop`, and discards whatever the old search printed.

use crate::adapter::{EngineCommand, Strength, UciEngine};
use crate::analysis::{AnalysisLine, MoveEvaluation, SearchLimit};
use crate::config::CoachConfig;
use crate::locator::Locator;
use crate::{EngineError, EngineKind, Position};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;

/// Snapshot of which engines are serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineHealth {
    /// True iff the strong engine is live.
    pub ready: bool,
    pub strong: bool,
    pub human_like: bool,
}

struct EngineSlot {
    kind: EngineKind,
    engine: Mutex<Option<UciEngine>>,
    live: AtomicBool,
    /// Strength-limited requests queued on or running against this slot.
    limited_pending: AtomicUsize,
}

impl EngineSlot {
    fn new(kind: EngineKind) -> Self {
        Self {
            kind,
            engine: Mutex::new(None),
            live: AtomicBool::new(false),
            limited_pending: AtomicUsize::new(0),
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Counts a limited request as pending for as long as it exists, including
/// when the request future is dropped part-way.
struct PendingLimited<'a>(&'a AtomicUsize);

impl<'a> PendingLimited<'a> {
    fn register(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingLimited<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Process-wide set of engines.
///
/// Create one at startup, call [`EngineManager::initialize`], share it (e.g.
/// behind an `Arc`) and call [`EngineManager::shutdown`] on the way out.
pub struct EngineManager {
    config: CoachConfig,
    locator: Locator,
    strong: EngineSlot,
    human_like: EngineSlot,
}

impl EngineManager {
    pub fn new(config: CoachConfig) -> Self {
        Self::with_locator(config, Locator::system())
    }

    pub fn with_locator(config: CoachConfig, locator: Locator) -> Self {
        Self {
            config,
            locator,
            strong: EngineSlot::new(EngineKind::Strong),
            human_like: EngineSlot::new(EngineKind::HumanLike),
        }
    }

    pub fn settings(&self) -> &CoachConfig {
        &self.config
    }

    fn slot(&self, kind: EngineKind) -> &EngineSlot {
        match kind {
            EngineKind::Strong => &self.strong,
            EngineKind::HumanLike => &self.human_like,
        }
    }

    /// Locate and start every engine that is not already live.
    ///
    /// Missing or broken engines are logged and leave that kind unavailable;
    /// this never fails. Calling it again restarts engines that have died.
    /// Returns [`EngineManager::is_ready`].
    pub async fn initialize(&self) -> bool {
        tokio::join!(self.launch(&self.strong), self.launch(&self.human_like));

        match (self.strong.is_live(), self.human_like.is_live()) {
            (true, true) => tracing::info!("Strong and human-like engines ready"),
            (true, false) => tracing::warn!(
                "Human-like engine unavailable; the strong engine will serve every request"
            ),
            (false, true) => tracing::error!(
                "Strong engine unavailable; running degraded on the human-like engine"
            ),
            (false, false) => tracing::error!("No chess engine available"),
        }
        self.is_ready()
    }

    async fn launch(&self, slot: &EngineSlot) {
        let mut guard = slot.engine.lock().await;
        if slot.is_live() {
            return;
        }
        if let Some(mut stale) = guard.take() {
            stale.stop().await;
        }

        let settings = self.config.engines.get(slot.kind);
        let program = match self.locator.locate(slot.kind, settings.path.as_deref()) {
            Ok(Some(program)) => program,
            Ok(None) => {
                tracing::warn!("No {} engine found", slot.kind);
                return;
            }
            Err(e) => {
                tracing::error!("{}", e);
                return;
            }
        };

        let command = EngineCommand {
            program,
            args: settings.args.clone(),
        };
        match UciEngine::start(slot.kind, &command, self.config.timeouts.clone()).await {
            Ok(engine) => {
                *guard = Some(engine);
                slot.live.store(true, Ordering::SeqCst);
            }
            Err(e) => tracing::error!("Failed to start {} engine: {}", slot.kind, e),
        }
    }

    /// True iff the strong engine is live.
    pub fn is_ready(&self) -> bool {
        self.strong.is_live()
    }

    pub fn is_available(&self, kind: EngineKind) -> bool {
        self.slot(kind).is_live()
    }

    pub fn health(&self) -> EngineHealth {
        EngineHealth {
            ready: self.is_ready(),
            strong: self.strong.is_live(),
            human_like: self.human_like.is_live(),
        }
    }

    /// Name the engine reported at startup. Waits behind in-flight requests.
    pub async fn engine_name(&self, kind: EngineKind) -> Option<String> {
        let guard = self.slot(kind).engine.lock().await;
        guard.as_ref().map(|engine| engine.name().to_string())
    }

    /// The human-like engine when preferred and live, otherwise the strong
    /// engine, otherwise whatever is still live.
    fn select(&self, prefer_human_like: bool) -> Result<&EngineSlot, EngineError> {
        if prefer_human_like && self.human_like.is_live() {
            return Ok(&self.human_like);
        }
        if self.strong.is_live() {
            return Ok(&self.strong);
        }
        if self.human_like.is_live() {
            tracing::debug!("Strong engine down; routing request to the human-like engine");
            return Ok(&self.human_like);
        }
        Err(EngineError::NoEngineAvailable(if prefer_human_like {
            EngineKind::HumanLike
        } else {
            EngineKind::Strong
        }))
    }

    /// Multi-PV analysis, best line first. Depth and line count are clamped
    /// to the configured maxima.
    pub async fn analyze_position(
        &self,
        position: &Position,
        depth: u32,
        lines: u32,
        prefer_human_like: bool,
    ) -> Result<Vec<AnalysisLine>, EngineError> {
        let slot = self.select(prefer_human_like)?;
        let search = &self.config.search;
        let depth = search.clamp_depth(depth);
        let lines = search.clamp_lines(lines);

        let mut guard = slot.engine.lock().await;
        let Some(engine) = guard.as_mut() else {
            return Err(EngineError::NoEngineAvailable(slot.kind));
        };

        tracing::debug!(
            "Analyzing {} on {} engine (depth {}, {} lines)",
            position,
            slot.kind,
            depth,
            lines
        );
        let result = async {
            if slot.kind == EngineKind::Strong {
                engine.set_strength(Strength::Full).await?;
            }
            engine.analyze(position, depth, lines, search.pv_length).await
        }
        .await;

        settle(slot, &mut guard, result).await
    }

    /// Best move under a time limit. `elo` limits the strong engine's
    /// strength for this request only; the human-like engine plays at the
    /// rating its network was trained for and ignores it.
    pub async fn best_move(
        &self,
        position: &Position,
        elo: Option<u32>,
        time_limit: Duration,
        prefer_human_like: bool,
    ) -> Result<String, EngineError> {
        let slot = self.select(prefer_human_like)?;
        let strength = match (slot.kind, elo) {
            (EngineKind::Strong, Some(elo)) => Strength::Limited(elo),
            _ => Strength::Full,
        };

        let pending = matches!(strength, Strength::Limited(_))
            .then(|| PendingLimited::register(&slot.limited_pending));

        let mut guard = slot.engine.lock().await;
        let Some(engine) = guard.as_mut() else {
            return Err(EngineError::NoEngineAvailable(slot.kind));
        };

        let result = async {
            if slot.kind == EngineKind::Strong {
                engine.set_strength(strength).await?;
            }
            engine
                .best_move(position, SearchLimit::Time(time_limit))
                .await
        }
        .await;
        let result = settle(slot, &mut guard, result).await;

        // Back to full strength unless another limited request is queued.
        drop(pending);
        if let Some(engine) = guard.as_mut() {
            if engine.strength() != Some(Strength::Full)
                && slot.limited_pending.load(Ordering::SeqCst) == 0
            {
                let reset = engine.set_strength(Strength::Full).await;
                if let Err(e) = settle(slot, &mut guard, reset).await {
                    tracing::warn!(
                        "Failed to restore full strength on {} engine: {}",
                        slot.kind,
                        e
                    );
                }
            }
        }

        result
    }

    /// Classify `mv` by analyzing the position before and after it.
    ///
    /// Both searches run under one lock on the same engine, so no other
    /// request can slip between them. `position` itself is never modified.
    pub async fn evaluate_move_quality(
        &self,
        position: &Position,
        mv: &str,
        depth: u32,
    ) -> Result<MoveEvaluation, EngineError> {
        let slot = self.select(false)?;
        let search = &self.config.search;
        let depth = search.clamp_depth(depth);

        let mut guard = slot.engine.lock().await;
        let Some(engine) = guard.as_mut() else {
            return Err(EngineError::NoEngineAvailable(slot.kind));
        };

        let result = async {
            if slot.kind == EngineKind::Strong {
                engine.set_strength(Strength::Full).await?;
            }
            let before = engine.analyze(position, depth, 1, search.pv_length).await?;
            let after = engine
                .analyze(&position.with_move(mv), depth, 1, search.pv_length)
                .await?;
            Ok::<_, EngineError>(MoveEvaluation::from_lines(mv, before.first(), after.first()))
        }
        .await;

        if let Ok(evaluation) = &result {
            tracing::debug!(
                "{} after {}: {} ({:+}cp)",
                mv,
                position,
                evaluation.classification,
                evaluation.score_difference
            );
        }
        settle(slot, &mut guard, result).await
    }

    /// Stop every engine. Each engine gets its own bounded wait, so one that
    /// hangs cannot hold up the other. Safe to call more than once.
    pub async fn shutdown(&self) {
        tokio::join!(
            self.shutdown_slot(&self.strong),
            self.shutdown_slot(&self.human_like)
        );
    }

    async fn shutdown_slot(&self, slot: &EngineSlot) {
        slot.live.store(false, Ordering::SeqCst);

        // Covers waiting for an in-flight request plus the engine's own
        // quit grace period.
        let limit = self.config.timeouts.shutdown() * 2;
        let stop = async {
            let mut guard = slot.engine.lock().await;
            if let Some(mut engine) = guard.take() {
                engine.stop().await;
            }
        };
        if timeout(limit, stop).await.is_err() {
            tracing::warn!(
                "{} engine did not stop within {:?}; it will be killed when dropped",
                slot.kind,
                limit
            );
        }
    }
}

/// Tear the engine down if the request found it dead.
async fn settle<T>(
    slot: &EngineSlot,
    guard: &mut MutexGuard<'_, Option<UciEngine>>,
    result: Result<T, EngineError>,
) -> Result<T, EngineError> {
    if let Err(EngineError::Crash(reason)) = &result {
        tracing::error!("{} engine crashed: {}", slot.kind, reason);
        slot.live.store(false, Ordering::SeqCst);
        if let Some(mut engine) = guard.take() {
            engine.stop().await;
        }
    }
    result
}
