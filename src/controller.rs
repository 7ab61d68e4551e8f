// SPDX-License-Identifier: GPL-3.0-only

//! Exclusion gate and effect controller
//!
//! The gate is the single mutual-exclusion primitive serializing access to
//! the active effect slot: frame processing, effect navigation, focus, and
//! teardown all pass through it. Callers differ only in how long they are
//! willing to wait — frame delivery drops on timeout, navigation skips,
//! teardown retries until acquired.

use crate::config::PipelineConfig;
use crate::effects::{EffectCatalog, SourceBinding};
use crate::engine::RenderEngine;
use crate::errors::PipelineResult;
use crate::frame::FrameBufferView;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Lock a mutex, recovering the guard if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Binary exclusion gate with timed acquisition
///
/// A mutex/condvar pair rather than a plain `Mutex` so that acquisition can
/// be bounded: a live video stream must never stall behind the gate.
pub struct Gate {
    held: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            held: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    /// Try to acquire the gate within `timeout`; `None` means the caller
    /// should skip its operation.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<GateGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut held = lock(&self.held);
        while *held {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _timed_out) = self
                .cv
                .wait_timeout(held, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
        }
        *held = true;
        Some(GateGuard { gate: self })
    }

    /// Acquire the gate, retrying forever at `retry` intervals. Used by
    /// teardown paths where resource release outweighs responsiveness.
    pub fn acquire_retry(&self, retry: Duration) -> GateGuard<'_> {
        loop {
            if let Some(guard) = self.acquire_timeout(retry) {
                return guard;
            }
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the gate on drop
pub struct GateGuard<'g> {
    gate: &'g Gate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        let mut held = lock(&self.gate.held);
        *held = false;
        self.gate.cv.notify_one();
    }
}

/// What happened to one delivered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The active effect was applied in place
    Rendered,
    /// The gate was busy past the bounded wait; the frame was skipped
    Dropped,
    /// No active slot; the buffer was left untouched
    Idle,
}

/// The one live (filter graph, render engine) pair, with its cache
struct ActiveSlot {
    engine: RenderEngine,
    cache: HashMap<u32, u32>,
}

struct Inner {
    slot: Option<ActiveSlot>,
    binding: Option<SourceBinding>,
}

/// Single authority over which effect is active and over safe transitions
/// between effects while frames are in flight
pub struct EffectController {
    gate: Arc<Gate>,
    catalog: EffectCatalog,
    config: PipelineConfig,
    index: AtomicUsize,
    inner: Mutex<Inner>,
}

impl EffectController {
    pub fn new(gate: Arc<Gate>, catalog: EffectCatalog, config: PipelineConfig) -> Self {
        Self {
            gate,
            catalog,
            config,
            index: AtomicUsize::new(0),
            inner: Mutex::new(Inner {
                slot: None,
                binding: None,
            }),
        }
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    /// Bind to a live frame source and build the slot for the current
    /// index. Rebinding tears the previous slot down first; an in-flight
    /// frame is waited out (retried until the gate is acquired).
    pub fn activate(&self, binding: SourceBinding) {
        let _gate = self.gate.acquire_retry(self.config.teardown_retry());
        let mut inner = lock(&self.inner);
        inner.slot = None;
        inner.binding = Some(binding);
        self.build_slot(&mut inner);
        info!(effect = self.current_effect_name(), "Effect controller activated");
    }

    /// Advance to the next effect with wraparound. Returns the new effect's
    /// display name, or `None` if the gate stayed busy past the bounded
    /// wait (the request is simply not applied).
    pub fn next_effect(&self) -> Option<&str> {
        self.step(1)
    }

    /// Retreat to the previous effect with wraparound; exact inverse of
    /// [`next_effect`](Self::next_effect).
    pub fn previous_effect(&self) -> Option<&str> {
        self.step(-1)
    }

    /// Jump directly to an effect index, same gating as next/previous.
    /// Panics on an out-of-range index.
    pub fn select_effect(&self, index: usize) -> Option<&str> {
        let name = self.catalog.descriptor(index).name();
        let _gate = self.gate.acquire_timeout(self.config.nav_wait())?;
        let mut inner = lock(&self.inner);
        inner.slot = None;
        self.index.store(index, Ordering::Relaxed);
        self.build_slot(&mut inner);
        debug!(index, effect = name, "Selected effect");
        Some(name)
    }

    fn step(&self, delta: isize) -> Option<&str> {
        let _gate = self.gate.acquire_timeout(self.config.nav_wait())?;
        let mut inner = lock(&self.inner);

        // Destroy the current slot before the index moves; no two slots
        // ever coexist
        inner.slot = None;

        let count = self.catalog.len() as isize;
        let current = self.index.load(Ordering::Relaxed) as isize;
        let next = (current + delta).rem_euclid(count) as usize;
        self.index.store(next, Ordering::Relaxed);

        self.build_slot(&mut inner);
        let name = self.catalog.descriptor(next).name();
        debug!(index = next, effect = name, "Switched effect");
        Some(name)
    }

    /// Apply the active effect to one frame, in place.
    ///
    /// Contention is not an error: if the gate cannot be acquired within
    /// the frame bound the frame is dropped silently. A render failure is
    /// fatal for this frame only; the caller logs it and continues.
    pub fn process_frame(&self, frame: &mut FrameBufferView<'_>) -> PipelineResult<FrameOutcome> {
        let Some(_gate) = self.gate.acquire_timeout(self.config.frame_wait()) else {
            trace!("Gate busy, dropping frame");
            return Ok(FrameOutcome::Dropped);
        };
        let mut inner = lock(&self.inner);
        let Some(slot) = inner.slot.as_mut() else {
            return Ok(FrameOutcome::Idle);
        };
        slot.engine.render(frame, &mut slot.cache)?;
        Ok(FrameOutcome::Rendered)
    }

    /// Display name of the active effect. Gate-free: the index is atomic
    /// and catalog names are immutable once built.
    pub fn current_effect_name(&self) -> &str {
        self.catalog
            .descriptor(self.index.load(Ordering::Relaxed))
            .name()
    }

    pub fn current_index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    /// Destroy the slot and the source binding. Idempotent; retries the
    /// gate until acquired so teardown never silently fails.
    pub fn deactivate(&self) {
        let gate = self.gate.acquire_retry(self.config.teardown_retry());
        self.deactivate_locked(&gate);
    }

    /// Deactivation body for callers that already hold the gate, so a
    /// larger teardown can run under one acquisition
    pub(crate) fn deactivate_locked(&self, _gate: &GateGuard<'_>) {
        let mut inner = lock(&self.inner);
        if inner.slot.is_none() && inner.binding.is_none() {
            debug!("Effect controller already deactivated");
            return;
        }
        inner.slot = None;
        inner.binding = None;
        info!("Effect controller deactivated");
    }

    /// Number of entries in the active slot's frame-derived cache, or
    /// `None` when no slot is active. Diagnostic read used by tests and
    /// status readouts.
    pub fn cache_entries(&self) -> Option<usize> {
        lock(&self.inner).slot.as_ref().map(|slot| slot.cache.len())
    }

    fn build_slot(&self, inner: &mut Inner) {
        let Some(binding) = inner.binding else {
            return;
        };
        let index = self.index.load(Ordering::Relaxed);
        let graph = self.catalog.descriptor(index).build(&binding);
        // Fresh cache with every slot; never shared across effects
        inner.slot = Some(ActiveSlot {
            engine: RenderEngine::new(graph),
            cache: HashMap::new(),
        });
    }
}
