//! Height transitions to and from intrinsic height
//!
//! A renderer cannot interpolate between `auto` and a pixel height, so the
//! engine measures the content at the moment of a toggle and animates
//! through that concrete number:
//!
//! ```text
//!   Closed (0) ──open──▶ Opening (px) ──duration──▶ Open (auto)
//!       ▲                                              │
//!       └──duration── Closing (px → 0 after 2 frames) ◀┘ close
//! ```
//!
//! The collapse waits two animation frames before dropping to zero so the
//! renderer observes the pixel height first. Every transition cancels the
//! pending work of the previous one, so at most one is in flight.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::scheduler::{SchedulerHandle, TaskId};

/// Rendered height of the content container
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Height {
    /// Natural height
    Auto,
    Px(f32),
}

impl Height {
    pub fn is_auto(&self) -> bool {
        matches!(self, Height::Auto)
    }

    /// Pixel value, `None` for `Auto`
    pub fn px(&self) -> Option<f32> {
        match self {
            Height::Auto => None,
            Height::Px(px) => Some(*px),
        }
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Height::Auto => f.write_str("auto"),
            Height::Px(px) => write!(f, "{px}px"),
        }
    }
}

/// Where a transition stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

impl TransitionPhase {
    pub fn is_animating(self) -> bool {
        matches!(self, TransitionPhase::Opening | TransitionPhase::Closing)
    }

    /// Whether the phase heads toward open
    pub fn is_open(self) -> bool {
        matches!(self, TransitionPhase::Opening | TransitionPhase::Open)
    }

    fn terminal(open: bool) -> Self {
        if open {
            TransitionPhase::Open
        } else {
            TransitionPhase::Closed
        }
    }

    fn settled_height(self) -> Height {
        if self.is_open() {
            Height::Auto
        } else {
            Height::Px(0.0)
        }
    }
}

/// Source of the content's full (scroll) height
pub trait ContentMeasure: Send + Sync {
    fn scroll_height(&self) -> f32;
}

impl<F> ContentMeasure for F
where
    F: Fn() -> f32 + Send + Sync,
{
    fn scroll_height(&self) -> f32 {
        self()
    }
}

/// Timing of a height transition
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransitionConfig {
    /// Transition length, in milliseconds when serialized
    #[serde(with = "crate::serde_ms")]
    pub duration: Duration,
    pub easing: Easing,
}

impl TransitionConfig {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration: Self::DEFAULT_DURATION,
            easing: Easing::default(),
        }
    }
}

/// CSS transition applied while animating
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CssTransition {
    pub duration: Duration,
    pub easing: Easing,
}

impl fmt::Display for CssTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.duration.as_millis();
        write!(
            f,
            "height {ms}ms {easing}, opacity {ms}ms {easing}",
            easing = self.easing
        )
    }
}

/// Style descriptor for the content container
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightStyle {
    pub height: Height,
    pub overflow_hidden: bool,
    /// Only present while animating
    pub transition: Option<CssTransition>,
}

impl HeightStyle {
    pub fn to_css(&self) -> String {
        let mut css = format!("height: {};", self.height);
        if self.overflow_hidden {
            css.push_str(" overflow: hidden;");
        }
        if let Some(transition) = &self.transition {
            css.push_str(&format!(" transition: {transition};"));
        }
        css
    }
}

/// Hook receiving the phase just entered
pub type PhaseCallback = Arc<dyn Fn(TransitionPhase) + Send + Sync>;

struct HeightState {
    phase: TransitionPhase,
    height: Height,
    /// Bumped on every transition and on teardown; stale callbacks bail
    generation: u64,
    timer: Option<TaskId>,
    frame: Option<TaskId>,
    on_start: Option<PhaseCallback>,
    on_end: Option<PhaseCallback>,
}

fn lock(state: &Mutex<HeightState>) -> MutexGuard<'_, HeightState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-item height transition state machine
///
/// Teardown (drop or [`HeightTransition::dispose`]) cancels any pending
/// timer or frame.
pub struct HeightTransition {
    state: Arc<Mutex<HeightState>>,
    measure: Box<dyn ContentMeasure>,
    handle: SchedulerHandle,
    config: TransitionConfig,
}

impl HeightTransition {
    /// Create an engine settled in the state matching `is_open`
    pub fn new<M>(
        is_open: bool,
        measure: M,
        handle: SchedulerHandle,
        config: TransitionConfig,
    ) -> Self
    where
        M: ContentMeasure + 'static,
    {
        let phase = TransitionPhase::terminal(is_open);
        Self {
            state: Arc::new(Mutex::new(HeightState {
                phase,
                height: phase.settled_height(),
                generation: 0,
                timer: None,
                frame: None,
                on_start: None,
                on_end: None,
            })),
            measure: Box::new(measure),
            handle,
            config,
        }
    }

    /// Called with `Opening`/`Closing` when a transition starts
    pub fn on_animation_start<F>(self, f: F) -> Self
    where
        F: Fn(TransitionPhase) + Send + Sync + 'static,
    {
        lock(&self.state).on_start = Some(Arc::new(f));
        self
    }

    /// Called with `Open`/`Closed` when a transition settles
    pub fn on_animation_end<F>(self, f: F) -> Self
    where
        F: Fn(TransitionPhase) + Send + Sync + 'static,
    {
        lock(&self.state).on_end = Some(Arc::new(f));
        self
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn phase(&self) -> TransitionPhase {
        lock(&self.state).phase
    }

    pub fn height(&self) -> Height {
        lock(&self.state).height
    }

    pub fn is_animating(&self) -> bool {
        self.phase().is_animating()
    }

    /// Whether the engine is open or opening
    pub fn is_open(&self) -> bool {
        self.phase().is_open()
    }

    pub fn style(&self) -> HeightStyle {
        let state = lock(&self.state);
        HeightStyle {
            height: state.height,
            overflow_hidden: true,
            transition: state.phase.is_animating().then_some(CssTransition {
                duration: self.config.duration,
                easing: self.config.easing,
            }),
        }
    }

    /// Feed the current open flag
    ///
    /// Only a change starts a transition; returns whether one started.
    pub fn set_open(&self, open: bool) -> bool {
        if lock(&self.state).phase.is_open() == open {
            return false;
        }

        let measured = self.measure.scroll_height();
        let entering = if open {
            TransitionPhase::Opening
        } else {
            TransitionPhase::Closing
        };

        let (generation, on_start) = {
            let mut state = lock(&self.state);
            self.cancel_pending(&mut state);
            state.generation += 1;
            state.phase = entering;
            state.height = Height::Px(measured);
            (state.generation, state.on_start.clone())
        };
        tracing::debug!(
            "HeightTransition: {:?} from {}px over {:?}",
            entering,
            measured,
            self.config.duration
        );

        if let Some(on_start) = on_start {
            on_start(entering);
        }

        if self.config.duration.is_zero() {
            settle(&self.state, &self.handle, generation);
            return true;
        }

        if !open {
            self.schedule_collapse(generation);
        }

        let weak = Arc::downgrade(&self.state);
        let handle = self.handle.clone();
        let timer = self.handle.set_timeout(self.config.duration, move || {
            if let Some(state) = weak.upgrade() {
                settle(&state, &handle, generation);
            }
        });

        match timer {
            Some(timer) => {
                let mut state = lock(&self.state);
                if state.generation == generation {
                    state.timer = Some(timer);
                }
            }
            // No scheduler to wait on
            None => settle(&self.state, &self.handle, generation),
        }
        true
    }

    /// Re-measure an open item whose content changed size
    ///
    /// Applies the measured height, then returns to `auto` on the next
    /// frame. Does nothing while closed or animating; returns whether it
    /// ran.
    pub fn recalculate(&self) -> bool {
        if lock(&self.state).phase != TransitionPhase::Open {
            return false;
        }

        let measured = self.measure.scroll_height();
        let generation = {
            let mut state = lock(&self.state);
            if state.phase != TransitionPhase::Open {
                return false;
            }
            if let Some(frame) = state.frame.take() {
                self.handle.cancel(frame);
            }
            state.height = Height::Px(measured);
            state.generation
        };
        tracing::trace!("HeightTransition: recalculated to {}px", measured);

        let weak: Weak<Mutex<HeightState>> = Arc::downgrade(&self.state);
        let frame = self.handle.request_frame(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut state = lock(&state);
            if state.generation == generation && state.phase == TransitionPhase::Open {
                state.height = Height::Auto;
                state.frame = None;
            }
        });

        let mut state = lock(&self.state);
        match frame {
            Some(frame) if state.generation == generation => state.frame = Some(frame),
            Some(_) => {}
            None => state.height = Height::Auto,
        }
        true
    }

    /// Window resize; re-measures while open
    pub fn on_resize(&self) {
        self.recalculate();
    }

    /// Cancel pending work
    ///
    /// The engine keeps its last observed state and can be driven again.
    pub fn dispose(&self) {
        let mut state = lock(&self.state);
        self.cancel_pending(&mut state);
        state.generation += 1;
    }

    fn cancel_pending(&self, state: &mut HeightState) {
        if let Some(timer) = state.timer.take() {
            self.handle.cancel(timer);
        }
        if let Some(frame) = state.frame.take() {
            self.handle.cancel(frame);
        }
    }

    /// Two nested frames, then drop to zero
    fn schedule_collapse(&self, generation: u64) {
        let weak = Arc::downgrade(&self.state);
        let handle = self.handle.clone();
        let frame = self.handle.request_frame(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if lock(&state).generation != generation {
                return;
            }

            let inner_weak = Arc::downgrade(&state);
            let second = handle.request_frame(move || {
                let Some(state) = inner_weak.upgrade() else {
                    return;
                };
                let mut state = lock(&state);
                if state.generation == generation && state.phase == TransitionPhase::Closing {
                    state.height = Height::Px(0.0);
                    state.frame = None;
                }
            });

            let mut state = lock(&state);
            if state.generation == generation {
                state.frame = second;
            }
        });

        let mut state = lock(&self.state);
        if state.generation == generation {
            state.frame = frame;
        }
    }
}

/// Finish the transition started at `generation`
fn settle(state: &Mutex<HeightState>, handle: &SchedulerHandle, generation: u64) {
    let (terminal, on_end) = {
        let mut state = lock(state);
        if state.generation != generation || !state.phase.is_animating() {
            return;
        }
        let terminal = TransitionPhase::terminal(state.phase.is_open());
        state.phase = terminal;
        state.height = terminal.settled_height();
        state.timer = None;
        if let Some(frame) = state.frame.take() {
            handle.cancel(frame);
        }
        (terminal, state.on_end.clone())
    };
    tracing::debug!("HeightTransition: settled {:?}", terminal);

    if let Some(on_end) = on_end {
        on_end(terminal);
    }
}

impl Drop for HeightTransition {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for HeightTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("HeightTransition")
            .field("phase", &state.phase)
            .field("height", &state.height)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TaskScheduler;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    type Log = Arc<Mutex<Vec<TransitionPhase>>>;

    fn engine(scheduler: &TaskScheduler, is_open: bool) -> (HeightTransition, Log, Log) {
        let starts: Log = Arc::default();
        let ends: Log = Arc::default();
        let (s, e) = (starts.clone(), ends.clone());
        let engine = HeightTransition::new(
            is_open,
            || 120.0,
            scheduler.handle(),
            TransitionConfig::default(),
        )
        .on_animation_start(move |phase| s.lock().unwrap().push(phase))
        .on_animation_end(move |phase| e.lock().unwrap().push(phase));
        (engine, starts, ends)
    }

    #[test]
    fn test_initial_state_snaps() {
        let scheduler = TaskScheduler::new();
        let (open, _, _) = engine(&scheduler, true);
        let (closed, _, _) = engine(&scheduler, false);

        assert_eq!(open.phase(), TransitionPhase::Open);
        assert_eq!(open.height(), Height::Auto);
        assert_eq!(closed.phase(), TransitionPhase::Closed);
        assert_eq!(closed.height(), Height::Px(0.0));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_open_passes_through_measured_height() {
        let scheduler = TaskScheduler::new();
        let (engine, starts, ends) = engine(&scheduler, false);

        assert!(engine.set_open(true));
        assert_eq!(engine.phase(), TransitionPhase::Opening);
        assert_eq!(engine.height(), Height::Px(120.0));
        assert!(engine.is_animating());

        scheduler.advance(ms(299));
        assert_eq!(engine.phase(), TransitionPhase::Opening);

        scheduler.advance(ms(1));
        assert_eq!(engine.phase(), TransitionPhase::Open);
        assert_eq!(engine.height(), Height::Auto);
        assert!(!engine.is_animating());

        assert_eq!(
            starts.lock().unwrap().as_slice(),
            &[TransitionPhase::Opening]
        );
        assert_eq!(ends.lock().unwrap().as_slice(), &[TransitionPhase::Open]);
    }

    #[test]
    fn test_close_collapses_after_two_frames() {
        let scheduler = TaskScheduler::new();
        let (engine, _, ends) = engine(&scheduler, true);

        assert!(engine.set_open(false));
        assert_eq!(engine.phase(), TransitionPhase::Closing);
        assert_eq!(engine.height(), Height::Px(120.0));

        scheduler.run_frame();
        assert_eq!(engine.height(), Height::Px(120.0));
        scheduler.run_frame();
        assert_eq!(engine.height(), Height::Px(0.0));
        assert!(engine.is_animating());

        scheduler.advance(ms(300));
        assert_eq!(engine.phase(), TransitionPhase::Closed);
        assert_eq!(engine.height(), Height::Px(0.0));
        assert_eq!(ends.lock().unwrap().as_slice(), &[TransitionPhase::Closed]);
    }

    #[test]
    fn test_close_completes_without_frames() {
        let scheduler = TaskScheduler::new();
        let (engine, _, _) = engine(&scheduler, true);

        engine.set_open(false);
        scheduler.advance(ms(300));

        assert_eq!(engine.phase(), TransitionPhase::Closed);
        assert_eq!(engine.height(), Height::Px(0.0));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_same_value_does_not_retrigger() {
        let scheduler = TaskScheduler::new();
        let (engine, starts, _) = engine(&scheduler, false);

        assert!(!engine.set_open(false));
        assert!(engine.set_open(true));
        assert!(!engine.set_open(true));
        scheduler.advance(ms(300));
        assert!(!engine.set_open(true));

        assert_eq!(starts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rapid_toggle_reaches_one_terminal_state() {
        let scheduler = TaskScheduler::new();
        let (engine, starts, ends) = engine(&scheduler, false);

        engine.set_open(true);
        scheduler.advance(ms(100));
        engine.set_open(false);

        scheduler.advance(ms(250));
        assert_eq!(engine.phase(), TransitionPhase::Closing);

        scheduler.run_frame();
        scheduler.run_frame();
        scheduler.advance(ms(1000));

        assert_eq!(engine.phase(), TransitionPhase::Closed);
        assert_eq!(
            starts.lock().unwrap().as_slice(),
            &[TransitionPhase::Opening, TransitionPhase::Closing]
        );
        assert_eq!(ends.lock().unwrap().as_slice(), &[TransitionPhase::Closed]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_reopen_cancels_collapse_frames() {
        let scheduler = TaskScheduler::new();
        let (engine, _, _) = engine(&scheduler, true);

        engine.set_open(false);
        scheduler.run_frame();
        engine.set_open(true);
        scheduler.run_frame();

        // The pending collapse frame must not zero an opening item
        assert_eq!(engine.height(), Height::Px(120.0));
        scheduler.advance(ms(300));
        assert_eq!(engine.height(), Height::Auto);
    }

    #[test]
    fn test_recalculate_only_when_settled_open() {
        let scheduler = TaskScheduler::new();
        let size = Arc::new(Mutex::new(80.0f32));
        let measured = size.clone();
        let engine = HeightTransition::new(
            false,
            move || *measured.lock().unwrap(),
            scheduler.handle(),
            TransitionConfig::default(),
        );

        assert!(!engine.recalculate());
        engine.set_open(true);
        assert!(!engine.recalculate());
        scheduler.advance(ms(300));

        *size.lock().unwrap() = 200.0;
        assert!(engine.recalculate());
        assert_eq!(engine.height(), Height::Px(200.0));
        assert!(!engine.is_animating());
        scheduler.run_frame();
        assert_eq!(engine.height(), Height::Auto);
    }

    #[test]
    fn test_resize_leaves_closed_and_animating_alone() {
        let scheduler = TaskScheduler::new();
        let size = Arc::new(Mutex::new(60.0f32));
        let measured = size.clone();
        let engine = HeightTransition::new(
            false,
            move || *measured.lock().unwrap(),
            scheduler.handle(),
            TransitionConfig::default(),
        );

        *size.lock().unwrap() = 90.0;
        engine.on_resize();
        assert_eq!(engine.height(), Height::Px(0.0));
        assert!(!scheduler.has_pending());

        engine.set_open(true);
        engine.on_resize();
        assert_eq!(engine.height(), Height::Px(90.0));
        assert_eq!(engine.phase(), TransitionPhase::Opening);

        scheduler.advance(ms(300));
        assert_eq!(engine.height(), Height::Auto);
        *size.lock().unwrap() = 140.0;
        engine.on_resize();
        assert_eq!(engine.height(), Height::Px(140.0));
        scheduler.run_frame();
        assert_eq!(engine.height(), Height::Auto);
    }

    #[test]
    fn test_zero_duration_snaps_with_hooks() {
        let scheduler = TaskScheduler::new();
        let starts: Log = Arc::default();
        let ends: Log = Arc::default();
        let (s, e) = (starts.clone(), ends.clone());
        let engine = HeightTransition::new(
            false,
            || 50.0,
            scheduler.handle(),
            TransitionConfig::default().with_duration(Duration::ZERO),
        )
        .on_animation_start(move |phase| s.lock().unwrap().push(phase))
        .on_animation_end(move |phase| e.lock().unwrap().push(phase));

        assert!(engine.set_open(true));
        assert_eq!(engine.phase(), TransitionPhase::Open);
        assert_eq!(engine.height(), Height::Auto);
        assert_eq!(
            starts.lock().unwrap().as_slice(),
            &[TransitionPhase::Opening]
        );
        assert_eq!(ends.lock().unwrap().as_slice(), &[TransitionPhase::Open]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_drop_cancels_pending_work() {
        let scheduler = TaskScheduler::new();
        let (engine, _, ends) = engine(&scheduler, true);

        engine.set_open(false);
        assert!(scheduler.has_pending());
        drop(engine);

        assert!(!scheduler.has_pending());
        scheduler.run_frame();
        scheduler.advance(ms(300));
        assert!(ends.lock().unwrap().is_empty());
    }

    #[test]
    fn test_style_css() {
        let scheduler = TaskScheduler::new();
        let (engine, _, _) = engine(&scheduler, false);

        assert_eq!(engine.style().to_css(), "height: 0px; overflow: hidden;");
        engine.set_open(true);
        assert_eq!(
            engine.style().to_css(),
            "height: 120px; overflow: hidden; \
             transition: height 300ms ease-out, opacity 300ms ease-out;"
        );
        scheduler.advance(ms(300));
        assert_eq!(engine.style().to_css(), "height: auto; overflow: hidden;");
    }

    #[test]
    fn test_dead_scheduler_settles_immediately() {
        let scheduler = TaskScheduler::new();
        let handle = scheduler.handle();
        drop(scheduler);

        let engine = HeightTransition::new(false, || 10.0, handle, TransitionConfig::default());
        assert!(engine.set_open(true));
        assert_eq!(engine.phase(), TransitionPhase::Open);
    }

    #[test]
    fn test_config_serde_millis() {
        let config: TransitionConfig =
            serde_json::from_str(r#"{"duration": 150, "easing": "ease-in"}"#).unwrap();
        assert_eq!(config.duration, ms(150));
        assert_eq!(config.easing, Easing::EaseIn);

        let json = serde_json::to_string(&TransitionConfig::default()).unwrap();
        assert_eq!(json, r#"{"duration":300,"easing":"ease-out"}"#);
    }
}
