//! Joystick gesture resolver.
//!
//! Follows one contact at a time (`Idle → Engaged → Idle`). Every move is
//! resolved into a `JoystickMove` sample immediately and written to the
//! dataset; the sample itself is coalesced and emitted once per frame.

use crate::control::{Control, ControlKind};
use crate::dataset::Dataset;
use crate::events::{ControlEvent, JoystickEnd, JoystickMove, JoystickStart, VisualUpdate};
use crate::options::{JoystickMode, JoystickOptions, JoystickShape};
use kurbo::{Point, Vec2};
use vpad_core::geometry::{
    calculate_angle, clamp_to_circle, clamp_to_square, compass_direction, distance,
    normalize_vector,
};
use vpad_core::{
    Cardinals, CompassDirection, FrameHandle, FrameScheduler, FrameTask, InputId, InputPoint,
    InputTracker, InputTransition, LocalFrame, SharedListeners,
};

#[derive(Debug)]
pub struct Joystick {
    options: JoystickOptions,
    tracker: InputTracker,
    frame: LocalFrame,
    /// The followed contact; `Some` iff engaged.
    active: Option<InputId>,
    /// Stick center for the current engagement (viewport pixels).
    center: Point,
    /// Anchored base in element-local coordinates (semi and dynamic modes).
    /// Mapped back through the current frame, so it follows scrolling.
    anchor: Option<Point>,
    last_compass: CompassDirection,
    pending: Option<JoystickMove>,
    task: FrameTask,
    dataset: Dataset,
}

impl Joystick {
    pub fn new(options: JoystickOptions) -> Self {
        Self::with_tracker(options, InputTracker::new())
    }

    pub fn with_listeners(options: JoystickOptions, listeners: SharedListeners) -> Self {
        Self::with_tracker(options, InputTracker::with_listeners(listeners))
    }

    fn with_tracker(options: JoystickOptions, tracker: InputTracker) -> Self {
        let mut stick = Self {
            options,
            tracker,
            frame: LocalFrame::default(),
            active: None,
            center: Point::ZERO,
            anchor: None,
            last_compass: CompassDirection::Neutral,
            pending: None,
            task: FrameTask::new(),
            dataset: Dataset::new(),
        };
        stick.reset_dataset(Cardinals::EMPTY);
        stick
    }

    pub fn options(&self) -> &JoystickOptions {
        &self.options
    }

    pub fn active_identifier(&self) -> Option<InputId> {
        self.active
    }

    pub fn is_engaged(&self) -> bool {
        self.active.is_some()
    }

    /// Center of the current (or last) engagement.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Anchored base position in viewport pixels, as placed on screen now.
    pub fn base(&self) -> Option<Point> {
        self.anchor.map(|local| self.frame.client_position(local))
    }

    /// Sample waiting for the next frame.
    pub fn pending(&self) -> Option<&JoystickMove> {
        self.pending.as_ref()
    }

    // ─── Engage ──────────────────────────────────────────────────────────

    fn engage(&mut self, input: &InputPoint, now: f64, out: &mut Vec<ControlEvent>) {
        if let Some(active) = self.active {
            log::trace!("joystick busy with {active}, ignoring {}", input.identifier);
            return;
        }

        let start = input.start();
        match self.options.mode {
            JoystickMode::Static => self.center = self.frame.center(),
            JoystickMode::Dynamic => self.relocate(start, out),
            JoystickMode::Semi => match self.base() {
                Some(base) if distance(start, base) <= self.options.catch_distance => {
                    log::debug!("semi joystick caught at {base:?}");
                    self.center = base;
                }
                _ => self.relocate(start, out),
            },
        }

        self.active = Some(input.identifier);
        log::debug!("joystick engaged by {} at {:?}", input.identifier, self.center);
        out.push(ControlEvent::Visual(VisualUpdate::Engaged { active: true }));
        out.push(ControlEvent::JoystickStart(JoystickStart {
            identifier: input.identifier,
            position: start,
            timestamp: now,
        }));
    }

    fn relocate(&mut self, at: Point, out: &mut Vec<ControlEvent>) {
        let local = self.frame.local_position(at);
        self.center = at;
        self.anchor = Some(local);
        out.push(ControlEvent::Visual(VisualUpdate::Anchor {
            viewport: at,
            local,
            fixed: self.options.mode == JoystickMode::Dynamic,
        }));
    }

    // ─── Move ────────────────────────────────────────────────────────────

    /// Resolve a contact position into a stick sample.
    fn resolve(&mut self, input: &InputPoint, now: f64) -> JoystickMove {
        let radius = self.options.radius();
        let threshold = self.options.threshold;

        let mut delta = input.current() - self.center;
        if self.options.lock_x {
            delta.x = 0.0;
        }
        if self.options.lock_y {
            delta.y = 0.0;
        }

        let clamped = match self.options.shape {
            JoystickShape::Circle => clamp_to_circle(delta, radius),
            JoystickShape::Square => clamp_to_square(delta, radius),
        };
        let distance = clamped.hypot();
        let force = (distance / radius).min(1.0);

        // Deadzone collapses the displacement but keeps force and distance
        let shown = if force < threshold { Vec2::ZERO } else { clamped };
        let angle = calculate_angle(shown.x, shown.y, false, false);
        let compass = compass_direction(angle.degree, force, threshold);

        let capture = Cardinals::captured(self.last_compass, compass);
        let release = Cardinals::released(self.last_compass, compass);
        self.last_compass = compass;

        JoystickMove {
            identifier: input.identifier,
            position: shown / radius,
            raw_position: shown,
            force,
            distance,
            angle,
            compass,
            vector: normalize_vector(shown),
            capture,
            release,
            timestamp: now,
        }
    }

    fn track(&mut self, input: &InputPoint, now: f64, frames: &mut dyn FrameScheduler) {
        if self.active != Some(input.identifier) {
            return;
        }
        let sample = self.resolve(input, now);
        log::trace!(
            "joystick sample force={:.3} compass={:?}",
            sample.force,
            sample.compass
        );
        self.write_dataset(&sample);
        self.pending = Some(sample);
        self.task.ensure(frames);
    }

    // ─── Disengage ───────────────────────────────────────────────────────

    fn disengage(
        &mut self,
        input: &InputPoint,
        now: f64,
        frames: &mut dyn FrameScheduler,
        out: &mut Vec<ControlEvent>,
    ) {
        if self.active != Some(input.identifier) {
            return;
        }
        self.active = None;
        self.task.cancel(frames);
        self.pending = None;

        out.push(ControlEvent::Visual(VisualUpdate::Engaged { active: false }));
        if self.options.rest_on_release {
            out.push(ControlEvent::Visual(VisualUpdate::Nub {
                offset: Vec2::ZERO,
            }));
        }

        let released = self.last_compass.cardinals();
        self.last_compass = CompassDirection::Neutral;
        self.reset_dataset(released);
        if self.options.mode == JoystickMode::Dynamic {
            self.anchor = None;
        }

        log::debug!("joystick released by {}", input.identifier);
        out.push(ControlEvent::JoystickEnd(JoystickEnd {
            identifier: input.identifier,
            release: released,
            timestamp: now,
        }));
    }

    // ─── Dataset ─────────────────────────────────────────────────────────

    fn write_dataset(&mut self, sample: &JoystickMove) {
        let ds = &mut self.dataset;
        ds.set("x", sample.position.x);
        ds.set("y", sample.position.y);
        ds.set("force", sample.force);
        ds.set("compass", sample.compass);
        ds.set("degree", sample.angle.degree);
        ds.set("capture", sample.capture);
        ds.set("release", sample.release);
    }

    fn reset_dataset(&mut self, released: Cardinals) {
        let ds = &mut self.dataset;
        ds.set("x", 0);
        ds.set("y", 0);
        ds.set("force", 0);
        ds.set("compass", "");
        ds.set("degree", 0);
        ds.set("capture", "");
        ds.set("release", released);
    }
}

impl Control for Joystick {
    fn kind(&self) -> ControlKind {
        ControlKind::Joystick
    }

    fn tracker(&self) -> &InputTracker {
        &self.tracker
    }

    fn tracker_mut(&mut self) -> &mut InputTracker {
        &mut self.tracker
    }

    fn idle_timeout(&self) -> f64 {
        self.options.idle_timeout
    }

    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn apply(
        &mut self,
        transitions: &[InputTransition],
        now: f64,
        frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent> {
        let mut out = Vec::new();
        for transition in transitions {
            match transition {
                InputTransition::Start(p) => self.engage(p, now, &mut out),
                InputTransition::Move(p) => self.track(p, now, frames),
                InputTransition::End(p) => self.disengage(p, now, frames, &mut out),
            }
        }
        out
    }

    fn on_frame(
        &mut self,
        handle: FrameHandle,
        _now: f64,
        _frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent> {
        if !self.task.accept(handle) {
            return Vec::new();
        }
        match self.pending.take() {
            Some(sample) => vec![
                ControlEvent::Visual(VisualUpdate::Nub {
                    offset: sample.raw_position,
                }),
                ControlEvent::JoystickMove(sample),
            ],
            None => Vec::new(),
        }
    }

    fn teardown(&mut self, frames: &mut dyn FrameScheduler) {
        self.task.cancel(frames);
        self.pending = None;
        self.active = None;
        self.last_compass = CompassDirection::Neutral;
        self.tracker.clear();
    }

    fn set_frame(&mut self, frame: LocalFrame) {
        self.frame = frame;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vpad_core::{FrameQueue, Phase, RawInputEvent};

    fn stick(mode: JoystickMode) -> (Joystick, FrameQueue) {
        let mut js = Joystick::new(JoystickOptions {
            mode,
            ..JoystickOptions::default()
        });
        js.set_frame(LocalFrame::new(kurbo::Rect::new(0.0, 0.0, 100.0, 100.0)));
        (js, FrameQueue::new())
    }

    fn pointer(phase: Phase, id: InputId, x: f64, y: f64) -> RawInputEvent {
        RawInputEvent::pointer(phase, id, x, y)
    }

    fn flush(js: &mut Joystick, queue: &mut FrameQueue, now: f64) -> Vec<ControlEvent> {
        let mut out = Vec::new();
        for (handle, ()) in queue.take_due() {
            out.extend(js.on_frame(handle, now, queue));
        }
        out
    }

    fn moves(events: &[ControlEvent]) -> Vec<&JoystickMove> {
        events
            .iter()
            .filter_map(|e| match e {
                ControlEvent::JoystickMove(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn static_mode_centers_on_bounds() {
        let (mut js, mut q) = stick(JoystickMode::Static);
        let out = js.handle_input(&pointer(Phase::Start, 1, 60.0, 40.0), 0.0, &mut q);
        assert_eq!(js.center(), Point::new(50.0, 50.0));
        assert!(out.iter().any(|e| e.name() == "joystick-start"));
        assert!(
            !out.iter()
                .any(|e| matches!(e, ControlEvent::Visual(VisualUpdate::Anchor { .. })))
        );
    }

    #[test]
    fn dynamic_mode_relocates_every_time() {
        let (mut js, mut q) = stick(JoystickMode::Dynamic);
        js.handle_input(&pointer(Phase::Start, 1, 10.0, 20.0), 0.0, &mut q);
        assert_eq!(js.center(), Point::new(10.0, 20.0));
        js.handle_input(&pointer(Phase::End, 1, 10.0, 20.0), 5.0, &mut q);
        assert_eq!(js.base(), None);

        let out = js.handle_input(&pointer(Phase::Start, 2, 30.0, 40.0), 10.0, &mut q);
        assert_eq!(js.center(), Point::new(30.0, 40.0));
        assert!(
            out.iter()
                .any(|e| matches!(e, ControlEvent::Visual(VisualUpdate::Anchor { .. })))
        );
    }

    #[test]
    fn semi_catch_follows_the_moved_element() {
        let (mut js, mut q) = stick(JoystickMode::Semi);
        js.handle_input(&pointer(Phase::Start, 1, 40.0, 40.0), 0.0, &mut q);
        js.handle_input(&pointer(Phase::End, 1, 40.0, 40.0), 5.0, &mut q);

        // Page scrolled: the element and its anchor are now 200px lower
        js.set_frame(LocalFrame::new(kurbo::Rect::new(0.0, 200.0, 100.0, 300.0)));
        assert_eq!(js.base(), Some(Point::new(40.0, 240.0)));

        let out = js.handle_input(&pointer(Phase::Start, 2, 45.0, 245.0), 10.0, &mut q);
        assert_eq!(js.center(), Point::new(40.0, 240.0));
        assert!(
            !out.iter()
                .any(|e| matches!(e, ControlEvent::Visual(VisualUpdate::Anchor { .. })))
        );
        js.handle_input(&pointer(Phase::End, 2, 45.0, 245.0), 15.0, &mut q);

        // The old viewport spot is now far from the anchor
        let out = js.handle_input(&pointer(Phase::Start, 3, 40.0, 40.0), 20.0, &mut q);
        assert_eq!(js.center(), Point::new(40.0, 40.0));
        assert!(out.iter().any(|e| matches!(
            e,
            ControlEvent::Visual(VisualUpdate::Anchor { fixed: false, .. })
        )));
    }

    #[test]
    fn moves_coalesce_into_one_frame() {
        let (mut js, mut q) = stick(JoystickMode::Dynamic);
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        assert!(js.handle_input(&pointer(Phase::Move, 1, 10.0, 0.0), 1.0, &mut q).is_empty());
        js.handle_input(&pointer(Phase::Move, 1, 20.0, 0.0), 2.0, &mut q);
        js.handle_input(&pointer(Phase::Move, 1, 30.0, 0.0), 3.0, &mut q);
        assert_eq!(q.len(), 1);

        let out = flush(&mut js, &mut q, 16.0);
        let samples = moves(&out);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].raw_position, Vec2::new(30.0, 0.0));
        assert_eq!(samples[0].timestamp, 3.0);
        assert!(flush(&mut js, &mut q, 32.0).is_empty());
    }

    #[test]
    fn dataset_updates_before_the_frame() {
        let (mut js, mut q) = stick(JoystickMode::Dynamic);
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        js.handle_input(&pointer(Phase::Move, 1, 0.0, -50.0), 1.0, &mut q);
        assert_eq!(js.dataset().get("compass"), Some("s"));
        assert_eq!(js.dataset().get("y"), Some("-1"));
        assert_eq!(js.dataset().get("capture"), Some("s"));
    }

    #[test]
    fn second_contact_is_ignored_while_engaged() {
        let (mut js, mut q) = stick(JoystickMode::Dynamic);
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        let out = js.handle_input(&pointer(Phase::Start, 2, 90.0, 90.0), 1.0, &mut q);
        assert!(out.is_empty());
        assert_eq!(js.active_identifier(), Some(1));

        js.handle_input(&pointer(Phase::Move, 2, 95.0, 95.0), 2.0, &mut q);
        assert!(js.pending().is_none());
        let out = js.handle_input(&pointer(Phase::End, 2, 95.0, 95.0), 3.0, &mut q);
        assert!(out.is_empty());
        assert!(js.is_engaged());
    }

    #[test]
    fn release_cancels_pending_sample() {
        let (mut js, mut q) = stick(JoystickMode::Dynamic);
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        js.handle_input(&pointer(Phase::Move, 1, 40.0, 0.0), 1.0, &mut q);
        let out = js.handle_input(&pointer(Phase::End, 1, 40.0, 0.0), 2.0, &mut q);

        assert!(q.is_empty());
        assert!(js.pending().is_none());
        let end = out
            .iter()
            .find_map(|e| match e {
                ControlEvent::JoystickEnd(end) => Some(end),
                _ => None,
            })
            .expect("joystick-end emitted");
        assert_eq!(end.release, Cardinals::E);
        assert_eq!(js.dataset().get("release"), Some("e"));
        assert_eq!(js.dataset().get("force"), Some("0"));
        assert!(out.contains(&ControlEvent::Visual(VisualUpdate::Nub {
            offset: Vec2::ZERO
        })));
    }

    #[test]
    fn no_rest_keeps_nub_in_place() {
        let mut js = Joystick::new(JoystickOptions {
            rest_on_release: false,
            ..JoystickOptions::default()
        });
        let mut q = FrameQueue::<()>::new();
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        let out = js.handle_input(&pointer(Phase::End, 1, 0.0, 0.0), 1.0, &mut q);
        assert!(
            !out.iter()
                .any(|e| matches!(e, ControlEvent::Visual(VisualUpdate::Nub { .. })))
        );
    }

    #[test]
    fn locked_axis_is_zeroed_before_clamping() {
        let mut js = Joystick::new(JoystickOptions {
            lock_y: true,
            ..JoystickOptions::default()
        });
        let mut q = FrameQueue::<()>::new();
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        js.handle_input(&pointer(Phase::Move, 1, 30.0, 40.0), 1.0, &mut q);
        let sample = js.pending().expect("sample pending");
        assert_eq!(sample.raw_position, Vec2::new(30.0, 0.0));
        assert_eq!(sample.compass, CompassDirection::E);
    }

    #[test]
    fn square_shape_clamps_per_axis() {
        let mut js = Joystick::new(JoystickOptions {
            shape: JoystickShape::Square,
            ..JoystickOptions::default()
        });
        let mut q = FrameQueue::<()>::new();
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        js.handle_input(&pointer(Phase::Move, 1, 80.0, 80.0), 1.0, &mut q);
        let sample = js.pending().expect("sample pending");
        assert_eq!(sample.raw_position, Vec2::new(50.0, 50.0));
        assert_eq!(sample.force, 1.0);
        assert_eq!(sample.compass, CompassDirection::NE);
    }

    #[test]
    fn capture_and_release_track_letters() {
        let (mut js, mut q) = stick(JoystickMode::Dynamic);
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        js.handle_input(&pointer(Phase::Move, 1, 0.0, 40.0), 1.0, &mut q);
        assert_eq!(js.pending().map(|s| s.capture), Some(Cardinals::N));

        js.handle_input(&pointer(Phase::Move, 1, 30.0, 30.0), 2.0, &mut q);
        let sample = js.pending().expect("sample pending");
        assert_eq!(sample.compass, CompassDirection::NE);
        assert_eq!(sample.capture, Cardinals::E);
        assert!(sample.release.is_empty());

        js.handle_input(&pointer(Phase::Move, 1, 40.0, 0.0), 3.0, &mut q);
        let sample = js.pending().expect("sample pending");
        assert_eq!(sample.release, Cardinals::N);
    }

    #[test]
    fn teardown_drops_everything_silently() {
        let (mut js, mut q) = stick(JoystickMode::Dynamic);
        js.handle_input(&pointer(Phase::Start, 1, 0.0, 0.0), 0.0, &mut q);
        js.handle_input(&pointer(Phase::Move, 1, 10.0, 0.0), 1.0, &mut q);
        js.teardown(&mut q);
        assert!(q.is_empty());
        assert!(!js.is_active());
        assert!(!js.is_engaged());
    }
}
