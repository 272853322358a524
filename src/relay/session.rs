//! Per-connection session worker.
//!
//! Each session processes its messages strictly in order: mirror the raw
//! payload to all peers, then (focus permitting) route it through the
//! translation engine. All shared-state mutation happens under the engine
//! lock and produces a list of plain actuation steps; the OS calls (and the
//! synthetic click hold) run after the lock is dropped.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::actuate::{Actuator, MouseButton, ScrollDirection};
use crate::engine::gesture::{CLICK_HOLD, MOVEMENT_EPSILON};
use crate::engine::{
    self, debounce, ActuationIntent, Binding, Channel, EngineContext, PointerFilter,
    PointerOutput, ScrollGate, SharedEngine,
};
use crate::relay::message::{
    self, ControllerFrame, ControllerSnapshot, InboundMessage, KeyAction, MotionKeyCommand,
};
use crate::relay::server::SessionRegistry;

/// One actuation step, collected under the lock and executed after it.
#[derive(Debug)]
enum Act {
    Intent(ActuationIntent),
    Scroll(ScrollDirection),
    MoveBy { dx: i32, dy: i32 },
    QuickClick(MouseButton),
}

pub struct Session {
    id: u64,
    engine: SharedEngine,
    actuator: Arc<dyn Actuator>,
    focus: watch::Receiver<bool>,
    registry: Arc<SessionRegistry>,
    pointer: PointerFilter,
    scroll_up: ScrollGate,
    scroll_down: ScrollGate,
}

impl Session {
    pub fn new(
        id: u64,
        engine: SharedEngine,
        actuator: Arc<dyn Actuator>,
        focus: watch::Receiver<bool>,
        registry: Arc<SessionRegistry>,
        mouse_sensitivity: f32,
    ) -> Self {
        Self {
            id,
            engine,
            actuator,
            focus,
            registry,
            pointer: PointerFilter::new(mouse_sensitivity),
            scroll_up: ScrollGate::new(ScrollDirection::Up),
            scroll_down: ScrollGate::new(ScrollDirection::Down),
        }
    }

    /// Session startup: any input held over from a previous session (or a
    /// mid-flight reconnect) is released before the first message is
    /// processed. Runs before the receive loop.
    pub fn start(&self) {
        engine::release_all(&self.engine, self.actuator.as_ref());
        debug!("session {} starting with a clean input state", self.id);
    }

    /// Processes one inbound text payload.
    pub async fn handle_text(&mut self, text: &str) {
        // Peer mirroring happens before any local routing and regardless of
        // focus, so companion clients always see the full stream.
        self.registry.broadcast(self.id, text);

        let parsed = match message::parse(text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("session {} dropped malformed message: {}", self.id, e);
                return;
            }
        };

        let focused = *self.focus.borrow();
        match parsed {
            InboundMessage::KeyCommand(cmd) => {
                if focused {
                    self.handle_key_command(&cmd);
                } else {
                    debug!("session {} skipped key command, target unfocused", self.id);
                }
            }
            InboundMessage::Controllers(frame) => {
                if focused {
                    self.handle_controllers(&frame).await;
                } else {
                    // Mirrors the hard gate: nothing reaches the engine and
                    // whatever was held comes up.
                    engine::release_all(&self.engine, self.actuator.as_ref());
                }
            }
            InboundMessage::MirrorOnly => {}
        }
    }

    /// Session teardown: release everything this process holds down and
    /// leave the active set. Runs on every exit path, graceful or not.
    pub fn finish(self) {
        self.registry.remove(self.id);
        engine::release_all(&self.engine, self.actuator.as_ref());
        debug!("session {} cleaned up", self.id);
    }

    /// Raw chord command: modifiers down in declaration order before the
    /// key; on release the key first, then modifiers reversed.
    fn handle_key_command(&self, cmd: &MotionKeyCommand) {
        info!(
            "session {} key command: {:?} {}",
            self.id,
            cmd.action,
            cmd.modifiers
                .iter()
                .chain(std::iter::once(&cmd.key))
                .cloned()
                .collect::<Vec<_>>()
                .join("+")
        );

        match cmd.action {
            KeyAction::Press => {
                for modifier in &cmd.modifiers {
                    if let Err(e) = self.actuator.key_down(modifier) {
                        error!("failed to press modifier {}: {}", modifier, e);
                    }
                }
                if let Err(e) = self.actuator.key_down(&cmd.key) {
                    error!("failed to press key {}: {}", cmd.key, e);
                }
            }
            KeyAction::Release => {
                if let Err(e) = self.actuator.key_up(&cmd.key) {
                    error!("failed to release key {}: {}", cmd.key, e);
                }
                for modifier in cmd.modifiers.iter().rev() {
                    if let Err(e) = self.actuator.key_up(modifier) {
                        error!("failed to release modifier {}: {}", modifier, e);
                    }
                }
            }
        }
    }

    async fn handle_controllers(&mut self, frame: &ControllerFrame) {
        let now = Instant::now();

        let engine = Arc::clone(&self.engine);
        let acts = {
            let mut ctx = match engine.lock() {
                Ok(ctx) => ctx,
                Err(poisoned) => poisoned.into_inner(),
            };
            let mut acts = Vec::new();
            if let Some(left) = &frame.left {
                self.route_left(&mut ctx, left, now, &mut acts);
            }
            if let Some(right) = &frame.right {
                self.route_right(&mut ctx, right, now, &mut acts);
            }
            acts
        };

        self.execute(acts).await;
    }

    /// Left controller: thumbstick axes become the four movement channels,
    /// Y is jump, X is tab, a thumbstick click scrolls up.
    fn route_left(
        &mut self,
        ctx: &mut EngineContext,
        snap: &ControllerSnapshot,
        now: Instant,
        acts: &mut Vec<Act>,
    ) {
        if let Some((x, y)) = snap.axis_pair() {
            let (left, right) = debounce::split_axis(x);
            push_intent(acts, debounce::update(&mut ctx.channels, Channel::Left, left));
            push_intent(
                acts,
                debounce::update(&mut ctx.channels, Channel::Right, right),
            );

            let (forward, backward) = debounce::split_axis(y);
            push_intent(
                acts,
                debounce::update(&mut ctx.channels, Channel::Forward, forward),
            );
            push_intent(
                acts,
                debounce::update(&mut ctx.channels, Channel::Backward, backward),
            );
        }

        if snap.buttons.is_some() {
            push_intent(
                acts,
                debounce::update(&mut ctx.channels, Channel::Jump, snap.button("Y")),
            );
            push_intent(
                acts,
                debounce::update(&mut ctx.channels, Channel::Tab, snap.button("X")),
            );

            if let Some(dir) = self.scroll_up.tick(snap.button("thumbstick"), now) {
                acts.push(Act::Scroll(dir));
            }
        }
    }

    /// Right controller: grip/trigger feed the gesture machines and select
    /// the drag button, the trigger additionally drives the left-click
    /// channel, a thumbstick click scrolls down and the axes drive the
    /// pointer filter.
    fn route_right(
        &mut self,
        ctx: &mut EngineContext,
        snap: &ControllerSnapshot,
        now: Instant,
        acts: &mut Vec<Act>,
    ) {
        let mut grip_active = false;
        let mut trigger_active = false;

        if snap.buttons.is_some() {
            let grip_raw = snap.button("grip");
            let trigger_raw = snap.button("trigger");
            grip_active = grip_raw > ctx.channels.threshold(Channel::Spare);
            trigger_active = trigger_raw > ctx.channels.threshold(Channel::LeftClick);

            if let Some(dir) = self.scroll_down.tick(snap.button("thumbstick"), now) {
                acts.push(Act::Scroll(dir));
            }

            if let Some(click) = ctx.grip.update(grip_active, now) {
                acts.push(Act::QuickClick(click.button));
            }
            if let Some(click) = ctx.trigger.update(trigger_active, now) {
                acts.push(Act::QuickClick(click.button));
            }

            push_intent(
                acts,
                debounce::update(&mut ctx.channels, Channel::LeftClick, trigger_raw),
            );
        }

        let axis = snap.axis_pair();
        let moving = axis
            .map(|(x, y)| x.abs() > MOVEMENT_EPSILON || y.abs() > MOVEMENT_EPSILON)
            .unwrap_or(false);

        if moving {
            ctx.grip.observe_movement();
            ctx.trigger.observe_movement();

            // Grip wins over trigger when both would drag.
            let hold = if grip_active {
                Some(MouseButton::Right)
            } else if trigger_active {
                Some(MouseButton::Left)
            } else {
                None
            };

            let (x, y) = axis.unwrap_or((0.0, 0.0));
            match self.pointer.filter(x, y, now) {
                PointerOutput::Move { dx, dy } => {
                    self.update_drag(ctx, hold, acts);
                    acts.push(Act::MoveBy { dx, dy });
                }
                PointerOutput::Neutral => {
                    self.update_drag(ctx, None, acts);
                }
                PointerOutput::Rejected => {}
            }
        } else {
            // Stick neutral: a drag only survives while its gesture button
            // is still held.
            if let Some(held) = ctx.drag {
                let keep = match held {
                    MouseButton::Right => grip_active,
                    MouseButton::Left => trigger_active,
                };
                if !keep {
                    ctx.drag = None;
                    acts.push(Act::Intent(ActuationIntent::Release(Binding::Mouse(held))));
                }
            }

            // Grip held without stick movement still holds the right button.
            if grip_active && ctx.drag != Some(MouseButton::Right) {
                self.update_drag(ctx, Some(MouseButton::Right), acts);
            }
        }
    }

    /// Moves the drag bookkeeping to `hold`, releasing the other button
    /// first (buttons are mutually exclusive during drag). The button-down
    /// is re-sent on every accepted frame; that is idempotent at the OS
    /// level and guarantees the hold survives missed frames.
    fn update_drag(
        &self,
        ctx: &mut EngineContext,
        hold: Option<MouseButton>,
        acts: &mut Vec<Act>,
    ) {
        if let Some(held) = ctx.drag {
            if hold != Some(held) {
                acts.push(Act::Intent(ActuationIntent::Release(Binding::Mouse(held))));
            }
        }
        if let Some(button) = hold {
            acts.push(Act::Intent(ActuationIntent::Press(Binding::Mouse(button))));
        }
        ctx.drag = hold;
    }

    /// Runs the collected steps in order. The quick-click hold is a bounded
    /// stall for this session only; other sessions keep processing.
    async fn execute(&self, acts: Vec<Act>) {
        for act in acts {
            match act {
                Act::Intent(intent) => engine::apply_intent(self.actuator.as_ref(), &intent),
                Act::Scroll(direction) => {
                    debug!("session {} scroll tick {:?}", self.id, direction);
                    if let Err(e) = self.actuator.scroll(direction) {
                        error!("scroll actuation failed: {}", e);
                    }
                }
                Act::MoveBy { dx, dy } => match self.actuator.cursor_pos() {
                    Ok((x, y)) => {
                        if let Err(e) = self.actuator.move_cursor_to(x + dx, y + dy) {
                            error!("cursor move failed: {}", e);
                        }
                    }
                    Err(e) => error!("cursor position unavailable: {}", e),
                },
                Act::QuickClick(button) => {
                    debug!("session {} quick {} click", self.id, button);
                    if let Err(e) = self.actuator.button_down(button) {
                        error!("quick click press failed: {}", e);
                    }
                    tokio::time::sleep(CLICK_HOLD).await;
                    if let Err(e) = self.actuator.button_up(button) {
                        error!("quick click release failed: {}", e);
                    }
                }
            }
        }
    }
}

fn push_intent(acts: &mut Vec<Act>, intent: Option<ActuationIntent>) {
    if let Some(intent) = intent {
        acts.push(Act::Intent(intent));
    }
}
