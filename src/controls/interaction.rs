//! Local pointer handling.
//!
//! Every pointer that lands on a control is tracked until it lifts, so
//! multi-touch drives several controls at once.  A control already held by
//! one pointer ignores presses from others.  Move events are rate limited per
//! pointer; presses and releases always go out.
//!
//! Lock order: tracker map, then registry list, then one control.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use burster::Limiter;
use log::debug;

use super::registry::{ControlHandle, Registry};
use super::widgets::Followup;
use crate::rpc::image::Image;
use crate::rpc::messages::{self, PointerTag};

/// A pointer currently pressed on a control.
struct Pointer {
    target: ControlHandle,
    last: (f32, f32),
    limiter: burster::TokenBucket<fn() -> Duration>,
}

impl Pointer {
    fn new(target: ControlHandle, x: f32, y: f32) -> Self {
        Self {
            target,
            last: (x, y),
            limiter: burster::TokenBucket::new_with_time_provider(
                10,
                1, // 10 tokens per second, burst of 1
                platform_now as fn() -> Duration,
            ),
        }
    }

    /// Every event consumes a token; only moves can be refused.
    fn may_send(&mut self, tag: PointerTag) -> bool {
        let allowed = self.limiter.try_consume(1).is_ok();
        allowed || tag != PointerTag::Move
    }
}

/// Control awaiting input from the user after a tap.
#[derive(Debug, Clone)]
pub struct PendingInput {
    pub target: ControlHandle,
    pub kind: Followup,
}

/// Tracks active pointers and routes them to controls.
#[derive(Default)]
pub struct PointerTracker {
    active: Mutex<HashMap<u32, Pointer>>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pointers currently holding a control.
    pub fn active(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// A pointer touched the screen.  Event content produced by the touch is
    /// handed to `send`.
    pub fn pointer_down(
        &self,
        registry: &Registry,
        pointer: u32,
        x: f32,
        y: f32,
        send: &mut dyn FnMut(Vec<u8>),
    ) -> Option<PendingInput> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.contains_key(&pointer) {
            drop(active);
            self.pointer_move(registry, pointer, x, y, send);
            return None;
        }

        let target = registry.hit_test(x, y)?;
        if active.values().any(|p| p.target.same(&target)) {
            debug!("UI: pointer {pointer} ignored, target already held");
            return None;
        }

        let mut state = Pointer::new(target.clone(), x, y);
        let reaction = registry.update(&target, |c| {
            c.pointer_down(x, y, &mut |tag| state.may_send(tag))
        });
        if reaction.select_radio {
            registry.set_toggle(&target, true);
        }
        if let Some(message) = reaction.message {
            send(message);
        }
        active.insert(pointer, state);

        reaction.followup.map(|kind| PendingInput { target, kind })
    }

    /// A held pointer moved.
    pub fn pointer_move(
        &self,
        registry: &Registry,
        pointer: u32,
        x: f32,
        y: f32,
        send: &mut dyn FnMut(Vec<u8>),
    ) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(state) = active.get_mut(&pointer) else {
            return;
        };
        if state.last == (x, y) {
            return;
        }
        state.last = (x, y);

        let target = state.target.clone();
        let message = registry.update(&target, |c| {
            c.pointer_move(x, y, &mut |tag| state.may_send(tag))
        });
        if let Some(message) = message {
            send(message);
        }
    }

    /// A pointer lifted.
    pub fn pointer_up(&self, registry: &Registry, pointer: u32, send: &mut dyn FnMut(Vec<u8>)) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(mut state) = active.remove(&pointer) else {
            return;
        };
        let target = state.target.clone();
        let message = registry.update(&target, |c| c.pointer_up(&mut |tag| state.may_send(tag)));
        if let Some(message) = message {
            send(message);
        }
    }

    /// Forget every pointer (e.g. when the controls were cleared).
    pub fn reset(&self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// The user finished editing a text field.
pub fn submit_text(
    registry: &Registry,
    target: &ControlHandle,
    text: String,
    send: &mut dyn FnMut(Vec<u8>),
) {
    let message = registry.update(target, |c| {
        let id = c.id.clone();
        c.as_text_mut().map(|t| {
            let message = messages::text_edited(&id, &text);
            t.set_text(text);
            message
        })
    });
    if let Some(message) = message {
        send(message);
    }
}

/// The user captured a new image for an image box.
pub fn submit_image(
    registry: &Registry,
    target: &ControlHandle,
    image: Image,
    send: &mut dyn FnMut(Vec<u8>),
) {
    let updated = registry.update(target, |c| {
        c.as_image_mut()
            .map(|i| i.set_image(Arc::new(image)))
            .is_some()
    });
    if updated {
        send(messages::pressed(target.id()));
    }
}

fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
