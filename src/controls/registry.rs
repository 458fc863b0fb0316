//! Registry of live controls.
//!
//! ```text
//!   Mutex<Vec<ControlHandle>>          (structure: add / remove / clear / scan)
//!          │
//!          ├── ControlHandle { id, kind, Arc<Mutex<Control>> }   (state)
//!          ├── ControlHandle ...
//!          └── ControlHandle ...
//! ```
//!
//! Append order is z-order: later controls draw and hit-test on top.
//!
//! Lock order is always list first, then at most one control at a time.
//! No code path acquires the list lock while holding a control lock, so the
//! receive worker and the UI thread can never deadlock each other.  Radio
//! group updates hold the list lock for their whole sweep so two concurrent
//! selections cannot both survive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use super::widgets::Control;
use super::{Capability, ControlId, ControlKind};
use crate::app::ports::RenderSink;

/// Result of [`Registry::try_add`], mapped 1:1 onto wire status bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Full,
    DuplicateId,
}

impl AddOutcome {
    pub fn status(self) -> u8 {
        match self {
            Self::Added => 0,
            Self::Full => 1,
            Self::DuplicateId => 2,
        }
    }
}

/// Shared reference to one registered control.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    id: ControlId,
    kind: ControlKind,
    cell: Arc<Mutex<Control>>,
}

impl ControlHandle {
    fn new(control: Control) -> Self {
        Self {
            id: control.id.clone(),
            kind: control.kind(),
            cell: Arc::new(Mutex::new(control)),
        }
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    /// Lock the control's state.  A poisoned lock is recovered: every
    /// mutation leaves the control in a valid state.
    pub fn lock(&self) -> MutexGuard<'_, Control> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same registered control.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

/// Ordered, capacity-bounded set of controls with unique ids.
pub struct Registry {
    controls: Mutex<Vec<ControlHandle>>,
    capacity: usize,
    render: Arc<dyn RenderSink>,
}

impl Registry {
    pub fn new(capacity: usize, render: Arc<dyn RenderSink>) -> Self {
        Self {
            controls: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            render,
        }
    }

    fn list(&self) -> MutexGuard<'_, Vec<ControlHandle>> {
        self.controls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a control unless the registry is full or the id is taken.
    /// A radio button added already checked unchecks its group.
    pub fn try_add(&self, control: Control) -> AddOutcome {
        let mut list = self.list();
        if list.len() >= self.capacity {
            return AddOutcome::Full;
        }
        if list.iter().any(|h| h.id == control.id) {
            return AddOutcome::DuplicateId;
        }

        let selects_group = control
            .as_toggle()
            .is_some_and(|t| t.toggle_state())
            .then(|| control.radio_group().cloned())
            .flatten();
        let handle = ControlHandle::new(control);
        if let Some(group) = selects_group {
            clear_group(&list, &group, &handle);
        }
        debug!("REG: added {:?} ({} total)", handle.kind, list.len() + 1);
        list.push(handle);
        drop(list);

        self.render.request_redraw();
        AddOutcome::Added
    }

    /// Remove the control with this id.  Returns whether one was removed.
    pub fn remove(&self, id: &[u8]) -> bool {
        let mut list = self.list();
        let Some(pos) = list.iter().position(|h| h.id() == id) else {
            return false;
        };
        list.remove(pos);
        drop(list);

        self.render.request_redraw();
        true
    }

    pub fn clear(&self) {
        self.list().clear();
        self.render.request_redraw();
    }

    /// First control with this id that also has `capability`.
    pub fn find_where(&self, id: &[u8], capability: Capability) -> Option<ControlHandle> {
        self.list()
            .iter()
            .find(|h| h.kind.has(capability) && h.id() == id)
            .cloned()
    }

    /// Topmost control under the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<ControlHandle> {
        self.list()
            .iter()
            .rev()
            .find(|h| h.lock().contains_point(x, y))
            .cloned()
    }

    /// Run `f` on the control's state, then request a redraw.
    pub fn update<R>(&self, handle: &ControlHandle, f: impl FnOnce(&mut Control) -> R) -> R {
        let out = {
            let mut control = handle.lock();
            f(&mut *control)
        };
        self.render.request_redraw();
        out
    }

    /// Set a toggle state.  Checking a radio button unchecks every other
    /// radio button in its group.  Returns `false` if the control is not
    /// toggleable.
    pub fn set_toggle(&self, handle: &ControlHandle, state: bool) -> bool {
        let list = self.list();
        let group = {
            let mut control = handle.lock();
            let Some(toggle) = control.as_toggle_mut() else {
                return false;
            };
            toggle.set_toggle_state(state);
            control.radio_group().cloned()
        };
        if state {
            if let Some(group) = group {
                clear_group(&list, &group, handle);
            }
        }
        drop(list);

        self.render.request_redraw();
        true
    }

    /// Handles of every control, bottom to top.
    pub fn snapshot(&self) -> Vec<ControlHandle> {
        self.list().clone()
    }
}

/// Uncheck every radio button in `group` except `keep`.
fn clear_group(list: &[ControlHandle], group: &ControlId, keep: &ControlHandle) {
    for other in list.iter().filter(|h| !h.same(keep)) {
        if other.kind != ControlKind::RadioButton {
            continue;
        }
        let mut control = other.lock();
        if control.radio_group() == Some(group) {
            if let Some(toggle) = control.as_toggle_mut() {
                toggle.set_toggle_state(false);
            }
        }
    }
}
