//! Time-boxed exclusive actions such as an attack swing.
//!
//! Every entity holds at most one [`ActionState`]. While the state is within
//! its duration it only gates other actions. Once it elapses, the entity's
//! update runs the state's elapse handlers in registration order on every
//! tick until one of them finishes or replaces the state.

use std::{fmt, time::Duration};

use prophecy_core::{EntityId, Event, SimTime};

use crate::World;

/// Handler invoked on every update after the state elapsed.
pub type ElapseHandler = Box<dyn FnMut(&mut World, EntityId, &mut Vec<Event>) -> ActionFlow>;

/// Handler deciding how an elapsed state gives way to a proposed successor.
pub type NextHandler =
    Box<dyn FnMut(&mut World, EntityId, ActionState, &mut Vec<Event>) -> ActionFlow>;

/// What happens to a state after its handlers ran.
#[derive(Debug)]
pub enum ActionFlow {
    /// The state stays active.
    Keep,
    /// The state is discarded.
    Finish,
    /// The state is replaced by another one.
    Replace(ActionState),
}

impl ActionFlow {
    fn then(self, next: ActionFlow) -> ActionFlow {
        match next {
            ActionFlow::Keep => self,
            other => other,
        }
    }
}

/// Named action bound to a single entity until an absolute expiry.
pub struct ActionState {
    name: String,
    expires_at: SimTime,
    on_elapse: Vec<ElapseHandler>,
    on_next: Option<NextHandler>,
}

impl ActionState {
    /// Creates a state that lasts `duration` from `now`.
    #[must_use]
    pub fn new(name: impl Into<String>, now: SimTime, duration: Duration) -> Self {
        Self {
            name: name.into(),
            expires_at: now + duration,
            on_elapse: Vec::new(),
            on_next: None,
        }
    }

    /// Registers a handler that runs once the state elapsed.
    #[must_use]
    pub fn on_elapse<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut World, EntityId, &mut Vec<Event>) -> ActionFlow + 'static,
    {
        self.on_elapse.push(Box::new(handler));
        self
    }

    /// Registers the handler consulted by [`transition`].
    #[must_use]
    pub fn on_next<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut World, EntityId, ActionState, &mut Vec<Event>) -> ActionFlow + 'static,
    {
        self.on_next = Some(Box::new(handler));
        self
    }

    /// Name of the action.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports whether the state carries `name`, ignoring case.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Absolute expiry.
    #[must_use]
    pub const fn expires_at(&self) -> SimTime {
        self.expires_at
    }

    /// Reports whether `now` still lies within the state's duration.
    #[must_use]
    pub fn is_on_duration(&self, now: SimTime) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionState")
            .field("name", &self.name)
            .field("expires_at", &self.expires_at)
            .field("on_elapse", &self.on_elapse.len())
            .field("on_next", &self.on_next.is_some())
            .finish()
    }
}

/// Makes `state` the entity's only action, replacing any previous one.
pub fn assign(world: &mut World, entity: EntityId, state: ActionState) -> bool {
    match world.entity_mut(entity) {
        Some(target) => {
            target.core.action = Some(state);
            true
        }
        None => false,
    }
}

/// Proposes `next` as the successor of the entity's current state.
///
/// Refused while the current state is within its duration. An elapsed state
/// with a next handler lets the handler decide; otherwise `next` is installed.
pub fn transition(
    world: &mut World,
    entity: EntityId,
    next: ActionState,
    out_events: &mut Vec<Event>,
) -> bool {
    let now = world.now();
    let Some(target) = world.entity_mut(entity) else {
        return false;
    };
    let Some(mut current) = target.core.action.take() else {
        target.core.action = Some(next);
        return true;
    };
    if current.is_on_duration(now) {
        target.core.action = Some(current);
        return false;
    }
    match current.on_next.take() {
        Some(mut handler) => {
            let flow = handler(world, entity, next, out_events);
            settle(world, entity, current, flow);
        }
        None => target.core.action = Some(next),
    }
    true
}

/// Runs the elapse handlers of the entity's state once it left its duration.
pub(crate) fn resolve_elapsed(world: &mut World, entity: EntityId, out_events: &mut Vec<Event>) {
    let now = world.now();
    let Some(target) = world.entity_mut(entity) else {
        return;
    };
    if !target
        .core
        .action
        .as_ref()
        .is_some_and(|state| !state.is_on_duration(now))
    {
        return;
    }
    let Some(mut state) = target.core.action.take() else {
        return;
    };

    let mut flow = ActionFlow::Keep;
    for handler in &mut state.on_elapse {
        flow = flow.then(handler(world, entity, out_events));
    }
    settle(world, entity, state, flow);
}

fn settle(world: &mut World, entity: EntityId, state: ActionState, flow: ActionFlow) {
    let Some(target) = world.entity_mut(entity) else {
        return;
    };
    match flow {
        // A handler may have installed a fresh state; it wins over the old one.
        ActionFlow::Keep => {
            if target.core.action.is_none() {
                target.core.action = Some(state);
            }
        }
        ActionFlow::Finish => {}
        ActionFlow::Replace(next) => target.core.action = Some(next),
    }
}
