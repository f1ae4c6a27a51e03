//! Form event buses
//!
//! Every form owns a pair of buses. The internal bus carries per-field
//! signals raised by handles and host components; the external bus is what
//! the host application listens to. [`Buses`] bridges the two:
//!
//! - `field:busy`/`field:idle` feed a deduplicated busy queue, and the
//!   external bus sees `busy` when it stops being empty and `idle` when it
//!   empties again
//! - `field:invalid`/`field:valid` do the same through an invalid queue,
//!   surfacing as `invalid`/`valid`
//! - change, removal and lifecycle events are relayed unchanged
//! - the host's `field:edit`/`field:delete` requests travel the other way,
//!   from the external bus to the components listening on the internal one
//!
//! ```rust
//! use formloom_core::events::{Buses, EventPayload, ExternalEvent, InternalEvent};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let buses = Buses::new();
//! let busy = Arc::new(AtomicUsize::new(0));
//! let counter = busy.clone();
//! buses.external().on(ExternalEvent::Busy, move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! buses.internal().emit(InternalEvent::FieldBusy, &EventPayload::component("a"));
//! buses.internal().emit(InternalEvent::FieldBusy, &EventPayload::component("b"));
//! assert_eq!(busy.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value as Json;
use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::datum::Datum;

/// Events delivered to the host application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExternalEvent {
    Change,
    Busy,
    Idle,
    Valid,
    Invalid,
    FieldChange,
    FieldRemoved,
    FormInitialised,
    FormRemoved,
    /// Host request to edit a field, forwarded to components
    FieldEdit,
    /// Host request to delete a field, forwarded to components
    FieldDelete,
}

/// Events exchanged between handles, components and the aggregation queues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InternalEvent {
    FieldBusy,
    FieldIdle,
    FieldValid,
    FieldInvalid,
    FieldChange,
    FieldRemoved,
    FormInitialised,
    FormRemoved,
    FieldEdit,
    FieldDelete,
}

impl ExternalEvent {
    pub const ALL: [ExternalEvent; 11] = [
        ExternalEvent::Change,
        ExternalEvent::Busy,
        ExternalEvent::Idle,
        ExternalEvent::Valid,
        ExternalEvent::Invalid,
        ExternalEvent::FieldChange,
        ExternalEvent::FieldRemoved,
        ExternalEvent::FormInitialised,
        ExternalEvent::FormRemoved,
        ExternalEvent::FieldEdit,
        ExternalEvent::FieldDelete,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ExternalEvent::Change => "change",
            ExternalEvent::Busy => "busy",
            ExternalEvent::Idle => "idle",
            ExternalEvent::Valid => "valid",
            ExternalEvent::Invalid => "invalid",
            ExternalEvent::FieldChange => "field:change",
            ExternalEvent::FieldRemoved => "field:removed",
            ExternalEvent::FormInitialised => "form:initialised",
            ExternalEvent::FormRemoved => "form:removed",
            ExternalEvent::FieldEdit => "field:edit",
            ExternalEvent::FieldDelete => "field:delete",
        }
    }
}

impl InternalEvent {
    pub const ALL: [InternalEvent; 10] = [
        InternalEvent::FieldBusy,
        InternalEvent::FieldIdle,
        InternalEvent::FieldValid,
        InternalEvent::FieldInvalid,
        InternalEvent::FieldChange,
        InternalEvent::FieldRemoved,
        InternalEvent::FormInitialised,
        InternalEvent::FormRemoved,
        InternalEvent::FieldEdit,
        InternalEvent::FieldDelete,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            InternalEvent::FieldBusy => "field:busy",
            InternalEvent::FieldIdle => "field:idle",
            InternalEvent::FieldValid => "field:valid",
            InternalEvent::FieldInvalid => "field:invalid",
            InternalEvent::FieldChange => "field:change",
            InternalEvent::FieldRemoved => "field:removed",
            InternalEvent::FormInitialised => "form:initialised",
            InternalEvent::FormRemoved => "form:removed",
            InternalEvent::FieldEdit => "field:edit",
            InternalEvent::FieldDelete => "field:delete",
        }
    }
}

/// Error for an unrecognised event name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event `{}`", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

macro_rules! event_names {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownEvent;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|event| event.name() == s)
                    .ok_or_else(|| UnknownEvent(s.to_string()))
            }
        }
    };
}

event_names!(ExternalEvent);
event_names!(InternalEvent);

/// Data attached to an emitted event
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventPayload {
    #[default]
    None,
    /// A component id, used by the busy and validity signals
    Component(String),
    /// A field or container addressed by name path
    Field { name_path: String, value: Option<Json> },
    /// A full form snapshot
    State(Datum),
    Custom(Json),
}

impl EventPayload {
    pub fn component(id: impl Into<String>) -> Self {
        EventPayload::Component(id.into())
    }

    pub fn field(name_path: impl Into<String>, value: Option<Json>) -> Self {
        EventPayload::Field {
            name_path: name_path.into(),
            value,
        }
    }

    /// The id the aggregation queues key on
    pub fn id(&self) -> Option<&str> {
        match self {
            EventPayload::Component(id) => Some(id),
            EventPayload::Field { name_path, .. } => Some(name_path),
            _ => None,
        }
    }
}

new_key_type! {
    /// Handle returned by [`Bus::on`]
    pub struct HandlerId;
}

pub type EventHandler = Arc<dyn Fn(&EventPayload) + Send + Sync>;

struct Registry<E> {
    ids: SlotMap<HandlerId, E>,
    handlers: FxHashMap<E, Vec<(HandlerId, EventHandler)>>,
}

/// A typed publish/subscribe channel
pub struct Bus<E> {
    registry: Mutex<Registry<E>>,
}

impl<E> Bus<E>
where
    E: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                ids: SlotMap::with_key(),
                handlers: FxHashMap::default(),
            }),
        }
    }

    /// Register a handler for an event
    pub fn on<F>(&self, event: E, handler: F) -> HandlerId
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.ids.insert(event);
        registry
            .handlers
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not registered for `event`
    pub fn off(&self, event: E, id: HandlerId) -> bool {
        let mut registry = self.registry.lock();
        if registry.ids.get(id) != Some(&event) {
            return false;
        }
        registry.ids.remove(id);
        if let Some(handlers) = registry.handlers.get_mut(&event) {
            handlers.retain(|(handler, _)| *handler != id);
        }
        true
    }

    /// Call every handler of `event` in registration order.
    ///
    /// Handlers run outside the registry lock, so they may emit, subscribe
    /// or unsubscribe themselves. Returns the number of handlers called.
    pub fn emit(&self, event: E, payload: &EventPayload) -> usize {
        let handlers: Vec<EventHandler> = self
            .registry
            .lock()
            .handlers
            .get(&event)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn handler_count(&self, event: E) -> usize {
        self.registry
            .lock()
            .handlers
            .get(&event)
            .map_or(0, Vec::len)
    }
}

impl<E> Default for Bus<E>
where
    E: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A deduplicated set of component ids
#[derive(Default)]
struct Queue {
    members: Mutex<FxHashSet<String>>,
}

impl Queue {
    /// Insert `id`; true when the queue went from empty to non-empty
    fn enter(&self, id: &str) -> bool {
        let mut members = self.members.lock();
        let was_empty = members.is_empty();
        members.insert(id.to_string()) && was_empty
    }

    /// Remove `id`; true when this removal emptied the queue
    fn leave(&self, id: &str) -> bool {
        let mut members = self.members.lock();
        members.remove(id) && members.is_empty()
    }

    fn len(&self) -> usize {
        self.members.lock().len()
    }
}

/// The internal/external bus pair of one form
pub struct Buses {
    internal: Arc<Bus<InternalEvent>>,
    external: Arc<Bus<ExternalEvent>>,
    busy: Arc<Queue>,
    invalid: Arc<Queue>,
}

impl Buses {
    pub fn new() -> Self {
        let buses = Self {
            internal: Arc::new(Bus::new()),
            external: Arc::new(Bus::new()),
            busy: Arc::new(Queue::default()),
            invalid: Arc::new(Queue::default()),
        };
        buses.wire_queue(
            &buses.busy,
            (InternalEvent::FieldBusy, ExternalEvent::Busy),
            (InternalEvent::FieldIdle, ExternalEvent::Idle),
        );
        buses.wire_queue(
            &buses.invalid,
            (InternalEvent::FieldInvalid, ExternalEvent::Invalid),
            (InternalEvent::FieldValid, ExternalEvent::Valid),
        );
        for (from, to) in [
            (InternalEvent::FieldChange, ExternalEvent::FieldChange),
            (InternalEvent::FieldRemoved, ExternalEvent::FieldRemoved),
            (InternalEvent::FormInitialised, ExternalEvent::FormInitialised),
            (InternalEvent::FormRemoved, ExternalEvent::FormRemoved),
        ] {
            let external = Arc::downgrade(&buses.external);
            buses.internal.on(from, move |payload| {
                if let Some(external) = external.upgrade() {
                    external.emit(to, payload);
                }
            });
        }
        for (from, to) in [
            (ExternalEvent::FieldEdit, InternalEvent::FieldEdit),
            (ExternalEvent::FieldDelete, InternalEvent::FieldDelete),
        ] {
            let internal = Arc::downgrade(&buses.internal);
            buses.external.on(from, move |payload| {
                if let Some(internal) = internal.upgrade() {
                    internal.emit(to, payload);
                }
            });
        }
        buses
    }

    /// Hook `enter`/`leave` signals of a queue to its external transitions
    fn wire_queue(
        &self,
        queue: &Arc<Queue>,
        (enter, on_first): (InternalEvent, ExternalEvent),
        (leave, on_empty): (InternalEvent, ExternalEvent),
    ) {
        let (entering, external) = (Arc::downgrade(queue), Arc::downgrade(&self.external));
        self.internal.on(enter, move |payload| {
            let (Some(queue), Some(id)) = (entering.upgrade(), payload.id()) else {
                return;
            };
            if queue.enter(id) {
                debug!(%id, event = %on_first, "queue no longer empty");
                if let Some(external) = external.upgrade() {
                    external.emit(on_first, payload);
                }
            }
        });

        let (leaving, external) = (Arc::downgrade(queue), Arc::downgrade(&self.external));
        self.internal.on(leave, move |payload| {
            let (Some(queue), Some(id)) = (leaving.upgrade(), payload.id()) else {
                return;
            };
            if queue.leave(id) {
                debug!(%id, event = %on_empty, "queue emptied");
                if let Some(external) = external.upgrade() {
                    external.emit(on_empty, payload);
                }
            }
        });
    }

    pub fn internal(&self) -> &Arc<Bus<InternalEvent>> {
        &self.internal
    }

    pub fn external(&self) -> &Arc<Bus<ExternalEvent>> {
        &self.external
    }

    /// Components currently reporting busy
    pub fn busy_count(&self) -> usize {
        self.busy.len()
    }

    /// Components currently reporting invalid
    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }
}

impl Default for Buses {
    fn default() -> Self {
        Self::new()
    }
}
