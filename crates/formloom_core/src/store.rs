//! Form store
//!
//! Holds the current AST snapshot and applies batches of actions to it.
//! A batch is folded through the reducer as one transition: subscribers see
//! a single new version per batch and never an intermediate state.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, warn};

use crate::action::Action;
use crate::datum::Datum;
use crate::error::{FormError, Result};
use crate::reducer::reduce_batch;
use crate::settings::ReentrancyPolicy;

new_key_type! {
    /// Handle returned by [`Store::subscribe`]
    pub struct ListenerId;
}

/// Called with the new state after every applied batch
pub type Listener = Arc<dyn Fn(&Datum) + Send + Sync>;

/// Called once with the state a batch produced
pub type AfterApply = Box<dyn FnOnce(&Datum) + Send>;

/// What became of a submitted batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    /// Submitted from inside a notification round; applied once it is over
    Queued,
}

#[derive(Default)]
struct Listeners {
    ids: SlotMap<ListenerId, ()>,
    /// Registration order
    entries: Vec<(ListenerId, Listener)>,
}

struct Pending {
    actions: Vec<Action>,
    after: Option<AfterApply>,
}

pub struct Store {
    state: RwLock<Datum>,
    version: AtomicU64,
    listeners: Mutex<Listeners>,
    pending: Mutex<VecDeque<Pending>>,
    /// Serializes dispatches across threads; the cell counts nesting on the
    /// thread that holds it
    dispatch: ReentrantMutex<Cell<usize>>,
    policy: ReentrancyPolicy,
}

impl Store {
    pub fn new(initial: Datum) -> Self {
        Self::with_policy(initial, ReentrancyPolicy::default())
    }

    pub fn with_policy(initial: Datum, policy: ReentrancyPolicy) -> Self {
        Self {
            state: RwLock::new(initial),
            version: AtomicU64::new(0),
            listeners: Mutex::new(Listeners::default()),
            pending: Mutex::new(VecDeque::new()),
            dispatch: ReentrantMutex::new(Cell::new(0)),
            policy,
        }
    }

    /// Current snapshot (O(1) clone)
    pub fn state(&self) -> Datum {
        self.state.read().clone()
    }

    /// Number of batches applied so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> ReentrancyPolicy {
        self.policy
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Datum) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let id = listeners.ids.insert(());
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the id was already gone
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.ids.remove(id).is_none() {
            return false;
        }
        listeners.entries.retain(|(entry, _)| *entry != id);
        true
    }

    pub fn dispatch(&self, action: Action) -> Result<()> {
        self.batch_dispatch(vec![action])
    }

    /// Apply `actions` as one atomic transition.
    ///
    /// On error nothing changes: the state, the version and the listeners
    /// are left as they were. Dispatches from other threads wait for the
    /// current one to finish. A dispatch made on the dispatching thread
    /// itself (from a listener) is handled according to the store's
    /// [`ReentrancyPolicy`]; queued batches are applied in FIFO order once
    /// the current notification round is over, and their errors are logged
    /// rather than returned.
    pub fn batch_dispatch(&self, actions: Vec<Action>) -> Result<()> {
        self.submit(actions, None).map(|_| ())
    }

    /// [`Store::batch_dispatch`], then call `after` with the state the
    /// batch produced.
    ///
    /// `after` runs right after the batch's listeners, before any batch
    /// they queued, and only if the batch applied cleanly.
    pub fn batch_dispatch_then<F>(&self, actions: Vec<Action>, after: F) -> Result<Dispatch>
    where
        F: FnOnce(&Datum) + Send + 'static,
    {
        self.submit(actions, Some(Box::new(after)))
    }

    fn submit(&self, actions: Vec<Action>, after: Option<AfterApply>) -> Result<Dispatch> {
        if actions.is_empty() {
            if let Some(after) = after {
                after(&self.state());
            }
            return Ok(Dispatch::Applied);
        }

        let depth = self.dispatch.lock();
        if depth.get() > 0 {
            return match self.policy {
                ReentrancyPolicy::Reject => {
                    warn!(actions = actions.len(), "re-entrant dispatch rejected");
                    Err(FormError::ReentrantDispatch)
                }
                ReentrancyPolicy::Queue => {
                    debug!(actions = actions.len(), "re-entrant dispatch queued");
                    self.pending.lock().push_back(Pending { actions, after });
                    Ok(Dispatch::Queued)
                }
            };
        }

        let _nested = Nested::enter(&depth);
        let next = self.apply(&actions)?;
        if let Some(after) = after {
            after(&next);
        }
        self.drain_pending();
        Ok(Dispatch::Applied)
    }

    /// Reduce against a snapshot, so host closures run by the reducer may
    /// read the store. Dispatches are serialized, so the swap cannot race.
    fn apply(&self, actions: &[Action]) -> Result<Datum> {
        let next = reduce_batch(&self.state(), actions)?;
        *self.state.write() = next.clone();
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(version, actions = actions.len(), "batch applied");

        // Snapshot so listeners may (un)subscribe while being notified
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&next);
        }
        Ok(next)
    }

    fn drain_pending(&self) {
        loop {
            let Some(Pending { actions, after }) = self.pending.lock().pop_front() else {
                break;
            };
            match self.apply(&actions) {
                Ok(next) => {
                    if let Some(after) = after {
                        after(&next);
                    }
                }
                Err(err) => warn!(%err, "queued dispatch failed"),
            }
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version())
            .field("policy", &self.policy)
            .field("listeners", &self.listeners.lock().entries.len())
            .finish()
    }
}

/// Marks the owning thread as dispatching until dropped, including on
/// early return
struct Nested<'a>(&'a Cell<usize>);

impl<'a> Nested<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for Nested<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}
