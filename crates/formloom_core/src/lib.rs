//! formloom core
//!
//! The data side of a formloom form:
//!
//! - **Datum**: an immutable, structurally shared JSON-like tree
//! - **Schema Index**: fixed slot offsets for every node kind
//! - **Attributes**: compiler for the nested attribute AST
//! - **Reducer**: pure `(state, action) -> state` transitions
//! - **Store**: batched, atomic dispatch with subscriptions
//! - **Events**: the per-form internal/external bus pair
//!
//! # Example
//!
//! ```rust
//! use formloom_core::{Action, Datum, Path, Store, Update};
//! use serde_json::json;
//!
//! let store = Store::new(Datum::from(json!([
//!     ["field", ["title", "text", "draft", null, []]]
//! ])));
//!
//! store
//!     .batch_dispatch(vec![
//!         Action::EditField { path: Path::from([0, 1]), update: Update::value("final") },
//!         Action::ValidateField { path: Path::from([0, 1]), errors: Some(vec![]) },
//!     ])
//!     .unwrap();
//!
//! assert_eq!(store.version(), 1);
//! assert_eq!(store.state().get_in(&[0, 1, 2]).and_then(Datum::as_str), Some("final"));
//! ```

pub mod action;
pub mod attributes;
pub mod datum;
pub mod error;
pub mod events;
pub mod path;
pub mod reducer;
pub mod schema;
pub mod settings;
pub mod store;

pub use action::{Action, Errors, Update, Validator};
pub use attributes::{compile_attributes, AttributeValue};
pub use datum::Datum;
pub use error::{FormError, Result};
pub use events::{Bus, Buses, EventPayload, ExternalEvent, HandlerId, InternalEvent};
pub use path::{extend_name_path, extend_name_path_with, Path};
pub use reducer::{reduce, reduce_batch};
pub use schema::{NodeKind, Slot};
pub use settings::{FormSettings, ReentrancyPolicy};
pub use store::{AfterApply, Dispatch, ListenerId, Store};
