//! Composer
//!
//! [`compose`] turns a [`FormConfig`] into a [`FormTemplate`], and every
//! [`FormTemplate::create`] call yields an independent [`Form`] with its own
//! store, its own bus pair and its own path mapping.

use std::sync::Arc;

use formloom_core::schema::field;
use formloom_core::{
    Action, Bus, Buses, Datum, EventPayload, ExternalEvent, HandlerId, InternalEvent, Result,
    Store, Update,
};
use serde_json::Value as Json;
use tracing::debug;

use crate::compiler::{CompiledForm, Compiler};
use crate::config::FormConfig;
use crate::context::FormContext;
use crate::mapping::{MappingEntry, PathMapping};

type ExternalHandler = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// Compose a form template from its configuration
pub fn compose<R>(config: FormConfig<R>) -> FormTemplate<R> {
    FormTemplate {
        config: Arc::new(config),
        listeners: Vec::new(),
    }
}

/// A configured form, ready to be instantiated with data
pub struct FormTemplate<R> {
    config: Arc<FormConfig<R>>,
    listeners: Vec<(ExternalEvent, ExternalHandler)>,
}

impl<R> FormTemplate<R> {
    /// Attach an external handler to every form created from now on.
    ///
    /// Unlike [`Form::on`] this also sees the `form:initialised` event.
    pub fn on<F>(mut self, event: ExternalEvent, handler: F) -> Self
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.listeners.push((event, Arc::new(handler)));
        self
    }

    pub fn config(&self) -> &FormConfig<R> {
        &self.config
    }

    /// Deep-copy `initial` into a new form
    pub fn create(&self, initial: &Json) -> Form<R> {
        let settings = self.config.form_settings().clone();
        let store = Arc::new(Store::with_policy(
            Datum::from(initial),
            settings.store.reentrancy,
        ));
        let buses = Buses::new();

        for (event, handler) in &self.listeners {
            let handler = handler.clone();
            buses.external().on(*event, move |payload| handler(payload));
        }

        let external = Arc::downgrade(buses.external());
        store.subscribe(move |state| {
            if let Some(external) = external.upgrade() {
                external.emit(ExternalEvent::Change, &EventPayload::State(state.clone()));
            }
        });

        let context = Arc::new(FormContext {
            store,
            buses,
            settings,
            templates: Arc::new(self.config.templates().clone()),
        });
        context.emit(
            InternalEvent::FormInitialised,
            &EventPayload::State(context.store.state()),
        );
        debug!("form created");

        Form {
            config: self.config.clone(),
            context,
            mapping: PathMapping::new(),
        }
    }
}

/// A live form instance
pub struct Form<R> {
    config: Arc<FormConfig<R>>,
    context: Arc<FormContext>,
    mapping: PathMapping,
}

impl<R> Form<R> {
    /// Compile the current state.
    ///
    /// On success the path mapping is replaced by the one built during this
    /// pass; on error the previous mapping stays in place.
    pub fn render(&mut self) -> Result<CompiledForm<R>> {
        let state = self.context.store.state();
        let mut mapping = PathMapping::new();
        let output = Compiler::new(&self.config, &self.context, &mut mapping).compile(&state)?;
        self.mapping = mapping;
        Ok(output)
    }

    pub fn get_state(&self) -> Datum {
        self.context.store.state()
    }

    /// Value of a field, or the JSON items of a container, by name path
    pub fn get_value(&self, name_path: &str) -> Result<Json> {
        match self.mapping.entry(name_path)? {
            MappingEntry::Field(handle) => {
                let state = self.context.store.state();
                let value = state
                    .get_in(handle.path().join(&[field::VALUE]).as_slice())
                    .map_or(Json::Null, Datum::to_json);
                Ok(value)
            }
            MappingEntry::Many(handle) => handle.items(),
            MappingEntry::ManyChildForms(handle) => handle.items(),
        }
    }

    /// Edit a field, or replace a container's items, by name path
    pub fn set_value(&self, name_path: &str, value: impl Into<Update>) -> Result<()> {
        match self.mapping.entry(name_path)? {
            MappingEntry::Field(handle) => handle.edit(value),
            MappingEntry::Many(handle) => handle.edit_children(value),
            MappingEntry::ManyChildForms(handle) => handle.edit_children(value),
        }
    }

    pub fn on<F>(&self, event: ExternalEvent, handler: F) -> HandlerId
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.context.buses.external().on(event, handler)
    }

    pub fn off(&self, event: ExternalEvent, id: HandlerId) -> bool {
        self.context.buses.external().off(event, id)
    }

    /// Emit on the external bus
    pub fn emit(&self, event: ExternalEvent, payload: &EventPayload) -> usize {
        self.context.buses.external().emit(event, payload)
    }

    pub fn batch_dispatch(&self, actions: Vec<Action>) -> Result<()> {
        self.context.store.batch_dispatch(actions)
    }

    /// Direct store access
    pub fn store(&self) -> &Arc<Store> {
        &self.context.store
    }

    /// Mapping built by the last successful render
    pub fn path_mapping(&self) -> &PathMapping {
        &self.mapping
    }

    pub fn internal_bus(&self) -> &Arc<Bus<InternalEvent>> {
        self.context.internal_bus()
    }

    pub fn buses(&self) -> &Buses {
        &self.context.buses
    }
}

impl<R> Drop for Form<R> {
    fn drop(&mut self) {
        self.context.emit(
            InternalEvent::FormRemoved,
            &EventPayload::State(self.context.store.state()),
        );
    }
}
