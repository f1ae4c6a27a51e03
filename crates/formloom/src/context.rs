//! Per-form shared state handed to every handle

use std::fmt;
use std::sync::Arc;

use formloom_core::{
    extend_name_path_with, Bus, Buses, Datum, EventPayload, FormSettings, InternalEvent, Store,
};
use rustc_hash::FxHashMap;
use serde_json::Value as Json;

/// Everything a handle needs to act on its form after rendering is over
pub struct FormContext {
    pub(crate) store: Arc<Store>,
    pub(crate) buses: Buses,
    pub(crate) settings: FormSettings,
    pub(crate) templates: Arc<FxHashMap<String, Datum>>,
}

impl FormContext {
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn buses(&self) -> &Buses {
        &self.buses
    }

    pub fn internal_bus(&self) -> &Arc<Bus<InternalEvent>> {
        self.buses.internal()
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    pub(crate) fn template(&self, name: &str) -> Option<&Datum> {
        self.templates.get(name)
    }

    pub(crate) fn name_path(&self, base: Option<&str>, segment: impl fmt::Display) -> String {
        extend_name_path_with(base, segment, &self.settings.compiler.name_separator)
    }

    pub(crate) fn emit(&self, event: InternalEvent, payload: &EventPayload) {
        self.buses.internal().emit(event, payload);
    }

    /// Feed the invalid queue with the outcome of a validation run
    pub(crate) fn report_validity(&self, name_path: &str, errors: &[String]) {
        if !self.settings.events.field_validity {
            return;
        }
        let event = if errors.is_empty() {
            InternalEvent::FieldValid
        } else {
            InternalEvent::FieldInvalid
        };
        let errors = Json::Array(errors.iter().cloned().map(Json::String).collect());
        self.emit(event, &EventPayload::field(name_path, Some(errors)));
    }
}

impl fmt::Debug for FormContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormContext")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .field("templates", &self.templates.len())
            .finish()
    }
}
