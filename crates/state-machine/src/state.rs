//! The cached entity graph and its transition function
//!
//! [`reduce`] is the only way the cache changes. It is pure: the same state
//! and action always give the same result, and an action that changes nothing
//! hands back the very same `Arc` so observers can skip work with
//! [`Arc::ptr_eq`].

use evently_app_primitives::{Event, EventId, Form, FormId, IdentityId, Response};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ErrorKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityState {
    /// Session the cache belongs to
    pub identity: Option<IdentityId>,
    /// Events of the session, newest first
    pub events: Vec<Event>,
    pub current_event: Option<Event>,
    /// Forms of `current_event`, oldest first
    pub current_event_forms: Vec<Form>,
    /// Responses per form of `current_event`, oldest first
    pub current_event_form_responses: BTreeMap<FormId, Vec<Response>>,
    pub is_loading: bool,
    pub error: Option<ErrorKind>,
}

/// Everything that can happen to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    IdentityChanged(Option<IdentityId>),
    EventsLoaded(Vec<Event>),
    /// Select an event together with its forms; `None` deselects
    CurrentEventSet {
        event: Option<Event>,
        forms: Vec<Form>,
    },
    EventAdded(Event),
    EventUpdated(Event),
    EventDeleted(EventId),
    FormAdded(Form),
    FormUpdated(Form),
    FormDeleted {
        event_id: EventId,
        form_id: FormId,
    },
    FormResponsesSet {
        form_id: FormId,
        responses: Vec<Response>,
    },
    ResponseAdded(Response),
    LoadingToggled(bool),
    ErrorSet(Option<ErrorKind>),
}

impl Action {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::IdentityChanged(_) => "identity_changed",
            Action::EventsLoaded(_) => "events_loaded",
            Action::CurrentEventSet { .. } => "current_event_set",
            Action::EventAdded(_) => "event_added",
            Action::EventUpdated(_) => "event_updated",
            Action::EventDeleted(_) => "event_deleted",
            Action::FormAdded(_) => "form_added",
            Action::FormUpdated(_) => "form_updated",
            Action::FormDeleted { .. } => "form_deleted",
            Action::FormResponsesSet { .. } => "form_responses_set",
            Action::ResponseAdded(_) => "response_added",
            Action::LoadingToggled(_) => "loading_toggled",
            Action::ErrorSet(_) => "error_set",
        }
    }
}

/// Apply `action` to `state`
pub fn reduce(state: &Arc<EntityState>, action: Action) -> Arc<EntityState> {
    match state.transition(action) {
        Some(next) => Arc::new(next),
        None => Arc::clone(state),
    }
}

impl EntityState {
    pub fn is_current_event(&self, id: &EventId) -> bool {
        self.current_event.as_ref().is_some_and(|e| &e.id == id)
    }

    /// The next state, or `None` when the action has no effect
    fn transition(&self, action: Action) -> Option<Self> {
        match action {
            Action::IdentityChanged(identity) => self.identity_changed(identity),
            Action::EventsLoaded(events) => {
                (self.events != events).then(|| Self {
                    events,
                    ..self.clone()
                })
            }
            Action::CurrentEventSet { event, forms } => self.current_event_set(event, forms),
            Action::EventAdded(event) => self.event_added(event),
            Action::EventUpdated(event) => self.event_updated(event),
            Action::EventDeleted(id) => self.event_deleted(&id),
            Action::FormAdded(form) => self.form_added(form),
            Action::FormUpdated(form) => self.form_updated(form),
            Action::FormDeleted { event_id, form_id } => self.form_deleted(&event_id, &form_id),
            Action::FormResponsesSet { form_id, responses } => {
                self.form_responses_set(form_id, responses)
            }
            Action::ResponseAdded(response) => self.response_added(response),
            Action::LoadingToggled(is_loading) => (self.is_loading != is_loading).then(|| Self {
                is_loading,
                ..self.clone()
            }),
            Action::ErrorSet(error) => (self.error != error).then(|| Self {
                error,
                ..self.clone()
            }),
        }
    }

    fn identity_changed(&self, identity: Option<IdentityId>) -> Option<Self> {
        match identity {
            None => (*self != Self::default()).then(Self::default),
            Some(identity) if self.identity.as_ref() == Some(&identity) => None,
            Some(identity) => Some(Self {
                identity: Some(identity),
                is_loading: true,
                ..Self::default()
            }),
        }
    }

    fn current_event_set(&self, event: Option<Event>, forms: Vec<Form>) -> Option<Self> {
        let forms = match &event {
            Some(event) => forms
                .into_iter()
                .filter(|f| f.event_id == event.id)
                .collect(),
            None => Vec::new(),
        };
        if self.current_event == event && self.current_event_forms == forms {
            return None;
        }
        let mut next = self.clone();
        next.current_event_form_responses
            .retain(|form_id, _| forms.iter().any(|f| &f.id == form_id));
        if let Some(event) = &event
            && let Some(cached) = next.events.iter_mut().find(|e| e.id == event.id)
        {
            *cached = event.clone();
        }
        next.current_event = event;
        next.current_event_forms = forms;
        Some(next)
    }

    fn event_added(&self, event: Event) -> Option<Self> {
        let mut next = self.clone();
        match next.events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) if *existing == event => return None,
            Some(existing) => *existing = event,
            None => next.events.insert(0, event),
        }
        Some(next)
    }

    fn event_updated(&self, event: Event) -> Option<Self> {
        let mut next = self.clone();
        let mut changed = false;
        if let Some(existing) = next.events.iter_mut().find(|e| e.id == event.id)
            && *existing != event
        {
            *existing = event.clone();
            changed = true;
        }
        if let Some(current) = next.current_event.as_mut()
            && current.id == event.id
            && *current != event
        {
            *current = event;
            changed = true;
        }
        changed.then_some(next)
    }

    fn event_deleted(&self, id: &EventId) -> Option<Self> {
        let cached = self.events.iter().any(|e| &e.id == id);
        let current = self.is_current_event(id);
        if !cached && !current {
            return None;
        }
        let mut next = self.clone();
        next.events.retain(|e| &e.id != id);
        if current {
            next.current_event = None;
            next.current_event_forms.clear();
        }
        next.current_event_forms.retain(|f| &f.event_id != id);
        for responses in next.current_event_form_responses.values_mut() {
            responses.retain(|r| &r.event_id != id);
        }
        let forms = &next.current_event_forms;
        next.current_event_form_responses
            .retain(|form_id, _| forms.iter().any(|f| &f.id == form_id));
        Some(next)
    }

    /// Apply `change` to every cached copy of event `id`
    fn adjust_event(&mut self, id: &EventId, change: impl Fn(&mut Event)) -> bool {
        let mut found = false;
        for event in self.events.iter_mut().filter(|e| &e.id == id) {
            change(event);
            found = true;
        }
        if let Some(current) = self.current_event.as_mut()
            && &current.id == id
        {
            change(current);
            found = true;
        }
        found
    }

    fn form_added(&self, form: Form) -> Option<Self> {
        let mut next = self.clone();
        if let Some(existing) = next.current_event_forms.iter_mut().find(|f| f.id == form.id) {
            if *existing == form {
                return None;
            }
            *existing = form;
            return Some(next);
        }
        let counted = next.adjust_event(&form.event_id, |e| e.form_count += 1);
        let listed = next.is_current_event(&form.event_id);
        if listed {
            next.current_event_forms.push(form);
        }
        (counted || listed).then_some(next)
    }

    fn form_updated(&self, form: Form) -> Option<Self> {
        let index = self
            .current_event_forms
            .iter()
            .position(|f| f.id == form.id && f.event_id == form.event_id)?;
        if self.current_event_forms[index] == form {
            return None;
        }
        let mut next = self.clone();
        next.current_event_forms[index] = form;
        Some(next)
    }

    fn form_deleted(&self, event_id: &EventId, form_id: &FormId) -> Option<Self> {
        let index = self
            .current_event_forms
            .iter()
            .position(|f| &f.id == form_id && &f.event_id == event_id)?;
        let mut next = self.clone();
        next.current_event_forms.remove(index);
        next.current_event_form_responses.remove(form_id);
        next.adjust_event(event_id, |e| e.form_count = (e.form_count - 1).max(0));
        Some(next)
    }

    fn form_responses_set(&self, form_id: FormId, responses: Vec<Response>) -> Option<Self> {
        if !self.current_event_forms.iter().any(|f| f.id == form_id) {
            return None;
        }
        let responses: Vec<Response> = responses
            .into_iter()
            .filter(|r| r.form_id == form_id)
            .collect();
        if self.current_event_form_responses.get(&form_id) == Some(&responses) {
            return None;
        }
        let mut next = self.clone();
        next.current_event_form_responses.insert(form_id, responses);
        Some(next)
    }

    fn response_added(&self, response: Response) -> Option<Self> {
        let already_cached = self
            .current_event_form_responses
            .get(&response.form_id)
            .is_some_and(|list| list.iter().any(|r| r.id == response.id));
        if already_cached {
            return None;
        }
        let mut next = self.clone();
        let mut changed = next.adjust_event(&response.event_id, |e| e.response_count += 1);
        if let Some(form) = next
            .current_event_forms
            .iter_mut()
            .find(|f| f.id == response.form_id && f.event_id == response.event_id)
        {
            form.response_count += 1;
            next.current_event_form_responses
                .entry(response.form_id.clone())
                .or_default()
                .push(response);
            changed = true;
        }
        changed.then_some(next)
    }
}
