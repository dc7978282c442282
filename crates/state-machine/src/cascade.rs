//! Leaves-first removal of an event or form subtree
//!
//! The store enforces no foreign keys, so children are enumerated and deleted
//! explicitly: responses in batches, then each form, then the event. Both
//! copies of every document go in the same batch. There is no rollback; a
//! failure after some batches committed is reported as
//! [`SyncError::CascadeIncomplete`] with what was already removed. Counter
//! decrements are best effort.

use evently_app_primitives::{Event, EventId, FormId, IdentityId, ResponseId};
use evently_document_store::{
    DocumentPath, DocumentStore, Query, StoreError, WriteBatch, delete_batches,
};
use std::collections::BTreeSet;

use crate::documents::{
    EVENT_COUNT, EVENT_ID, FORM_COUNT, FORM_ID, flat_event, flat_form, flat_forms, flat_response,
    flat_responses, owner_event, owner_form, owner_forms, owner_response, owner_responses,
    user_doc,
};
use crate::error::{SyncError, SyncResult};

/// What a cascade managed to remove
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub forms_deleted: usize,
    pub responses_deleted: usize,
    pub event_deleted: bool,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct CascadeDelete<'a, S: ?Sized> {
    remote: &'a S,
    batch_size: usize,
    report: CascadeReport,
}

impl<'a, S> CascadeDelete<'a, S>
where
    S: DocumentStore + ?Sized,
{
    /// `batch_size` is rounded down to an even number so both copies of a
    /// response always share a batch
    pub fn new(remote: &'a S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(2);
        Self {
            remote,
            batch_size: batch_size - batch_size % 2,
            report: CascadeReport::default(),
        }
    }

    pub async fn delete_event(mut self, event: &Event) -> SyncResult<CascadeReport> {
        match self.remove_event(event).await {
            Ok(()) => {
                tracing::info!(
                    event_id = %event.id,
                    forms = self.report.forms_deleted,
                    responses = self.report.responses_deleted,
                    "Event cascade complete"
                );
                Ok(self.report)
            }
            Err(source) => Err(self.incomplete(source)),
        }
    }

    pub async fn delete_form(mut self, event: &Event, form_id: &FormId) -> SyncResult<CascadeReport> {
        match self.remove_form(&event.creator_id, &event.id, form_id).await {
            Ok(()) => {
                self.decrement(&owner_event(&event.creator_id, &event.id), FORM_COUNT)
                    .await;
                self.decrement(&flat_event(&event.id), FORM_COUNT).await;
                tracing::info!(
                    event_id = %event.id,
                    form_id = %form_id,
                    responses = self.report.responses_deleted,
                    "Form cascade complete"
                );
                Ok(self.report)
            }
            Err(source) => Err(self.incomplete(source)),
        }
    }

    fn incomplete(self, source: StoreError) -> SyncError {
        if self.report.is_empty() {
            return SyncError::RemoteWrite(source);
        }
        tracing::error!(
            forms = self.report.forms_deleted,
            responses = self.report.responses_deleted,
            error = %source,
            "Cascade stopped after partial deletion"
        );
        SyncError::CascadeIncomplete {
            report: self.report,
            source,
        }
    }

    async fn remove_event(&mut self, event: &Event) -> Result<(), StoreError> {
        for form_id in self.form_ids(&event.creator_id, &event.id).await? {
            self.remove_form(&event.creator_id, &event.id, &form_id).await?;
        }
        let mut batch = WriteBatch::new();
        batch
            .delete(owner_event(&event.creator_id, &event.id))
            .delete(flat_event(&event.id));
        self.remote.commit(batch).await?;
        self.report.event_deleted = true;
        self.decrement(&user_doc(&event.creator_id), EVENT_COUNT).await;
        Ok(())
    }

    async fn remove_form(
        &mut self,
        creator: &IdentityId,
        event_id: &EventId,
        form_id: &FormId,
    ) -> Result<(), StoreError> {
        let response_ids = self.response_ids(creator, event_id, form_id).await?;
        let paths: Vec<DocumentPath> = response_ids
            .iter()
            .flat_map(|id| {
                [
                    owner_response(creator, event_id, form_id, id),
                    flat_response(id),
                ]
            })
            .collect();
        for batch in delete_batches(paths, self.batch_size) {
            let responses = batch.len() / 2;
            self.remote.commit(batch).await?;
            self.report.responses_deleted += responses;
            tracing::debug!(form_id = %form_id, responses, "Deleted response batch");
        }

        let mut batch = WriteBatch::new();
        batch
            .delete(owner_form(creator, event_id, form_id))
            .delete(flat_form(form_id));
        self.remote.commit(batch).await?;
        self.report.forms_deleted += 1;
        Ok(())
    }

    /// Forms found under the owner plus flattened copies whose canonical copy is gone
    async fn form_ids(
        &self,
        creator: &IdentityId,
        event_id: &EventId,
    ) -> Result<BTreeSet<FormId>, StoreError> {
        let owned = self.remote.query(&Query::new(owner_forms(creator, event_id))).await?;
        let flattened = self
            .remote
            .query(&Query::new(flat_forms()).where_eq(EVENT_ID, event_id.as_str()))
            .await?;
        Ok(owned
            .iter()
            .chain(flattened.iter())
            .filter_map(|doc| FormId::new(doc.id()).ok())
            .collect())
    }

    async fn response_ids(
        &self,
        creator: &IdentityId,
        event_id: &EventId,
        form_id: &FormId,
    ) -> Result<BTreeSet<ResponseId>, StoreError> {
        let owned = self
            .remote
            .query(&Query::new(owner_responses(creator, event_id, form_id)))
            .await?;
        let flattened = self
            .remote
            .query(
                &Query::new(flat_responses())
                    .where_eq(EVENT_ID, event_id.as_str())
                    .where_eq(FORM_ID, form_id.as_str()),
            )
            .await?;
        Ok(owned
            .iter()
            .chain(flattened.iter())
            .filter_map(|doc| ResponseId::new(doc.id()).ok())
            .collect())
    }

    async fn decrement(&self, path: &DocumentPath, field: &str) {
        if let Err(e) = self.remote.increment(path, field, -1).await {
            tracing::warn!(path = %path, field, error = %e, "Counter not decremented, it will drift");
        }
    }
}
