// ── Action dialogs ──
//
// Add / Edit / View / Delete over one list controller. A dialog owns a
// draft while open, submits it through the controller's gateway, and on
// success patches (or reloads) the controller exactly once before
// closing. On failure it stays open with the draft untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::controller::ListController;
use crate::error::{CoreError, ValidationError};
use crate::form::Draft;
use crate::gateway::Gateway;
use crate::model::{EntityId, Fields, Record};
use crate::notify::Toast;
use crate::schema::{Choice, EntityDescriptor, FieldKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum DialogKind {
    Add,
    Edit,
    View,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Closed,
    Open,
    Submitting,
}

/// How the controller catches up after a successful submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Patch the collection with the returned record.
    #[default]
    Patch,
    /// Refetch the whole collection.
    Reload,
}

/// What a successful submit produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    Saved(Arc<Record>),
    Deleted(EntityId),
}

#[derive(Debug, Clone)]
struct DialogState {
    phase: DialogPhase,
    draft: Option<Draft>,
    target: Option<Arc<Record>>,
}

// ── ActionDialog ─────────────────────────────────────────────────────

pub struct ActionDialog<G: Gateway> {
    kind: DialogKind,
    controller: ListController<G>,
    refresh: RefreshPolicy,
    today: NaiveDate,
    state: watch::Sender<DialogState>,
    submitting: AtomicBool,
}

/// Clears the submit flag however `submit` exits.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<G: Gateway> ActionDialog<G> {
    fn build(
        kind: DialogKind,
        controller: ListController<G>,
        target: Option<Arc<Record>>,
        today: NaiveDate,
    ) -> Self {
        let (state, _) = watch::channel(DialogState {
            phase: DialogPhase::Closed,
            draft: None,
            target,
        });
        Self {
            kind,
            controller,
            refresh: RefreshPolicy::default(),
            today,
            state,
            submitting: AtomicBool::new(false),
        }
    }

    fn targeting(
        kind: DialogKind,
        controller: ListController<G>,
        id: &EntityId,
    ) -> Result<Self, CoreError> {
        let record = controller.get(id).ok_or_else(|| CoreError::NotFound {
            entity_type: controller.descriptor().singular.to_owned(),
            identifier: id.to_string(),
        })?;
        let today = chrono::Utc::now().date_naive();
        Ok(Self::build(kind, controller, Some(record), today))
    }

    /// A dialog creating a new record; the draft starts from field defaults.
    pub fn add(controller: ListController<G>, today: NaiveDate) -> Self {
        Self::build(DialogKind::Add, controller, None, today)
    }

    /// A dialog editing a record already in the controller's collection.
    pub fn edit(controller: ListController<G>, id: &EntityId) -> Result<Self, CoreError> {
        Self::targeting(DialogKind::Edit, controller, id)
    }

    pub fn view(controller: ListController<G>, id: &EntityId) -> Result<Self, CoreError> {
        Self::targeting(DialogKind::View, controller, id)
    }

    pub fn delete(controller: ListController<G>, id: &EntityId) -> Result<Self, CoreError> {
        Self::targeting(DialogKind::Delete, controller, id)
    }

    #[must_use]
    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.controller.descriptor()
    }

    pub fn phase(&self) -> DialogPhase {
        self.state.borrow().phase
    }

    /// The current draft; `None` while closed and for View/Delete.
    pub fn draft(&self) -> Option<Draft> {
        self.state.borrow().draft.clone()
    }

    pub fn target(&self) -> Option<Arc<Record>> {
        self.state.borrow().target.clone()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Open the dialog, seeding a fresh draft for Add and Edit.
    pub fn open(&self) {
        let kind = self.controller.kind();
        let today = self.today;
        self.state.send_modify(|state| {
            state.draft = match (self.kind, &state.target) {
                (DialogKind::Add, _) => Some(Draft::with_defaults(kind, today)),
                (DialogKind::Edit, Some(record)) => Some(Draft::from_record(kind, record)),
                _ => None,
            };
            state.phase = DialogPhase::Open;
        });
    }

    /// Close without submitting. Unsaved edits are dropped.
    pub fn close(&self) {
        self.state.send_modify(|state| {
            state.phase = DialogPhase::Closed;
            state.draft = None;
        });
    }

    /// Change one draft field while open. The phase check and the write
    /// happen under one lock, so an edit never lands mid-submit.
    pub fn set_field(&self, name: &str, raw: impl Into<String>) -> Result<(), CoreError> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| {
            if state.phase != DialogPhase::Open {
                result = Err(CoreError::InvalidState {
                    message: format!("{} dialog is not open", self.kind),
                });
                return false;
            }
            let Some(draft) = state.draft.as_mut() else {
                result = Err(CoreError::InvalidState {
                    message: format!("{} dialog has no editable fields", self.kind),
                });
                return false;
            };
            match draft.clone().set_field(name, raw) {
                Ok(updated) => {
                    *draft = updated;
                    true
                }
                Err(e) => {
                    result = Err(e.into());
                    false
                }
            }
        });
        result
    }

    /// Rows the reference field `name` may point at.
    pub async fn reference_choices(&self, name: &str) -> Result<Vec<Choice>, CoreError> {
        let descriptor = self.controller.descriptor();
        let spec = descriptor
            .field(name)
            .ok_or_else(|| ValidationError::UnknownField {
                entity: descriptor.singular.to_owned(),
                field: name.to_owned(),
            })?;
        let FieldKind::Reference(target) = spec.kind else {
            return Err(CoreError::InvalidState {
                message: format!("{} is not a reference field", spec.label),
            });
        };
        self.controller.gateway().choices(target).await
    }

    /// Set a reference field from an id or a row label (a tail number,
    /// a person's name). Anything that names no existing row is rejected.
    /// An empty value clears the field.
    pub async fn set_reference(&self, name: &str, raw: &str) -> Result<(), CoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return self.set_field(name, "");
        }
        let choices = self.reference_choices(name).await?;
        let Some(choice) = choices.iter().find(|c| c.matches(raw)) else {
            let label = self
                .controller
                .descriptor()
                .field(name)
                .map_or(name, |f| f.label);
            let allowed = choices
                .iter()
                .map(|c| c.label.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ValidationError::NotAllowed {
                field: label.to_owned(),
                value: raw.to_owned(),
                allowed,
            }
            .into());
        };
        self.set_field(name, choice.id.to_string())
    }

    /// Labelled values for the target record (View), or the draft.
    pub fn details(&self) -> Vec<(String, String)> {
        let state = self.state.borrow();
        let descriptor = self.controller.descriptor();
        if let Some(record) = &state.target {
            let mut lines: Vec<(String, String)> = descriptor
                .columns
                .iter()
                .map(|c| (c.header.to_owned(), record.display(c.path)))
                .collect();
            lines.extend(
                descriptor
                    .fields
                    .iter()
                    .filter(|f| descriptor.columns.iter().all(|c| c.path != f.name))
                    .map(|f| (f.label.to_owned(), record.display(f.name))),
            );
            return lines;
        }
        state
            .draft
            .as_ref()
            .map(|d| {
                d.entries()
                    .map(|(f, v)| (f.label.to_owned(), v.to_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_phase(&self, phase: DialogPhase) {
        self.state.send_modify(|state| state.phase = phase);
    }

    // ── Submit ───────────────────────────────────────────────────────

    /// Submit the dialog. Single-flight: a concurrent second call fails
    /// with [`CoreError::SubmitInProgress`] and has no side effects.
    pub async fn submit(&self) -> Result<Outcome, CoreError> {
        if self.kind == DialogKind::View {
            return Err(CoreError::InvalidState {
                message: "view dialogs do not submit".into(),
            });
        }
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoreError::SubmitInProgress);
        }
        let _guard = SubmitGuard(&self.submitting);

        // Claim the draft and enter Submitting in one step.
        let mut claimed = None;
        self.state.send_if_modified(|state| {
            if state.phase != DialogPhase::Open {
                return false;
            }
            state.phase = DialogPhase::Submitting;
            claimed = Some(state.clone());
            true
        });
        let Some(state) = claimed else {
            return Err(CoreError::InvalidState {
                message: format!("{} dialog is not open", self.kind),
            });
        };

        let descriptor = self.controller.descriptor();
        let fields = match &state.draft {
            Some(draft) => match draft.to_submission() {
                Ok(fields) => Some(fields),
                Err(e) => {
                    warn!(table = descriptor.table, error = %e, "submission rejected");
                    self.set_phase(DialogPhase::Open);
                    self.controller.notifier().notify(Toast::error(e.to_string()));
                    return Err(e.into());
                }
            },
            None => None,
        };

        debug!(table = descriptor.table, dialog = %self.kind, "submitting");

        let result = self.mutate(state.target.as_ref(), fields).await;
        match result {
            Ok(outcome) => {
                let verb = match self.kind {
                    DialogKind::Add => "added",
                    DialogKind::Edit => "updated",
                    _ => "deleted",
                };
                info!(table = descriptor.table, dialog = %self.kind, "submit succeeded");
                self.state.send_modify(|state| {
                    state.phase = DialogPhase::Closed;
                    state.draft = None;
                    if let Outcome::Saved(record) = &outcome {
                        state.target = Some(Arc::clone(record));
                    }
                });
                self.controller.notifier().notify(Toast::success(format!(
                    "{} {verb} successfully",
                    descriptor.singular
                )));
                Ok(outcome)
            }
            Err(e) => {
                warn!(table = descriptor.table, dialog = %self.kind, error = %e, "submit failed");
                self.set_phase(DialogPhase::Open);
                self.controller.notifier().notify(Toast::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// One gateway mutation followed by one controller refresh.
    async fn mutate(
        &self,
        target: Option<&Arc<Record>>,
        fields: Option<Fields>,
    ) -> Result<Outcome, CoreError> {
        let controller = &self.controller;
        let kind = controller.kind();
        let gateway = controller.gateway();
        let missing = || CoreError::InvalidState {
            message: format!("{} dialog has nothing to submit", self.kind),
        };

        match (self.kind, target, fields) {
            (DialogKind::Add, _, Some(fields)) => {
                let record = gateway.insert(kind, &fields).await?;
                let id = record.id().clone();
                Ok(Outcome::Saved(match self.refresh {
                    RefreshPolicy::Patch => controller.apply_insert(record),
                    RefreshPolicy::Reload => self.reload_or(id, record).await,
                }))
            }
            (DialogKind::Edit, Some(target), Some(fields)) => {
                let record = gateway.update(kind, target.id(), &fields).await?;
                let id = record.id().clone();
                Ok(Outcome::Saved(match self.refresh {
                    RefreshPolicy::Patch => controller.apply_update(record),
                    RefreshPolicy::Reload => self.reload_or(id, record).await,
                }))
            }
            (DialogKind::Delete, Some(target), _) => {
                let id = target.id().clone();
                gateway.delete(kind, &id).await?;
                match self.refresh {
                    RefreshPolicy::Patch => {
                        controller.apply_delete(&id);
                    }
                    RefreshPolicy::Reload => {
                        // A failed reload reports itself; the delete stands.
                        let _ = controller.load().await;
                    }
                }
                Ok(Outcome::Deleted(id))
            }
            _ => Err(missing()),
        }
    }

    async fn reload_or(&self, id: EntityId, record: Record) -> Arc<Record> {
        if self.controller.load().await.is_ok() {
            if let Some(stored) = self.controller.get(&id) {
                return stored;
            }
        }
        Arc::new(record)
    }
}
