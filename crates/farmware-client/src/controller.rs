use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use farmware_core::advisory_dropdown;
use farmware_core::advisory_table;
use farmware_core::farmer_dropdown;
use farmware_core::farmer_table;
use farmware_core::project_result;
use farmware_core::reduce;
use farmware_core::Advisory;
use farmware_core::AdvisoryId;
use farmware_core::AdvisoryRow;
use farmware_core::CollectionKind;
use farmware_core::DashboardAction;
use farmware_core::DashboardEffect;
use farmware_core::DashboardState;
use farmware_core::DispatchCompletion;
use farmware_core::Dropdown;
use farmware_core::Farmer;
use farmware_core::FarmerRow;
use farmware_core::LoadFailure;
use farmware_core::LoadOutcome;
use farmware_core::Preview;
use farmware_core::ResultModel;
use farmware_core::RuntimeAction;
use farmware_core::Selection;
use farmware_core::SelectionChange;
use farmware_core::SelectionSource;
use farmware_core::SubmissionOutcome;
use farmware_core::TableView;
use farmware_core::UserAction;
use farmware_core::ValidationError;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use crate::backend::DashboardBackend;
use crate::loader::dispatch_advisory;
use crate::loader::load_advisories;
use crate::loader::load_farmers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Started,
    AlreadyDispatching,
}

/// Owns the dashboard state and runs the effects the reducer asks for.
///
/// Effects that touch the network are spawned on the ambient tokio runtime
/// and report back through an unbounded channel. Completions are applied
/// one at a time by whoever pumps the controller (`drain_completions`,
/// `next_completion`, `settle`), so the state is only ever mutated from the
/// owning task.
pub struct DashboardController<B: DashboardBackend> {
    state: DashboardState,
    backend: Arc<B>,
    tx: mpsc::UnboundedSender<RuntimeAction>,
    rx: mpsc::UnboundedReceiver<RuntimeAction>,
    pending: usize,
    redraw: bool,
}

impl<B: DashboardBackend> DashboardController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_shared(Arc::new(backend))
    }

    pub fn with_shared(backend: Arc<B>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: DashboardState::new(),
            backend,
            tx,
            rx,
            pending: 0,
            redraw: true,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn current_selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn preview(&self) -> &Preview {
        &self.state.preview
    }

    pub fn outcome(&self) -> &SubmissionOutcome {
        &self.state.outcome
    }

    pub fn result(&self) -> Option<ResultModel> {
        project_result(&self.state.outcome)
    }

    pub fn farmer_table(&self) -> TableView<FarmerRow> {
        farmer_table(&self.state)
    }

    pub fn advisory_table(&self) -> TableView<AdvisoryRow> {
        advisory_table(&self.state)
    }

    pub fn farmer_options(&self) -> Dropdown<String> {
        farmer_dropdown(&self.state)
    }

    pub fn advisory_options(&self) -> Dropdown<AdvisoryId> {
        advisory_dropdown(&self.state)
    }

    pub fn refresh(&mut self, kind: CollectionKind) {
        self.dispatch(DashboardAction::User(UserAction::Refresh(kind)));
    }

    pub fn refresh_all(&mut self) {
        self.dispatch(DashboardAction::User(UserAction::RefreshAll));
    }

    pub fn select_farmer(&mut self, phone: Option<String>, source: SelectionSource) {
        self.apply_selection(SelectionChange::Farmer(phone), source);
    }

    pub fn select_advisory(&mut self, id: Option<AdvisoryId>, source: SelectionSource) {
        self.apply_selection(SelectionChange::Advisory(id), source);
    }

    pub fn apply_selection(&mut self, change: SelectionChange, source: SelectionSource) {
        self.dispatch(DashboardAction::User(UserAction::SetSelection {
            change,
            source,
        }));
    }

    /// Starts a dispatch for the current selection. Validation failures are
    /// also surfaced as a notice on the state.
    pub fn submit(&mut self) -> Result<SubmitStatus, ValidationError> {
        if self.state.is_dispatching() {
            debug!(event = "client.submit.ignored", reason = "dispatch in flight");
            return Ok(SubmitStatus::AlreadyDispatching);
        }
        self.dispatch(DashboardAction::User(UserAction::Submit));
        match self.state.validation {
            Some(error) => Err(error),
            None => Ok(SubmitStatus::Started),
        }
    }

    pub fn reset(&mut self) {
        self.dispatch(DashboardAction::User(UserAction::Reset));
    }

    pub fn dismiss_notice(&mut self) {
        self.dispatch(DashboardAction::User(UserAction::DismissNotice));
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.dispatch(DashboardAction::Runtime(RuntimeAction::Tick(now)));
    }

    /// Number of spawned tasks whose completion has not been applied yet.
    pub fn pending_tasks(&self) -> usize {
        self.pending
    }

    /// Applies every completion that has already arrived without waiting.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.rx.try_recv() {
            self.apply_completion(action);
            applied += 1;
        }
        applied
    }

    /// Waits for the next completion and applies it. Returns `false` when
    /// nothing is outstanding.
    pub async fn next_completion(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(action) => {
                self.apply_completion(action);
                true
            }
            None => false,
        }
    }

    /// Waits until every spawned task has reported back.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    /// Returns whether a redraw was requested since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn apply_completion(&mut self, action: RuntimeAction) {
        if action.completes_task() {
            self.pending = self.pending.saturating_sub(1);
        }
        self.dispatch(DashboardAction::Runtime(action));
    }

    fn dispatch(&mut self, action: DashboardAction) {
        let effects = reduce(&mut self.state, action);
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: DashboardEffect) {
        match effect {
            DashboardEffect::RequestFrame => self.redraw = true,
            DashboardEffect::FetchCollection { kind, request } => {
                self.pending += 1;
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                let task = match kind {
                    CollectionKind::Farmers => tokio::spawn(async move {
                        let outcome = load_farmers(backend.as_ref()).await;
                        Fetched::Farmers(outcome)
                    }),
                    CollectionKind::Advisories => tokio::spawn(async move {
                        let outcome = load_advisories(backend.as_ref()).await;
                        Fetched::Advisories(outcome)
                    }),
                };
                tokio::spawn(async move {
                    let fetched = task.await.unwrap_or_else(|error| {
                        warn!(
                            event = "client.collection.task_failed",
                            collection = kind.label(),
                            error = %error
                        );
                        Fetched::failed(kind, format!("{} request aborted: {error}", kind.label()))
                    });
                    let _ = tx.send(fetched.into_action(request, Utc::now()));
                });
            }
            DashboardEffect::SendAdvisory { attempt, request } => {
                self.pending += 1;
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                let task =
                    tokio::spawn(async move { dispatch_advisory(backend.as_ref(), &request).await });
                tokio::spawn(async move {
                    let completion = task.await.unwrap_or_else(|error| {
                        warn!(
                            event = "client.dispatch.task_failed",
                            attempt = attempt,
                            error = %error
                        );
                        DispatchCompletion::TransportFailed(format!("dispatch aborted: {error}"))
                    });
                    let _ = tx.send(RuntimeAction::DispatchCompleted {
                        attempt,
                        completion,
                    });
                });
            }
        }
    }
}

/// Result of a collection fetch task, before it is tagged with its request.
enum Fetched {
    Farmers(LoadOutcome<Farmer>),
    Advisories(LoadOutcome<Advisory>),
}

impl Fetched {
    fn failed(kind: CollectionKind, detail: String) -> Self {
        match kind {
            CollectionKind::Farmers => {
                Self::Farmers(LoadOutcome::LoadFailed(LoadFailure::Transport { detail }))
            }
            CollectionKind::Advisories => {
                Self::Advisories(LoadOutcome::LoadFailed(LoadFailure::Transport { detail }))
            }
        }
    }

    fn into_action(self, request: u64, received_at: DateTime<Utc>) -> RuntimeAction {
        match self {
            Self::Farmers(outcome) => RuntimeAction::FarmersLoaded {
                request,
                outcome,
                received_at,
            },
            Self::Advisories(outcome) => RuntimeAction::AdvisoriesLoaded {
                request,
                outcome,
                received_at,
            },
        }
    }
}
