use chrono::DateTime;
use chrono::Utc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::actions::DashboardAction;
use super::actions::DispatchCompletion;
use super::actions::RuntimeAction;
use super::actions::SelectionChange;
use super::actions::SelectionSource;
use super::actions::UserAction;
use super::error::ValidationError;
use super::state::CollectionKind;
use super::state::CollectionSlice;
use super::state::DashboardState;
use super::state::DispatchFailure;
use super::state::LoadOutcome;
use super::state::NoticeLevel;
use super::state::Selection;
use super::state::SubmissionOutcome;
use super::state::SubmissionPhase;
use super::wire::DispatchRequest;

pub const DISPATCH_SUCCEEDED_NOTICE: &str = "SMS sent successfully!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEffect {
    RequestFrame,
    FetchCollection {
        kind: CollectionKind,
        request: u64,
    },
    SendAdvisory {
        attempt: u64,
        request: DispatchRequest,
    },
}

pub fn reduce(state: &mut DashboardState, action: DashboardAction) -> Vec<DashboardEffect> {
    match action {
        DashboardAction::User(user) => reduce_user(state, user),
        DashboardAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

pub fn validate_submission(selection: &Selection) -> Result<DispatchRequest, ValidationError> {
    match (&selection.advisory_id, &selection.farmer_phone) {
        (Some(message_id), Some(phone_number)) => Ok(DispatchRequest {
            message_id: message_id.clone(),
            phone_number: phone_number.clone(),
        }),
        (Some(_), None) => Err(ValidationError::MissingFarmer),
        (None, Some(_)) => Err(ValidationError::MissingAdvisory),
        (None, None) => Err(ValidationError::MissingSelection),
    }
}

fn reduce_user(state: &mut DashboardState, action: UserAction) -> Vec<DashboardEffect> {
    match action {
        UserAction::Refresh(kind) => {
            vec![begin_refresh(state, kind), DashboardEffect::RequestFrame]
        }
        UserAction::RefreshAll => {
            let mut effects: Vec<DashboardEffect> = CollectionKind::ALL
                .into_iter()
                .map(|kind| begin_refresh(state, kind))
                .collect();
            effects.push(DashboardEffect::RequestFrame);
            effects
        }
        UserAction::SetSelection { change, source } => {
            apply_selection(state, change, source);
            vec![DashboardEffect::RequestFrame]
        }
        UserAction::Submit => begin_submission(state),
        UserAction::Reset => {
            if state.is_dispatching() {
                debug!(event = "core.form.reset_ignored", reason = "dispatch in flight");
                return Vec::new();
            }
            state.selection.clear();
            state.validation = None;
            state.outcome = SubmissionOutcome::NotStarted;
            state.notice = None;
            state.recompute_preview();
            info!(event = "core.form.reset");
            vec![DashboardEffect::RequestFrame]
        }
        UserAction::DismissNotice => {
            if state.notice.take().is_some() {
                return vec![DashboardEffect::RequestFrame];
            }
            Vec::new()
        }
    }
}

fn reduce_runtime(state: &mut DashboardState, action: RuntimeAction) -> Vec<DashboardEffect> {
    match action {
        RuntimeAction::FarmersLoaded {
            request,
            outcome,
            received_at,
        } => {
            let applied = apply_load(
                &mut state.store.farmers,
                CollectionKind::Farmers,
                request,
                outcome,
                received_at,
            );
            if applied == LoadApplied::Superseded {
                return Vec::new();
            }
            if applied == LoadApplied::Loaded {
                reconcile_selected_farmer(state);
            }
            state.recompute_preview();
            vec![DashboardEffect::RequestFrame]
        }
        RuntimeAction::AdvisoriesLoaded {
            request,
            outcome,
            received_at,
        } => {
            let applied = apply_load(
                &mut state.store.advisories,
                CollectionKind::Advisories,
                request,
                outcome,
                received_at,
            );
            if applied == LoadApplied::Superseded {
                return Vec::new();
            }
            if applied == LoadApplied::Loaded {
                reconcile_selected_advisory(state);
            }
            state.recompute_preview();
            vec![DashboardEffect::RequestFrame]
        }
        RuntimeAction::DispatchCompleted {
            attempt,
            completion,
        } => complete_submission(state, attempt, completion),
        RuntimeAction::Tick(now) => {
            state.last_updated = Some(now);
            vec![DashboardEffect::RequestFrame]
        }
    }
}

fn begin_refresh(state: &mut DashboardState, kind: CollectionKind) -> DashboardEffect {
    let request = match kind {
        CollectionKind::Farmers => state.store.farmers.begin_load(),
        CollectionKind::Advisories => state.store.advisories.begin_load(),
    };
    info!(
        event = "core.collection.load_started",
        collection = kind.label(),
        request = request
    );
    DashboardEffect::FetchCollection { kind, request }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadApplied {
    Superseded,
    Loaded,
    Failed,
}

/// Responses to superseded requests are dropped without touching the slice.
/// Only a `Loaded` outcome may invalidate the selection; a failure keeps
/// the previous rows and leaves everything else alone.
fn apply_load<T>(
    slice: &mut CollectionSlice<T>,
    kind: CollectionKind,
    request: u64,
    outcome: LoadOutcome<T>,
    received_at: DateTime<Utc>,
) -> LoadApplied {
    if !slice.accepts(request) {
        debug!(
            event = "core.collection.load_superseded",
            collection = kind.label(),
            request = request,
            latest = slice.latest_request()
        );
        return LoadApplied::Superseded;
    }

    match outcome {
        LoadOutcome::Loaded(items) => {
            info!(
                event = "core.collection.load_completed",
                collection = kind.label(),
                count = items.len()
            );
            slice.replace(items, received_at);
            LoadApplied::Loaded
        }
        LoadOutcome::LoadFailed(failure) => {
            warn!(
                event = "core.collection.load_failed",
                collection = kind.label(),
                reason = failure.detail().unwrap_or("unknown error")
            );
            slice.fail(failure);
            LoadApplied::Failed
        }
    }
}

/// The single write path for the selection. Table rows and dropdowns both
/// end up here.
fn apply_selection(state: &mut DashboardState, change: SelectionChange, source: SelectionSource) {
    match change {
        SelectionChange::Farmer(phone) => {
            let phone = phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty());
            debug!(
                event = "core.selection.farmer_changed",
                source = source.label(),
                phone = phone.as_deref().unwrap_or("")
            );
            state.selection.farmer_phone = phone;
        }
        SelectionChange::Advisory(id) => {
            let id = id.filter(|id| !id.is_blank());
            debug!(
                event = "core.selection.advisory_changed",
                source = source.label(),
                advisory_id = id.as_ref().map(|id| id.as_str()).unwrap_or("")
            );
            state.selection.advisory_id = id;
        }
    }
    state.validation = None;
    state.recompute_preview();
}

fn reconcile_selected_farmer(state: &mut DashboardState) {
    let Some(phone) = state.selection.farmer_phone.as_deref() else {
        return;
    };
    if state.store.find_farmer(phone).is_none() {
        info!(event = "core.selection.farmer_dropped", phone = phone);
        state.selection.farmer_phone = None;
    }
}

fn reconcile_selected_advisory(state: &mut DashboardState) {
    let Some(id) = state.selection.advisory_id.as_ref() else {
        return;
    };
    if state.store.find_advisory(id).is_none() {
        info!(event = "core.selection.advisory_dropped", advisory_id = id.as_str());
        state.selection.advisory_id = None;
    }
}

fn begin_submission(state: &mut DashboardState) -> Vec<DashboardEffect> {
    if state.is_dispatching() {
        debug!(event = "core.submission.ignored", reason = "dispatch in flight");
        return Vec::new();
    }

    let request = match validate_submission(&state.selection) {
        Ok(request) => request,
        Err(error) => {
            warn!(event = "core.submission.validation_failed", error = %error);
            state.validation = Some(error);
            state.push_notice(NoticeLevel::Danger, error.notice());
            return vec![DashboardEffect::RequestFrame];
        }
    };

    let attempt = state.next_attempt;
    state.next_attempt = state.next_attempt.saturating_add(1);
    state.validation = None;
    state.notice = None;
    state.outcome = SubmissionOutcome::InFlight;
    state.submission = SubmissionPhase::Dispatching {
        attempt,
        request: request.clone(),
    };
    info!(
        event = "core.submission.dispatch_started",
        attempt = attempt,
        advisory_id = request.message_id.as_str(),
        phone = request.phone_number.as_str()
    );

    vec![
        DashboardEffect::SendAdvisory { attempt, request },
        DashboardEffect::RequestFrame,
    ]
}

fn complete_submission(
    state: &mut DashboardState,
    attempt: u64,
    completion: DispatchCompletion,
) -> Vec<DashboardEffect> {
    let request = match &state.submission {
        SubmissionPhase::Dispatching {
            attempt: current,
            request,
        } if *current == attempt => request.clone(),
        _ => {
            warn!(
                event = "core.submission.unexpected_completion",
                attempt = attempt,
                phase = state.submission.label()
            );
            return Vec::new();
        }
    };
    state.submission = SubmissionPhase::Idle;

    match completion {
        DispatchCompletion::Responded(report) if report.success => {
            info!(
                event = "core.submission.succeeded",
                attempt = attempt,
                phone = request.phone_number.as_str()
            );
            state.outcome = SubmissionOutcome::Succeeded(report);
            state.selection.clear();
            state.recompute_preview();
            state.push_notice(NoticeLevel::Success, DISPATCH_SUCCEEDED_NOTICE);
        }
        DispatchCompletion::Responded(report) => {
            warn!(
                event = "core.submission.rejected",
                attempt = attempt,
                error = report.error.as_deref().unwrap_or("unknown error"),
                step = report.step.as_deref().unwrap_or("")
            );
            fail_submission(state, DispatchFailure::Rejected(report));
        }
        DispatchCompletion::TransportFailed(message) => {
            warn!(
                event = "core.submission.transport_failed",
                attempt = attempt,
                error = message.as_str()
            );
            fail_submission(state, DispatchFailure::Transport { request, message });
        }
    }

    vec![DashboardEffect::RequestFrame]
}

fn fail_submission(state: &mut DashboardState, failure: DispatchFailure) {
    state.push_notice(NoticeLevel::Danger, failure.notice());
    state.outcome = SubmissionOutcome::Failed(failure);
}

#[cfg(test)]
mod tests;
