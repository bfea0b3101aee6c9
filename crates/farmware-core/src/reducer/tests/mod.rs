use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::validate_submission;
pub(super) use super::DashboardEffect;
pub(super) use super::DISPATCH_SUCCEEDED_NOTICE;
pub(super) use crate::actions::DashboardAction;
pub(super) use crate::actions::DispatchCompletion;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::SelectionChange;
pub(super) use crate::actions::SelectionSource;
pub(super) use crate::actions::UserAction;
pub(super) use crate::error::ValidationError;
pub(super) use crate::error::SELECTION_REQUIRED_NOTICE;
pub(super) use crate::projection::project_preview;
pub(super) use crate::projection::project_result;
pub(super) use crate::projection::Preview;
pub(super) use crate::projection::PreviewModel;
pub(super) use crate::projection::ResultField;
pub(super) use crate::projection::ResultStatus;
pub(super) use crate::state::Advisory;
pub(super) use crate::state::AdvisoryId;
pub(super) use crate::state::CollectionKind;
pub(super) use crate::state::DashboardState;
pub(super) use crate::state::DispatchFailure;
pub(super) use crate::state::Farmer;
pub(super) use crate::state::LoadFailure;
pub(super) use crate::state::LoadOutcome;
pub(super) use crate::state::LoadStatus;
pub(super) use crate::state::NoticeLevel;
pub(super) use crate::state::Selection;
pub(super) use crate::state::SubmissionOutcome;
pub(super) use crate::state::SubmissionPhase;
pub(super) use crate::wire::DispatchReport;
pub(super) use crate::wire::DispatchRequest;

mod collection_loading;
mod selection_sync;

fn state() -> DashboardState {
    DashboardState::new()
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn farmer(id: i64, phone: &str) -> Farmer {
    Farmer {
        id,
        phone: phone.to_string(),
        secret_key_preview: "ab12...".to_string(),
        created_at: Some("2024-01-15T10:30:00".to_string()),
    }
}

fn advisory(id: i64, title: &str, message: &str) -> Advisory {
    Advisory {
        id: AdvisoryId::from(id),
        title: title.to_string(),
        message: message.to_string(),
        created_at: None,
    }
}

fn user(state: &mut DashboardState, action: UserAction) -> Vec<DashboardEffect> {
    reduce(state, DashboardAction::User(action))
}

fn runtime(state: &mut DashboardState, action: RuntimeAction) -> Vec<DashboardEffect> {
    reduce(state, DashboardAction::Runtime(action))
}

/// Issues a refresh for `kind` and returns the request sequence it was
/// given.
fn begin_refresh(state: &mut DashboardState, kind: CollectionKind) -> u64 {
    let effects = user(state, UserAction::Refresh(kind));
    match effects.as_slice() {
        [DashboardEffect::FetchCollection {
            kind: fetched,
            request,
        }, DashboardEffect::RequestFrame] => {
            assert_eq!(*fetched, kind);
            *request
        }
        other => panic!("unexpected refresh effects: {other:?}"),
    }
}

fn load_farmers(state: &mut DashboardState, farmers: Vec<Farmer>) {
    let request = begin_refresh(state, CollectionKind::Farmers);
    runtime(
        state,
        RuntimeAction::FarmersLoaded {
            request,
            outcome: LoadOutcome::Loaded(farmers),
            received_at: at(9),
        },
    );
}

fn load_advisories(state: &mut DashboardState, advisories: Vec<Advisory>) {
    let request = begin_refresh(state, CollectionKind::Advisories);
    runtime(
        state,
        RuntimeAction::AdvisoriesLoaded {
            request,
            outcome: LoadOutcome::Loaded(advisories),
            received_at: at(9),
        },
    );
}

fn select_farmer(state: &mut DashboardState, phone: Option<&str>, source: SelectionSource) {
    user(
        state,
        UserAction::SetSelection {
            change: SelectionChange::Farmer(phone.map(str::to_string)),
            source,
        },
    );
}

fn select_advisory(state: &mut DashboardState, id: Option<&str>, source: SelectionSource) {
    user(
        state,
        UserAction::SetSelection {
            change: SelectionChange::Advisory(id.map(AdvisoryId::from)),
            source,
        },
    );
}

/// A dashboard with one farmer and one advisory loaded and both selected.
fn ready_state() -> DashboardState {
    let mut state = state();
    load_farmers(&mut state, vec![farmer(1, "+254700000001")]);
    load_advisories(
        &mut state,
        vec![advisory(7, "Drought Alert", "Irrigate early in the morning.")],
    );
    select_farmer(&mut state, Some("+254700000001"), SelectionSource::TableRow);
    select_advisory(&mut state, Some("7"), SelectionSource::TableRow);
    state
}

/// Submits and returns the attempt id of the dispatch that was started.
fn start_dispatch(state: &mut DashboardState) -> u64 {
    let effects = user(state, UserAction::Submit);
    match effects.as_slice() {
        [DashboardEffect::SendAdvisory { attempt, .. }, DashboardEffect::RequestFrame] => *attempt,
        other => panic!("unexpected submit effects: {other:?}"),
    }
}

fn assert_preview_sync(state: &DashboardState) {
    assert_eq!(
        state.preview,
        project_preview(&state.store, &state.selection)
    );
}
