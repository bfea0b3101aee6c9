use super::*;
use pretty_assertions::assert_eq;

#[test]
fn refresh_marks_slice_loading_and_requests_fetch() {
    let mut state = state();

    let request = begin_refresh(&mut state, CollectionKind::Farmers);

    assert_eq!(request, 1);
    assert_eq!(state.store.status(CollectionKind::Farmers), LoadStatus::Loading);
    assert_eq!(state.store.status(CollectionKind::Advisories), LoadStatus::Idle);
}

#[test]
fn refresh_all_fetches_both_collections() {
    let mut state = state();

    let effects = user(&mut state, UserAction::RefreshAll);

    assert_eq!(
        effects,
        vec![
            DashboardEffect::FetchCollection {
                kind: CollectionKind::Farmers,
                request: 1,
            },
            DashboardEffect::FetchCollection {
                kind: CollectionKind::Advisories,
                request: 1,
            },
            DashboardEffect::RequestFrame,
        ]
    );
}

#[test]
fn successful_load_replaces_rows_and_records_time() {
    let mut state = state();
    load_farmers(&mut state, vec![farmer(1, "+1"), farmer(2, "+2")]);

    let slice = state.store.farmers();
    assert_eq!(slice.status(), LoadStatus::Loaded);
    assert_eq!(slice.len(), 2);
    assert_eq!(slice.loaded_at(), Some(at(9)));
    assert!(slice.error().is_none());

    load_farmers(&mut state, vec![farmer(3, "+3")]);
    let phones: Vec<&str> = state
        .store
        .farmers()
        .items()
        .iter()
        .map(|farmer| farmer.phone.as_str())
        .collect();
    assert_eq!(phones, vec!["+3"]);
}

#[test]
fn empty_load_is_loaded_not_failed() {
    let mut state = state();
    load_advisories(&mut state, Vec::new());

    assert_eq!(state.store.status(CollectionKind::Advisories), LoadStatus::Loaded);
    assert_eq!(state.store.len(CollectionKind::Advisories), 0);
}

#[test]
fn rejected_load_keeps_previous_rows_and_reports_reason() {
    let mut state = state();
    load_farmers(&mut state, vec![farmer(1, "+1")]);

    let request = begin_refresh(&mut state, CollectionKind::Farmers);
    runtime(
        &mut state,
        RuntimeAction::FarmersLoaded {
            request,
            outcome: LoadOutcome::LoadFailed(LoadFailure::Rejected {
                reason: Some("database locked".to_string()),
            }),
            received_at: at(10),
        },
    );

    assert_eq!(state.store.status(CollectionKind::Farmers), LoadStatus::Failed);
    assert_eq!(state.store.len(CollectionKind::Farmers), 1);
    assert_eq!(state.store.farmers().loaded_at(), Some(at(9)));
    let notice = state
        .store
        .error(CollectionKind::Farmers)
        .map(|failure| failure.notice(CollectionKind::Farmers));
    assert_eq!(
        notice.as_deref(),
        Some("Failed to load farmers: database locked")
    );
}

#[test]
fn transport_failure_uses_generic_notice() {
    let mut state = state();
    let request = begin_refresh(&mut state, CollectionKind::Advisories);
    runtime(
        &mut state,
        RuntimeAction::AdvisoriesLoaded {
            request,
            outcome: LoadOutcome::LoadFailed(LoadFailure::Transport {
                detail: "connection refused".to_string(),
            }),
            received_at: at(10),
        },
    );

    let failure = state.store.error(CollectionKind::Advisories).cloned();
    assert_eq!(
        failure.map(|failure| failure.notice(CollectionKind::Advisories)),
        Some("Error loading advisories".to_string())
    );
}

#[test]
fn superseded_response_is_discarded() {
    let mut state = state();
    let first = begin_refresh(&mut state, CollectionKind::Farmers);
    let second = begin_refresh(&mut state, CollectionKind::Farmers);
    assert!(second > first);

    let effects = runtime(
        &mut state,
        RuntimeAction::FarmersLoaded {
            request: first,
            outcome: LoadOutcome::Loaded(vec![farmer(1, "+old")]),
            received_at: at(9),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.store.status(CollectionKind::Farmers), LoadStatus::Loading);
    assert_eq!(state.store.len(CollectionKind::Farmers), 0);

    runtime(
        &mut state,
        RuntimeAction::FarmersLoaded {
            request: second,
            outcome: LoadOutcome::Loaded(vec![farmer(2, "+new")]),
            received_at: at(10),
        },
    );
    assert_eq!(state.store.status(CollectionKind::Farmers), LoadStatus::Loaded);
    assert!(state.store.find_farmer("+new").is_some());
    assert!(state.store.find_farmer("+old").is_none());
}

#[test]
fn collections_load_independently() {
    let mut state = state();
    let farmers = begin_refresh(&mut state, CollectionKind::Farmers);
    let advisories = begin_refresh(&mut state, CollectionKind::Advisories);

    runtime(
        &mut state,
        RuntimeAction::AdvisoriesLoaded {
            request: advisories,
            outcome: LoadOutcome::Loaded(vec![advisory(1, "Frost", "Cover seedlings.")]),
            received_at: at(9),
        },
    );
    assert_eq!(state.store.status(CollectionKind::Advisories), LoadStatus::Loaded);
    assert_eq!(state.store.status(CollectionKind::Farmers), LoadStatus::Loading);

    runtime(
        &mut state,
        RuntimeAction::FarmersLoaded {
            request: farmers,
            outcome: LoadOutcome::LoadFailed(LoadFailure::Rejected { reason: None }),
            received_at: at(9),
        },
    );
    assert_eq!(state.store.status(CollectionKind::Farmers), LoadStatus::Failed);
    assert_eq!(state.store.status(CollectionKind::Advisories), LoadStatus::Loaded);
    assert_eq!(
        state
            .store
            .error(CollectionKind::Farmers)
            .map(|failure| failure.notice(CollectionKind::Farmers)),
        Some("Failed to load farmers: unknown error".to_string())
    );
}

#[test]
fn tick_updates_clock() {
    let mut state = state();

    let effects = runtime(&mut state, RuntimeAction::Tick(at(12)));

    assert_eq!(state.last_updated, Some(at(12)));
    assert_eq!(effects, vec![DashboardEffect::RequestFrame]);
}
