use super::*;
use pretty_assertions::assert_eq;

#[test]
fn table_row_and_dropdown_write_the_same_selection() {
    let mut from_table = state();
    load_farmers(&mut from_table, vec![farmer(1, "+1"), farmer(2, "+2")]);
    let mut from_dropdown = from_table.clone();

    select_farmer(&mut from_table, Some("+2"), SelectionSource::TableRow);
    select_farmer(&mut from_dropdown, Some("+2"), SelectionSource::Dropdown);

    assert_eq!(from_table.selection, from_dropdown.selection);
    assert_eq!(from_table.selection.farmer_phone.as_deref(), Some("+2"));
}

#[test]
fn latest_write_wins_across_sources() {
    let mut state = state();
    load_advisories(
        &mut state,
        vec![advisory(1, "Frost", "a"), advisory(2, "Rain", "b")],
    );

    select_advisory(&mut state, Some("1"), SelectionSource::TableRow);
    select_advisory(&mut state, Some("2"), SelectionSource::Dropdown);
    assert_eq!(state.selection.advisory_id, Some(AdvisoryId::from(2)));

    select_advisory(&mut state, Some("1"), SelectionSource::TableRow);
    assert_eq!(state.selection.advisory_id, Some(AdvisoryId::from(1)));
}

#[test]
fn numeric_and_text_advisory_keys_compare_equal() {
    let mut state = state();
    load_advisories(&mut state, vec![advisory(7, "Frost", "a")]);

    select_advisory(&mut state, Some(" 7 "), SelectionSource::Dropdown);

    assert_eq!(state.selection.advisory_id, Some(AdvisoryId::from(7)));
    assert!(state.store.find_advisory(&AdvisoryId::from("7")).is_some());
}

#[test]
fn placeholder_or_blank_clears_half() {
    let mut state = ready_state();

    select_farmer(&mut state, Some("   "), SelectionSource::Dropdown);
    assert_eq!(state.selection.farmer_phone, None);

    select_advisory(&mut state, None, SelectionSource::Dropdown);
    assert_eq!(state.selection.advisory_id, None);
    assert!(state.selection.is_empty());
}

#[test]
fn selection_of_unknown_key_is_kept_but_not_previewed() {
    let mut state = ready_state();

    select_farmer(&mut state, Some("+999"), SelectionSource::Dropdown);

    assert_eq!(state.selection.farmer_phone.as_deref(), Some("+999"));
    assert_eq!(state.preview, Preview::None);
}

#[test]
fn reload_without_selected_farmer_drops_that_half_only() {
    let mut state = ready_state();

    load_farmers(&mut state, vec![farmer(2, "+254700000002")]);

    assert_eq!(state.selection.farmer_phone, None);
    assert_eq!(state.selection.advisory_id, Some(AdvisoryId::from(7)));
    assert_eq!(state.preview, Preview::None);
}

#[test]
fn reload_keeping_selected_advisory_preserves_selection() {
    let mut state = ready_state();

    load_advisories(
        &mut state,
        vec![
            advisory(5, "Pests", "Check leaves."),
            advisory(7, "Drought Alert", "Irrigate at dusk instead."),
        ],
    );

    assert_eq!(state.selection.advisory_id, Some(AdvisoryId::from(7)));
    assert_eq!(
        state.preview.model().map(|model| model.truncated_message.as_str()),
        Some("Irrigate at dusk instead.")
    );
}

#[test]
fn failed_reload_does_not_touch_selection() {
    let mut state = ready_state();
    let request = begin_refresh(&mut state, CollectionKind::Farmers);

    runtime(
        &mut state,
        RuntimeAction::FarmersLoaded {
            request,
            outcome: LoadOutcome::LoadFailed(LoadFailure::Transport {
                detail: "timeout".to_string(),
            }),
            received_at: at(11),
        },
    );

    assert!(state.selection.is_complete());
    assert!(state.preview.is_visible());
}

#[test]
fn failed_reload_keeps_selection_of_unknown_farmer() {
    let mut state = ready_state();
    select_farmer(&mut state, Some("+999"), SelectionSource::Dropdown);
    let request = begin_refresh(&mut state, CollectionKind::Farmers);

    runtime(
        &mut state,
        RuntimeAction::FarmersLoaded {
            request,
            outcome: LoadOutcome::LoadFailed(LoadFailure::Transport {
                detail: "timeout".to_string(),
            }),
            received_at: at(11),
        },
    );

    assert_eq!(state.selection.farmer_phone.as_deref(), Some("+999"));
    assert_eq!(state.preview, Preview::None);
    assert_preview_sync(&state);
}

#[test]
fn rejected_reload_keeps_selection_of_unknown_advisory() {
    let mut state = ready_state();
    select_advisory(&mut state, Some("99"), SelectionSource::Dropdown);
    let request = begin_refresh(&mut state, CollectionKind::Advisories);

    runtime(
        &mut state,
        RuntimeAction::AdvisoriesLoaded {
            request,
            outcome: LoadOutcome::LoadFailed(LoadFailure::Rejected {
                reason: Some("db offline".to_string()),
            }),
            received_at: at(11),
        },
    );

    assert_eq!(state.selection.advisory_id, Some(AdvisoryId::from("99")));
    assert_eq!(
        state.selection.farmer_phone.as_deref(),
        Some("+254700000001")
    );
}

#[test]
fn selecting_clears_previous_validation_error() {
    let mut state = state();
    load_farmers(&mut state, vec![farmer(1, "+1")]);
    user(&mut state, UserAction::Submit);
    assert_eq!(state.validation, Some(ValidationError::MissingSelection));

    select_farmer(&mut state, Some("+1"), SelectionSource::TableRow);

    assert_eq!(state.validation, None);
}
