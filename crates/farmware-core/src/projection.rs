use chrono::DateTime;
use chrono::NaiveDateTime;

use super::state::AdvisoryId;
use super::state::CollectionKind;
use super::state::CollectionStore;
use super::state::DashboardState;
use super::state::LoadStatus;
use super::state::Selection;
use super::state::SubmissionOutcome;
use super::wire::DispatchReport;

pub const PREVIEW_MESSAGE_LIMIT: usize = 200;
pub const TABLE_MESSAGE_LIMIT: usize = 50;
pub const ELLIPSIS: &str = "...";
pub const RESULT_HEADING: &str = "SMS Sending Result";
pub const PROVIDER_DETAILS_HEADING: &str = "SMS Provider Details";
pub const FARMER_PLACEHOLDER: &str = "Select Farmer...";
pub const ADVISORY_PLACEHOLDER: &str = "Select Advisory...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewModel {
    pub advisory_title: String,
    pub farmer_phone: String,
    pub truncated_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Preview {
    #[default]
    None,
    Ready(PreviewModel),
}

impl Preview {
    pub fn model(&self) -> Option<&PreviewModel> {
        match self {
            Self::None => None,
            Self::Ready(model) => Some(model),
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Stale keys (pointing at entries no longer in the store) read as no
/// selection.
pub fn project_preview(store: &CollectionStore, selection: &Selection) -> Preview {
    let (Some(advisory_id), Some(phone)) = (
        selection.advisory_id.as_ref(),
        selection.farmer_phone.as_deref(),
    ) else {
        return Preview::None;
    };
    let (Some(advisory), Some(farmer)) = (store.find_advisory(advisory_id), store.find_farmer(phone))
    else {
        return Preview::None;
    };

    Preview::Ready(PreviewModel {
        advisory_title: advisory.title.clone(),
        farmer_phone: farmer.phone.clone(),
        truncated_message: truncate_chars(&advisory.message, PREVIEW_MESSAGE_LIMIT),
    })
}

/// Caps `text` at `limit` characters, appending [`ELLIPSIS`] only when
/// something was cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + ELLIPSIS.len());
            out.push_str(&text[..cut]);
            out.push_str(ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Failed,
}

impl ResultStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultField {
    AdvisoryId,
    Phone,
    AdvisoryTitle,
    VerificationCode,
    SmsContent,
    Error,
    FailedStep,
}

impl ResultField {
    pub fn label(self) -> &'static str {
        match self {
            Self::AdvisoryId => "Advisory ID",
            Self::Phone => "Phone",
            Self::AdvisoryTitle => "Advisory",
            Self::VerificationCode => "Verification Code",
            Self::SmsContent => "SMS Content",
            Self::Error => "Error",
            Self::FailedStep => "Failed at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub field: ResultField,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultModel {
    pub status: ResultStatus,
    pub heading: &'static str,
    pub lines: Vec<ResultLine>,
    /// Raw provider diagnostics, pretty-printed.
    pub provider_details: Option<String>,
}

impl ResultModel {
    pub fn line(&self, field: ResultField) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.field == field)
            .map(|line| line.value.as_str())
    }
}

pub fn project_result(outcome: &SubmissionOutcome) -> Option<ResultModel> {
    match outcome {
        SubmissionOutcome::NotStarted | SubmissionOutcome::InFlight => None,
        SubmissionOutcome::Succeeded(report) => Some(result_model(ResultStatus::Success, report)),
        SubmissionOutcome::Failed(failure) => Some(result_model(ResultStatus::Failed, &failure.report())),
    }
}

fn result_model(status: ResultStatus, report: &DispatchReport) -> ResultModel {
    let mut lines = Vec::new();
    let mut push = |field: ResultField, value: Option<&str>| {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            lines.push(ResultLine {
                field,
                value: value.to_string(),
            });
        }
    };
    push(
        ResultField::AdvisoryId,
        report.message_id.as_ref().map(AdvisoryId::as_str),
    );
    push(ResultField::Phone, report.phone_number.as_deref());
    push(ResultField::AdvisoryTitle, report.advisory_title.as_deref());
    push(ResultField::VerificationCode, report.verification_code.as_deref());
    push(ResultField::SmsContent, report.sms_content.as_deref());
    push(ResultField::Error, report.error.as_deref());
    push(ResultField::FailedStep, report.step.as_deref());

    let provider_details = report
        .sms_details
        .as_ref()
        .filter(|details| !details.is_null())
        .map(|details| serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string()));

    ResultModel {
        status,
        heading: RESULT_HEADING,
        lines,
        provider_details,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmerRow {
    pub id: i64,
    pub phone: String,
    pub secret_key_preview: String,
    pub created: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryRow {
    pub id: AdvisoryId,
    pub title: String,
    pub message_preview: String,
    pub created: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody<R> {
    Loading,
    Empty(&'static str),
    Rows(Vec<R>),
}

/// Table contents plus any load-error notice. A failed refresh keeps the
/// previous rows and shows the notice next to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView<R> {
    pub count: usize,
    pub body: TableBody<R>,
    pub notice: Option<String>,
}

pub fn farmer_table(state: &DashboardState) -> TableView<FarmerRow> {
    let slice = state.store.farmers();
    let selected = state.selection.farmer_phone.as_deref();
    let rows = slice
        .items()
        .iter()
        .map(|farmer| FarmerRow {
            id: farmer.id,
            phone: farmer.phone.clone(),
            secret_key_preview: farmer.secret_key_preview.clone(),
            created: format_timestamp(farmer.created_at.as_deref()),
            selected: selected == Some(farmer.phone.as_str()),
        })
        .collect();
    table_view(state, CollectionKind::Farmers, "No farmers found", rows)
}

pub fn advisory_table(state: &DashboardState) -> TableView<AdvisoryRow> {
    let slice = state.store.advisories();
    let selected = state.selection.advisory_id.as_ref();
    let rows = slice
        .items()
        .iter()
        .map(|advisory| AdvisoryRow {
            id: advisory.id.clone(),
            title: advisory.title.clone(),
            message_preview: truncate_chars(&advisory.message, TABLE_MESSAGE_LIMIT),
            created: format_timestamp(advisory.created_at.as_deref()),
            selected: selected == Some(&advisory.id),
        })
        .collect();
    table_view(state, CollectionKind::Advisories, "No advisories found", rows)
}

fn table_view<R>(
    state: &DashboardState,
    kind: CollectionKind,
    empty_label: &'static str,
    rows: Vec<R>,
) -> TableView<R> {
    let count = rows.len();
    let status = state.store.status(kind);
    let notice = state.store.error(kind).map(|failure| failure.notice(kind));
    let body = if status == LoadStatus::Loading && rows.is_empty() {
        TableBody::Loading
    } else if rows.is_empty() {
        TableBody::Empty(empty_label)
    } else {
        TableBody::Rows(rows)
    };
    TableView {
        count,
        body,
        notice,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption<V> {
    /// `None` is the placeholder entry.
    pub value: Option<V>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropdown<V> {
    pub options: Vec<SelectOption<V>>,
    pub selected: usize,
}

impl<V: Clone> Dropdown<V> {
    pub fn current(&self) -> Option<&SelectOption<V>> {
        self.options.get(self.selected)
    }

    /// Value of the option `step` entries away from the current one,
    /// wrapping around the placeholder.
    pub fn value_at_offset(&self, step: isize) -> Option<V> {
        if self.options.is_empty() {
            return None;
        }
        let len = self.options.len() as isize;
        let next = (self.selected as isize + step).rem_euclid(len) as usize;
        self.options[next].value.clone()
    }
}

pub fn farmer_dropdown(state: &DashboardState) -> Dropdown<String> {
    let mut options = vec![SelectOption {
        value: None,
        label: FARMER_PLACEHOLDER.to_string(),
    }];
    options.extend(state.store.farmers().items().iter().map(|farmer| SelectOption {
        value: Some(farmer.phone.clone()),
        label: format!("{} (ID: {})", farmer.phone, farmer.id),
    }));
    let selected = selected_index(&options, state.selection.farmer_phone.as_ref());
    Dropdown { options, selected }
}

pub fn advisory_dropdown(state: &DashboardState) -> Dropdown<AdvisoryId> {
    let mut options = vec![SelectOption {
        value: None,
        label: ADVISORY_PLACEHOLDER.to_string(),
    }];
    options.extend(
        state
            .store
            .advisories()
            .items()
            .iter()
            .map(|advisory| SelectOption {
                value: Some(advisory.id.clone()),
                label: format!("{}: {}", advisory.id, advisory.title),
            }),
    );
    let selected = selected_index(&options, state.selection.advisory_id.as_ref());
    Dropdown { options, selected }
}

fn selected_index<V: PartialEq>(options: &[SelectOption<V>], current: Option<&V>) -> usize {
    let Some(current) = current else {
        return 0;
    };
    options
        .iter()
        .position(|option| option.value.as_ref() == Some(current))
        .unwrap_or(0)
}

pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return "N/A".to_string();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}
