use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use super::error::ValidationError;
use super::projection::project_preview;
use super::projection::Preview;
use super::wire::DispatchReport;
use super::wire::DispatchRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Farmers,
    Advisories,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 2] = [CollectionKind::Farmers, CollectionKind::Advisories];

    /// Name of the collection, which is also the array key in the
    /// collaborator's response envelope.
    pub fn label(self) -> &'static str {
        match self {
            Self::Farmers => "farmers",
            Self::Advisories => "advisories",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Farmers => "Farmers",
            Self::Advisories => "Advisories",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "farmers" | "farmer" => Some(Self::Farmers),
            "advisories" | "advisory" => Some(Self::Advisories),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Advisory key. The backend emits integers, form controls emit strings;
/// both collapse to the same canonical text so `7` and `"7"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdvisoryId(String);

impl AdvisoryId {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AdvisoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for AdvisoryId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for AdvisoryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AdvisoryId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Serialize for AdvisoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAdvisoryId {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for AdvisoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawAdvisoryId::deserialize(deserializer)? {
            RawAdvisoryId::Int(value) => Self::from(value),
            RawAdvisoryId::Text(value) => Self::new(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farmer {
    pub id: i64,
    pub phone: String,
    #[serde(default)]
    pub secret_key_preview: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub id: AdvisoryId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
            Self::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// The collaborator answered with `success: false`.
    Rejected { reason: Option<String> },
    /// The request never produced a usable envelope.
    Transport { detail: String },
}

impl LoadFailure {
    pub fn notice(&self, kind: CollectionKind) -> String {
        match self {
            Self::Rejected { reason } => format!(
                "Failed to load {}: {}",
                kind.label(),
                reason.as_deref().unwrap_or("unknown error")
            ),
            Self::Transport { .. } => format!("Error loading {}", kind.label()),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { reason } => reason.as_deref(),
            Self::Transport { detail } => Some(detail.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome<T> {
    Loaded(Vec<T>),
    LoadFailed(LoadFailure),
}

impl<T> LoadOutcome<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

#[derive(Debug, Clone)]
pub struct CollectionSlice<T> {
    items: Vec<T>,
    status: LoadStatus,
    error: Option<LoadFailure>,
    loaded_at: Option<DateTime<Utc>>,
    latest_request: u64,
}

impl<T> Default for CollectionSlice<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: LoadStatus::Idle,
            error: None,
            loaded_at: None,
            latest_request: 0,
        }
    }
}

impl<T> CollectionSlice<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn error(&self) -> Option<&LoadFailure> {
        self.error.as_ref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn latest_request(&self) -> u64 {
        self.latest_request
    }

    pub(crate) fn begin_load(&mut self) -> u64 {
        self.latest_request = self.latest_request.saturating_add(1);
        self.status = LoadStatus::Loading;
        self.latest_request
    }

    /// Only the most recent request may settle the slice; anything older
    /// arrived after it was superseded.
    pub(crate) fn accepts(&self, request: u64) -> bool {
        request == self.latest_request
    }

    pub(crate) fn replace(&mut self, items: Vec<T>, at: DateTime<Utc>) {
        self.items = items;
        self.status = LoadStatus::Loaded;
        self.error = None;
        self.loaded_at = Some(at);
    }

    pub(crate) fn fail(&mut self, failure: LoadFailure) {
        self.status = LoadStatus::Failed;
        self.error = Some(failure);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionStore {
    pub(crate) farmers: CollectionSlice<Farmer>,
    pub(crate) advisories: CollectionSlice<Advisory>,
}

impl CollectionStore {
    pub fn farmers(&self) -> &CollectionSlice<Farmer> {
        &self.farmers
    }

    pub fn advisories(&self) -> &CollectionSlice<Advisory> {
        &self.advisories
    }

    pub fn find_farmer(&self, phone: &str) -> Option<&Farmer> {
        self.farmers.items.iter().find(|farmer| farmer.phone == phone)
    }

    pub fn find_advisory(&self, id: &AdvisoryId) -> Option<&Advisory> {
        self.advisories.items.iter().find(|advisory| &advisory.id == id)
    }

    pub fn status(&self, kind: CollectionKind) -> LoadStatus {
        match kind {
            CollectionKind::Farmers => self.farmers.status,
            CollectionKind::Advisories => self.advisories.status,
        }
    }

    pub fn error(&self, kind: CollectionKind) -> Option<&LoadFailure> {
        match kind {
            CollectionKind::Farmers => self.farmers.error.as_ref(),
            CollectionKind::Advisories => self.advisories.error.as_ref(),
        }
    }

    pub fn len(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::Farmers => self.farmers.len(),
            CollectionKind::Advisories => self.advisories.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub advisory_id: Option<AdvisoryId>,
    pub farmer_phone: Option<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.advisory_id.is_none() && self.farmer_phone.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.advisory_id.is_some() && self.farmer_phone.is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.advisory_id = None;
        self.farmer_phone = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Dispatching {
        attempt: u64,
        request: DispatchRequest,
    },
}

impl SubmissionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Dispatching { .. } => "Dispatching",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchFailure {
    /// The collaborator answered, but without `success: true`.
    Rejected(DispatchReport),
    /// Transport error or an unreadable body.
    Transport {
        request: DispatchRequest,
        message: String,
    },
}

impl DispatchFailure {
    /// Best-effort payload for display. Transport failures carry the keys
    /// that were attempted alongside the error text.
    pub fn report(&self) -> DispatchReport {
        match self {
            Self::Rejected(report) => report.clone(),
            Self::Transport { request, message } => DispatchReport {
                success: false,
                message_id: Some(request.message_id.clone()),
                phone_number: Some(request.phone_number.clone()),
                error: Some(message.clone()),
                ..DispatchReport::default()
            },
        }
    }

    pub fn notice(&self) -> String {
        match self {
            Self::Rejected(report) => format!(
                "Failed to send SMS: {}",
                report.error.as_deref().unwrap_or("unknown error")
            ),
            Self::Transport { message, .. } => format!("Error sending SMS: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionOutcome {
    #[default]
    NotStarted,
    InFlight,
    Succeeded(DispatchReport),
    Failed(DispatchFailure),
}

impl SubmissionOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub seq: u64,
    pub level: NoticeLevel,
    pub message: Arc<str>,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub store: CollectionStore,
    pub selection: Selection,
    pub preview: Preview,
    pub submission: SubmissionPhase,
    pub outcome: SubmissionOutcome,
    pub notice: Option<Notice>,
    pub validation: Option<ValidationError>,
    pub last_updated: Option<DateTime<Utc>>,
    pub(crate) next_attempt: u64,
    pub(crate) next_notice_seq: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            store: CollectionStore::default(),
            selection: Selection::default(),
            preview: Preview::None,
            submission: SubmissionPhase::Idle,
            outcome: SubmissionOutcome::NotStarted,
            notice: None,
            validation: None,
            last_updated: None,
            next_attempt: 1,
            next_notice_seq: 1,
        }
    }

    pub fn is_dispatching(&self) -> bool {
        matches!(self.submission, SubmissionPhase::Dispatching { .. })
    }

    /// The submit control is disabled for the whole dispatch.
    pub fn submit_enabled(&self) -> bool {
        !self.is_dispatching()
    }

    pub(crate) fn push_notice(&mut self, level: NoticeLevel, message: impl Into<Arc<str>>) {
        let seq = self.next_notice_seq;
        self.next_notice_seq = self.next_notice_seq.saturating_add(1);
        self.notice = Some(Notice {
            seq,
            level,
            message: message.into(),
        });
    }

    pub(crate) fn recompute_preview(&mut self) {
        self.preview = project_preview(&self.store, &self.selection);
    }
}
