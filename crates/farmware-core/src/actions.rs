use chrono::DateTime;
use chrono::Utc;

use super::state::Advisory;
use super::state::AdvisoryId;
use super::state::CollectionKind;
use super::state::Farmer;
use super::state::LoadOutcome;
use super::wire::DispatchReport;

#[derive(Debug, Clone)]
pub enum DashboardAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

/// Where a selection change came from. Both sources land in the same
/// reducer arm; the source is kept for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    TableRow,
    Dropdown,
}

impl SelectionSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::TableRow => "table-row",
            Self::Dropdown => "dropdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Farmer(Option<String>),
    Advisory(Option<AdvisoryId>),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    Refresh(CollectionKind),
    RefreshAll,
    SetSelection {
        change: SelectionChange,
        source: SelectionSource,
    },
    Submit,
    Reset,
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchCompletion {
    /// The collaborator answered with a decodable report.
    Responded(DispatchReport),
    /// Transport error or malformed body.
    TransportFailed(String),
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    FarmersLoaded {
        request: u64,
        outcome: LoadOutcome<Farmer>,
        received_at: DateTime<Utc>,
    },
    AdvisoriesLoaded {
        request: u64,
        outcome: LoadOutcome<Advisory>,
        received_at: DateTime<Utc>,
    },
    DispatchCompleted {
        attempt: u64,
        completion: DispatchCompletion,
    },
    Tick(DateTime<Utc>),
}

impl RuntimeAction {
    /// Whether this action settles a task the controller spawned.
    pub fn completes_task(&self) -> bool {
        !matches!(self, Self::Tick(_))
    }
}
