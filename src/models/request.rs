//! Submit request model.

use crate::error::AppError;
use chrono::NaiveDateTime;
use std::str::FromStr;

/// State of a submit request.
///
/// OBS reports the state as a free-form attribute; only these values are
/// known to this viewer. Anything else is rejected at parse time rather
/// than rendered with a guessed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStateKind {
    New,
    Review,
    Accepted,
    Declined,
    Revoked,
    Superseded,
}

impl FromStr for RequestStateKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "review" => Ok(Self::Review),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "revoked" => Ok(Self::Revoked),
            "superseded" => Ok(Self::Superseded),
            other => Err(AppError::render(format!(
                "Unknown request state: {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for RequestStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Review => write!(f, "review"),
            Self::Accepted => write!(f, "accepted"),
            Self::Declined => write!(f, "declined"),
            Self::Revoked => write!(f, "revoked"),
            Self::Superseded => write!(f, "superseded"),
        }
    }
}

/// The action a request performs (submit, delete, ...) and the
/// source/target coordinates it applies to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestAction {
    /// Action type: `submit`, `delete`, `maintenance_incident`, ...
    pub kind: String,

    pub source_project: Option<String>,
    pub source_package: Option<String>,

    /// Source revision the diff was taken against.
    pub source_rev: Option<String>,

    pub target_project: Option<String>,
    pub target_package: Option<String>,
}

/// Current state of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    /// Raw state name as reported by OBS.
    pub name: String,

    /// User who moved the request into this state.
    pub who: Option<String>,

    /// Timestamp of the last state change (OBS local time).
    pub when: Option<String>,

    /// Timestamp the request was created.
    pub created: Option<String>,

    /// State change comment, empty if none was given.
    pub comment: String,

    /// Id of the superseding request, only set for `superseded`.
    pub superseded_by: Option<String>,
}

impl RequestState {
    /// Parse the state name, rejecting values this viewer does not know.
    pub fn kind(&self) -> Result<RequestStateKind, AppError> {
        self.name.parse()
    }
}

/// One entry in a review's history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEvent {
    pub who: String,
    pub when: NaiveDateTime,
    pub description: String,
    pub comment: String,
}

/// A review attached to a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Review {
    pub state: String,
    pub who: Option<String>,
    pub when: Option<String>,
    pub by_user: Option<String>,
    pub by_group: Option<String>,
    pub by_project: Option<String>,
    pub comment: String,
    pub history: Vec<ReviewEvent>,
}

/// A submit/delete request as fetched from OBS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub id: String,
    pub creator: String,
    pub description: String,
    pub action: RequestAction,
    pub state: RequestState,
    pub reviews: Vec<Review>,
}

impl Request {
    /// The staging project this request sits in, if any.
    ///
    /// Accepted and superseded requests have left staging, so no staging
    /// project is reported for them even when a stale review remains.
    pub fn staging_project(&self) -> Option<&str> {
        if matches!(self.state.name.as_str(), "accepted" | "superseded") {
            return None;
        }
        self.reviews
            .iter()
            .filter_map(|r| r.by_project.as_deref())
            .find(|p| p.contains("openSUSE:Factory:Staging"))
    }

    /// Package name used for display and build-result matching.
    ///
    /// Staged requests build under the target name; unstaged ones are still
    /// building in their source project.
    pub fn display_package(&self) -> Option<&str> {
        if self.staging_project().is_some() {
            self.action.target_package.as_deref()
        } else {
            self.action.source_package.as_deref()
        }
    }

    /// Project whose build results describe this request.
    pub fn build_project(&self) -> Option<&str> {
        self.staging_project()
            .or(self.action.source_project.as_deref())
    }
}
