//! Request comment model.

use serde::Serialize;

/// A comment on the request's discussion thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comment {
    pub id: String,
    pub who: String,
    pub when: String,

    /// Id of the parent comment for threaded replies.
    pub parent: Option<String>,

    pub body: String,
}
