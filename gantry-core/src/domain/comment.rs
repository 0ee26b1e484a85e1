//! Comment domain model

use serde::{Deserialize, Serialize};

/// A comment on a commit or pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Platform comment identifier
    pub id: u64,

    /// Markdown body
    pub body: String,
}
