//! Caller identity threaded through mutating operations.

use serde::{Deserialize, Serialize};

/// Identity of the caller performing a mutation.
///
/// Every mutating service operation takes this explicitly; there is no
/// global fallback user. The HTTP layer builds it from the authenticated
/// session before calling into the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub user_id: String,
    pub user_name: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}
