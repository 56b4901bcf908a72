use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The caller resolved from a valid session. Every entry query is scoped to `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}
