use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProjectId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: Uuid,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub created_at: DateTime<Utc>,
}
