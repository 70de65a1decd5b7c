use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitProposalRequest {
    pub bid_amount: i64,
    pub timeline: String,
    pub cover_letter: String,
}
