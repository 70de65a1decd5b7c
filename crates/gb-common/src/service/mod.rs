//! Marketplace services. Each takes an explicit [`Requester`](crate::model::Requester)
//! and reaches storage only through a [`Gateway`].

pub mod contracts;
pub mod gateway;
pub mod lifecycle;
pub mod materializer;
pub mod projects;
pub mod recruitment;
pub mod saved_jobs;

use std::sync::Arc;
use std::time::Duration;

use crate::store::MarketStore;

pub use contracts::ContractService;
pub use gateway::{Gateway, DEFAULT_STORE_TIMEOUT};
pub use lifecycle::{AcceptanceResult, ProposalLifecycle};
pub use materializer::ContractMaterializer;
pub use projects::ProjectService;
pub use recruitment::RecruitmentService;
pub use saved_jobs::SavedJobService;

/// Every service wired to one store.
#[derive(Clone)]
pub struct Services {
    pub gateway: Gateway,
    pub projects: ProjectService,
    pub proposals: ProposalLifecycle,
    pub materializer: ContractMaterializer,
    pub contracts: ContractService,
    pub saved_jobs: SavedJobService,
    pub recruitment: RecruitmentService,
}

impl Services {
    pub fn new(store: Arc<dyn MarketStore>, store_timeout: Duration) -> Self {
        let gateway = Gateway::new(store, store_timeout);
        Self {
            projects: ProjectService::new(gateway.clone()),
            proposals: ProposalLifecycle::new(gateway.clone()),
            materializer: ContractMaterializer::new(gateway.clone()),
            contracts: ContractService::new(gateway.clone()),
            saved_jobs: SavedJobService::new(gateway.clone()),
            recruitment: RecruitmentService::new(gateway.clone()),
            gateway,
        }
    }
}
