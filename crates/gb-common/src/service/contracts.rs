use metrics::counter;
use tracing::{info, instrument};

use crate::error::MarketError;
use crate::model::contract::MAX_PROGRESS;
use crate::model::{Contract, ContractClosure, ContractId, ContractStatus, Requester};

use super::lifecycle::validate_text;
use super::Gateway;

const MAX_REASON_LEN: usize = 2_000;

/// Progress updates and the two terminal transitions of a contract.
#[derive(Clone)]
pub struct ContractService {
    gateway: Gateway,
}

impl ContractService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    async fn load(&self, id: ContractId) -> Result<Contract, MarketError> {
        self.gateway
            .call("get_contract", self.gateway.store().get_contract(id))
            .await?
            .ok_or_else(|| MarketError::not_found("contract", id))
    }

    async fn load_for_party(
        &self,
        requester: &Requester,
        id: ContractId,
    ) -> Result<Contract, MarketError> {
        let user = requester.require()?;
        let contract = self.load(id).await?;
        if !contract.is_party(user) {
            return Err(MarketError::forbidden(
                "only the client or the freelancer may access this contract",
            ));
        }
        Ok(contract)
    }

    pub async fn get_contract(
        &self,
        requester: &Requester,
        id: ContractId,
    ) -> Result<Contract, MarketError> {
        self.load_for_party(requester, id).await
    }

    pub async fn list_my_contracts(&self, requester: &Requester) -> Result<Vec<Contract>, MarketError> {
        let user = requester.require()?;
        self.gateway
            .call(
                "list_contracts_for_user",
                self.gateway.store().list_contracts_for_user(user),
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn update_progress(
        &self,
        requester: &Requester,
        id: ContractId,
        progress: i32,
    ) -> Result<Contract, MarketError> {
        requester.require()?;
        if !(0..=MAX_PROGRESS).contains(&progress) {
            return Err(MarketError::validation(format!(
                "progress must be between 0 and {MAX_PROGRESS}"
            )));
        }

        let contract = self.load_for_party(requester, id).await?;
        if contract.status != ContractStatus::Active {
            return Err(not_active(&contract));
        }

        self.gateway
            .call(
                "update_contract_progress",
                self.gateway.store().update_contract_progress(id, progress),
            )
            .await?
            .ok_or_else(|| MarketError::conflict(format!("contract {id} was closed concurrently")))
    }

    /// Mark the contract completed. Completing twice returns the completed row.
    #[instrument(skip(self))]
    pub async fn complete_contract(
        &self,
        requester: &Requester,
        id: ContractId,
    ) -> Result<Contract, MarketError> {
        let contract = self.load_for_party(requester, id).await?;
        match contract.status {
            ContractStatus::Completed => return Ok(contract),
            ContractStatus::Cancelled => return Err(not_active(&contract)),
            ContractStatus::Active => {}
        }

        let closure = ContractClosure {
            status: ContractStatus::Completed,
            progress: MAX_PROGRESS,
            terms: contract.terms.clone(),
        };
        self.close(contract, closure).await
    }

    /// Cancel with a reason appended to the terms. Cancelling twice returns
    /// the cancelled row unchanged.
    #[instrument(skip(self, reason))]
    pub async fn cancel_contract(
        &self,
        requester: &Requester,
        id: ContractId,
        reason: &str,
    ) -> Result<Contract, MarketError> {
        requester.require()?;
        let reason = validate_text("reason", reason, MAX_REASON_LEN)?;

        let contract = self.load_for_party(requester, id).await?;
        match contract.status {
            ContractStatus::Cancelled => return Ok(contract),
            ContractStatus::Completed => return Err(not_active(&contract)),
            ContractStatus::Active => {}
        }

        let closure = ContractClosure {
            status: ContractStatus::Cancelled,
            progress: contract.progress,
            terms: Some(append_cancellation_reason(contract.terms.as_deref(), &reason)),
        };
        self.close(contract, closure).await
    }

    async fn close(
        &self,
        contract: Contract,
        closure: ContractClosure,
    ) -> Result<Contract, MarketError> {
        let id = contract.id;
        let closed = self
            .gateway
            .call(
                "close_contract",
                self.gateway.store().close_contract(id, &closure),
            )
            .await?;

        match closed {
            Some(closed) => {
                counter!("gb_contract_closures_total", "status" => closed.status.as_ref().to_string())
                    .increment(1);
                info!(
                    contract_id = %id,
                    project_id = closed.project_id,
                    status = closed.status.as_ref(),
                    "contract_closed"
                );
                Ok(closed)
            }
            // Someone else closed it first; same target status is a replay.
            None => {
                let current = self.load(id).await?;
                if current.status == closure.status {
                    Ok(current)
                } else {
                    Err(not_active(&current))
                }
            }
        }
    }
}

fn not_active(contract: &Contract) -> MarketError {
    MarketError::conflict(format!(
        "contract {} is {}",
        contract.id,
        contract.status.as_ref()
    ))
}

pub fn append_cancellation_reason(terms: Option<&str>, reason: &str) -> String {
    match terms.map(str::trim_end).filter(|t| !t.is_empty()) {
        Some(existing) => format!("{existing}\n\nCancellation reason: {reason}"),
        None => format!("Cancellation reason: {reason}"),
    }
}
