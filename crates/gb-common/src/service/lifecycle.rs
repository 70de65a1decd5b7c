use metrics::counter;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::api::proposal::SubmitProposalRequest;
use crate::error::MarketError;
use crate::model::{
    Contract, NewProposal, Project, ProjectId, ProjectStatus, Proposal, ProposalFilter,
    ProposalId, ProposalStatus, Requester,
};
use crate::store::{constraints, AcceptanceCommit, DeleteOutcome, ReconcileOutcome, StoreError};

use super::{ContractMaterializer, Gateway};

const MAX_TIMELINE_LEN: usize = 500;
const MAX_COVER_LETTER_LEN: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptanceResult {
    pub contract: Contract,
    pub confirmed: bool,
    /// The proposal was already accepted; nothing new was written.
    pub replayed: bool,
    pub rejected_proposals: u64,
}

impl AcceptanceResult {
    fn committed(contract: Contract, rejected_proposals: u64) -> Self {
        Self {
            contract,
            confirmed: true,
            replayed: false,
            rejected_proposals,
        }
    }

    fn replayed(contract: Contract, rejected_proposals: u64) -> Self {
        Self {
            contract,
            confirmed: true,
            replayed: true,
            rejected_proposals,
        }
    }
}

/// Proposal submission, deletion, and the accept cascade.
///
/// Acceptance runs as a single store transaction (`commit_acceptance`):
/// conditional `submitted → accepted`, contract insert, sibling rejection and
/// project promotion either all commit or none do. The conditional write is
/// the race gate; the earlier reads only produce precise errors.
#[derive(Clone)]
pub struct ProposalLifecycle {
    gateway: Gateway,
}

impl ProposalLifecycle {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, MarketError> {
        self.gateway
            .call("get_project", self.gateway.store().get_project(id))
            .await?
            .ok_or_else(|| MarketError::not_found("project", id))
    }

    async fn load_proposal(&self, id: ProposalId) -> Result<Proposal, MarketError> {
        self.gateway
            .call("get_proposal", self.gateway.store().get_proposal(id))
            .await?
            .ok_or_else(|| MarketError::not_found("proposal", id))
    }

    #[instrument(skip(self, request), fields(bid_amount = request.bid_amount))]
    pub async fn submit_proposal(
        &self,
        requester: &Requester,
        project_id: ProjectId,
        request: SubmitProposalRequest,
    ) -> Result<Proposal, MarketError> {
        let freelancer_id = requester.require()?;
        let request = request.validated()?;

        let project = self.load_project(project_id).await?;
        if !project.status.is_open() {
            return Err(MarketError::validation(format!(
                "project {project_id} is not open for proposals"
            )));
        }
        if project.is_owned_by(freelancer_id) {
            return Err(MarketError::validation(
                "project owners cannot bid on their own project",
            ));
        }

        let draft = NewProposal {
            project_id,
            freelancer_id,
            bid_amount: request.bid_amount,
            timeline: request.timeline,
            cover_letter: request.cover_letter,
        };

        let inserted = self
            .gateway
            .call_raw("insert_proposal", self.gateway.store().insert_proposal(draft))
            .await?;
        let proposal = match inserted {
            Ok(proposal) => proposal,
            Err(err) if err.violates(constraints::PROPOSAL_PER_FREELANCER) => {
                return Err(MarketError::Duplicate(format!(
                    "a proposal for project {project_id} was already submitted"
                )));
            }
            Err(err) => return Err(err.into()),
        };

        info!(proposal_id = %proposal.id, project_id, "proposal_submitted");
        Ok(proposal)
    }

    #[instrument(skip(self))]
    pub async fn delete_proposal(
        &self,
        requester: &Requester,
        proposal_id: ProposalId,
    ) -> Result<(), MarketError> {
        let user = requester.require()?;
        let proposal = self.load_proposal(proposal_id).await?;

        if proposal.freelancer_id != user {
            return Err(MarketError::forbidden(
                "only the submitting freelancer may delete a proposal",
            ));
        }
        if proposal.is_accepted() {
            return Err(MarketError::conflict(format!(
                "proposal {proposal_id} is accepted and cannot be deleted"
            )));
        }

        let outcome = self
            .gateway
            .call(
                "delete_proposal",
                self.gateway.store().delete_proposal(proposal_id, user),
            )
            .await?;

        match outcome {
            DeleteOutcome::Deleted => {
                info!(%proposal_id, "proposal_deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(MarketError::not_found("proposal", proposal_id)),
            // Ownership was checked above, so only a concurrent acceptance lands here.
            DeleteOutcome::ConditionFailed => Err(MarketError::conflict(format!(
                "proposal {proposal_id} was accepted while being deleted"
            ))),
        }
    }

    #[instrument(skip(self))]
    pub async fn accept_proposal(
        &self,
        requester: &Requester,
        proposal_id: ProposalId,
    ) -> Result<AcceptanceResult, MarketError> {
        let user = requester.require()?;
        let proposal = self.load_proposal(proposal_id).await?;
        let project = self.load_project(proposal.project_id).await?;

        if !project.is_owned_by(user) {
            return Err(MarketError::forbidden(
                "only the project owner may accept proposals",
            ));
        }

        match proposal.status {
            ProposalStatus::Accepted => return self.replay_acceptance(&proposal).await,
            ProposalStatus::Rejected => {
                return Err(MarketError::conflict(format!(
                    "proposal {proposal_id} was rejected"
                )));
            }
            ProposalStatus::Submitted => {}
        }

        let already_accepted = self
            .gateway
            .call(
                "count_proposals",
                self.gateway
                    .store()
                    .count_proposals(project.id, ProposalStatus::Accepted),
            )
            .await?;
        if already_accepted > 0 || !project.status.is_open() {
            counter!("gb_acceptance_total", "outcome" => "conflict").increment(1);
            return Err(MarketError::conflict(format!(
                "project {} already has an accepted proposal",
                project.id
            )));
        }

        let write = ContractMaterializer::acceptance_write(&project, &proposal)?;
        let commit = self
            .gateway
            .call_raw(
                "commit_acceptance",
                self.gateway.store().commit_acceptance(&write),
            )
            .await?;

        match commit {
            Ok(AcceptanceCommit::Committed { contract, rejected }) => {
                counter!("gb_acceptance_total", "outcome" => "committed").increment(1);
                info!(
                    project_id = project.id,
                    %proposal_id,
                    contract_id = %contract.id,
                    rejected,
                    "proposal_accepted"
                );
                Ok(AcceptanceResult::committed(contract, rejected))
            }
            Ok(AcceptanceCommit::ProposalNotSubmitted) | Ok(AcceptanceCommit::ProjectNotActive) => {
                self.resolve_lost_race(proposal_id).await
            }
            Err(err) if is_acceptance_race(&err) => self.resolve_lost_race(proposal_id).await,
            Err(err) => Err(err.into()),
        }
    }

    /// Another writer moved first. If that writer accepted this very proposal
    /// the call becomes an idempotent replay, otherwise it lost.
    async fn resolve_lost_race(
        &self,
        proposal_id: ProposalId,
    ) -> Result<AcceptanceResult, MarketError> {
        let current = self.load_proposal(proposal_id).await?;
        if current.is_accepted() {
            return self.replay_acceptance(&current).await;
        }

        counter!("gb_acceptance_total", "outcome" => "conflict").increment(1);
        warn!(%proposal_id, project_id = current.project_id, "acceptance_lost_race");
        Err(MarketError::conflict(format!(
            "project {} already has an accepted proposal",
            current.project_id
        )))
    }

    async fn replay_acceptance(
        &self,
        proposal: &Proposal,
    ) -> Result<AcceptanceResult, MarketError> {
        let existing = self
            .gateway
            .call(
                "get_contract_by_proposal",
                self.gateway.store().get_contract_by_proposal(proposal.id),
            )
            .await?;

        if let Some(contract) = existing {
            counter!("gb_acceptance_total", "outcome" => "replayed").increment(1);
            return Ok(AcceptanceResult::replayed(contract, 0));
        }

        let outcome = self.reconcile_acceptance(proposal.id).await?;
        Ok(AcceptanceResult::replayed(outcome.contract, outcome.rejected))
    }

    /// Complete the cascade for an accepted proposal: create the contract if
    /// it is missing, reject leftover submitted siblings, promote the project.
    /// Safe to run any number of times.
    #[instrument(skip(self))]
    pub async fn reconcile_acceptance(
        &self,
        proposal_id: ProposalId,
    ) -> Result<ReconcileOutcome, MarketError> {
        let proposal = self.load_proposal(proposal_id).await?;
        if !proposal.is_accepted() {
            return Err(MarketError::conflict(format!(
                "proposal {proposal_id} is not accepted"
            )));
        }
        let project = self.load_project(proposal.project_id).await?;

        if matches!(
            project.status,
            ProjectStatus::Completed | ProjectStatus::Cancelled
        ) {
            let contract = self
                .gateway
                .call(
                    "get_contract_by_proposal",
                    self.gateway.store().get_contract_by_proposal(proposal_id),
                )
                .await?
                .ok_or_else(|| {
                    MarketError::conflict(format!(
                        "project {} is {} but proposal {proposal_id} has no contract",
                        project.id,
                        project.status.as_ref()
                    ))
                })?;
            return Ok(ReconcileOutcome {
                contract,
                contract_created: false,
                rejected: 0,
                project_promoted: false,
            });
        }

        let write = ContractMaterializer::acceptance_write(&project, &proposal)?;
        let outcome = self
            .gateway
            .call(
                "reconcile_acceptance",
                self.gateway.store().reconcile_acceptance(&write),
            )
            .await?
            .ok_or_else(|| {
                MarketError::conflict(format!("proposal {proposal_id} changed during repair"))
            })?;

        if outcome.contract_created || outcome.rejected > 0 || outcome.project_promoted {
            counter!("gb_acceptance_repairs_total").increment(1);
            info!(
                %proposal_id,
                project_id = project.id,
                contract_id = %outcome.contract.id,
                contract_created = outcome.contract_created,
                rejected = outcome.rejected,
                project_promoted = outcome.project_promoted,
                "acceptance_reconciled"
            );
        }

        Ok(outcome)
    }

    /// Accepted proposals still waiting for their contract.
    pub async fn pending_repairs(&self, limit: i64) -> Result<Vec<Proposal>, MarketError> {
        self.gateway
            .call(
                "list_accepted_without_contract",
                self.gateway.store().list_accepted_without_contract(limit),
            )
            .await
    }

    pub async fn list_project_proposals(
        &self,
        requester: &Requester,
        project_id: ProjectId,
    ) -> Result<Vec<Proposal>, MarketError> {
        let user = requester.require()?;
        let project = self.load_project(project_id).await?;
        if !project.is_owned_by(user) {
            return Err(MarketError::forbidden(
                "only the project owner may list its proposals",
            ));
        }

        self.gateway
            .call(
                "list_proposals",
                self.gateway
                    .store()
                    .list_proposals(&ProposalFilter::for_project(project_id)),
            )
            .await
    }

    pub async fn list_my_proposals(
        &self,
        requester: &Requester,
    ) -> Result<Vec<Proposal>, MarketError> {
        let user = requester.require()?;
        self.gateway
            .call(
                "list_proposals",
                self.gateway
                    .store()
                    .list_proposals(&ProposalFilter::for_freelancer(user)),
            )
            .await
    }
}

fn is_acceptance_race(err: &StoreError) -> bool {
    err.violates(constraints::ONE_ACCEPTED_PER_PROJECT)
        || err.violates(constraints::CONTRACT_PER_PROPOSAL)
}

pub(crate) fn validate_text(
    field: &str,
    value: &str,
    max_len: usize,
) -> Result<String, MarketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MarketError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(MarketError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

impl SubmitProposalRequest {
    /// Trimmed copy of the request, or the first validation failure.
    pub fn validated(self) -> Result<Self, MarketError> {
        if self.bid_amount <= 0 {
            return Err(MarketError::validation("bid_amount must be greater than zero"));
        }

        Ok(Self {
            bid_amount: self.bid_amount,
            timeline: validate_text("timeline", &self.timeline, MAX_TIMELINE_LEN)?,
            cover_letter: validate_text("cover_letter", &self.cover_letter, MAX_COVER_LETTER_LEN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::model::{ContractStatus, Deliverable, NewProject, UserId};
    use crate::store::{MarketStore, MemoryStore};

    struct Board {
        store: Arc<MemoryStore>,
        lifecycle: ProposalLifecycle,
        owner: UserId,
        project_id: ProjectId,
    }

    impl Board {
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let lifecycle = ProposalLifecycle::new(Gateway::with_default_deadline(store.clone()));
            let owner = Uuid::new_v4();
            let project = store
                .insert_project(NewProject {
                    owner_id: owner,
                    title: "Marketplace redesign".into(),
                    currency: Some("VND".into()),
                    deliverables: ["A", "B"]
                        .into_iter()
                        .map(|title| Deliverable {
                            title: title.into(),
                            description: None,
                            deadline: None,
                        })
                        .collect(),
                    ..Default::default()
                })
                .await
                .unwrap();

            Self {
                store,
                lifecycle,
                owner,
                project_id: project.id,
            }
        }

        fn owner(&self) -> Requester {
            Requester::User(self.owner)
        }

        async fn bid(&self, amount: i64) -> Proposal {
            self.lifecycle
                .submit_proposal(
                    &Requester::User(Uuid::new_v4()),
                    self.project_id,
                    request(amount),
                )
                .await
                .unwrap()
        }

        async fn proposal(&self, id: ProposalId) -> Proposal {
            self.store.get_proposal(id).await.unwrap().unwrap()
        }

        async fn project(&self) -> Project {
            self.store.get_project(self.project_id).await.unwrap().unwrap()
        }
    }

    fn request(bid_amount: i64) -> SubmitProposalRequest {
        SubmitProposalRequest {
            bid_amount,
            timeline: "3 weeks".into(),
            cover_letter: "Portfolio attached".into(),
        }
    }

    #[tokio::test]
    async fn accepting_middle_proposal_rejects_the_others() {
        let board = Board::new().await;
        let first = board.bid(1_000_000).await;
        let second = board.bid(1_500_000).await;
        let third = board.bid(2_000_000).await;

        let result = board
            .lifecycle
            .accept_proposal(&board.owner(), second.id)
            .await
            .unwrap();

        assert!(result.confirmed);
        assert!(!result.replayed);
        assert_eq!(result.rejected_proposals, 2);
        assert_eq!(result.contract.budget_amount, 1_500_000);
        assert_eq!(result.contract.milestones.len(), 2);
        assert_eq!(result.contract.status, ContractStatus::Active);

        assert_eq!(board.proposal(first.id).await.status, ProposalStatus::Rejected);
        assert_eq!(board.proposal(second.id).await.status, ProposalStatus::Accepted);
        assert_eq!(board.proposal(third.id).await.status, ProposalStatus::Rejected);

        let project = board.project().await;
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.freelancer_id, Some(second.freelancer_id));
    }

    #[tokio::test]
    async fn accepting_again_returns_the_existing_contract() {
        let board = Board::new().await;
        let proposal = board.bid(500).await;

        let first = board
            .lifecycle
            .accept_proposal(&board.owner(), proposal.id)
            .await
            .unwrap();
        let second = board
            .lifecycle
            .accept_proposal(&board.owner(), proposal.id)
            .await
            .unwrap();

        assert!(second.replayed);
        assert_eq!(second.contract.id, first.contract.id);
        let contracts = board
            .store
            .list_contracts_for_user(board.owner)
            .await
            .unwrap();
        assert_eq!(contracts.len(), 1);
    }

    #[tokio::test]
    async fn negative_bid_is_rejected_without_persisting() {
        let board = Board::new().await;
        let err = board
            .lifecycle
            .submit_proposal(
                &Requester::User(Uuid::new_v4()),
                board.project_id,
                request(-100),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MarketError::Validation(_)));
        let rows = board
            .lifecycle
            .list_project_proposals(&board.owner(), board.project_id)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn submission_guards() {
        let board = Board::new().await;
        let freelancer = Requester::User(Uuid::new_v4());

        let err = board
            .lifecycle
            .submit_proposal(&Requester::Anonymous, board.project_id, request(10))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Authentication));

        let err = board
            .lifecycle
            .submit_proposal(&freelancer, 404, request(10))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));

        let err = board
            .lifecycle
            .submit_proposal(&board.owner(), board.project_id, request(10))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        let mut blank = request(10);
        blank.cover_letter = "   ".into();
        let err = board
            .lifecycle
            .submit_proposal(&freelancer, board.project_id, blank)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        board
            .lifecycle
            .submit_proposal(&freelancer, board.project_id, request(10))
            .await
            .unwrap();
        let err = board
            .lifecycle
            .submit_proposal(&freelancer, board.project_id, request(20))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Duplicate(_)));

        let mine = board.lifecycle.list_my_proposals(&freelancer).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].bid_amount, 10);
    }

    #[tokio::test]
    async fn closed_project_takes_no_proposals() {
        let board = Board::new().await;
        let winner = board.bid(10).await;
        board
            .lifecycle
            .accept_proposal(&board.owner(), winner.id)
            .await
            .unwrap();

        let err = board
            .lifecycle
            .submit_proposal(
                &Requester::User(Uuid::new_v4()),
                board.project_id,
                request(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_freelancer_may_delete_and_never_once_accepted() {
        let board = Board::new().await;
        let proposal = board.bid(10).await;

        let err = board
            .lifecycle
            .delete_proposal(&Requester::User(Uuid::new_v4()), proposal.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Authorization(_)));
        assert_eq!(board.proposal(proposal.id).await, proposal);

        board
            .lifecycle
            .accept_proposal(&board.owner(), proposal.id)
            .await
            .unwrap();
        let err = board
            .lifecycle
            .delete_proposal(&Requester::User(proposal.freelancer_id), proposal.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
    }

    #[tokio::test]
    async fn freelancer_deletes_submitted_proposal() {
        let board = Board::new().await;
        let proposal = board.bid(10).await;
        let freelancer = Requester::User(proposal.freelancer_id);

        board
            .lifecycle
            .delete_proposal(&freelancer, proposal.id)
            .await
            .unwrap();
        let err = board
            .lifecycle
            .delete_proposal(&freelancer, proposal.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }

    #[tokio::test]
    async fn store_outage_during_delete_is_not_reported_as_missing() {
        let board = Board::new().await;
        let proposal = board.bid(10).await;
        board.store.set_offline(true);

        let err = board
            .lifecycle
            .delete_proposal(&Requester::User(proposal.freelancer_id), proposal.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Dependency(_)));
    }

    #[tokio::test]
    async fn acceptance_requires_owner_and_a_live_proposal() {
        let board = Board::new().await;
        let loser = board.bid(10).await;
        let winner = board.bid(20).await;

        let err = board
            .lifecycle
            .accept_proposal(&Requester::User(winner.freelancer_id), winner.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Authorization(_)));

        board
            .lifecycle
            .accept_proposal(&board.owner(), winner.id)
            .await
            .unwrap();
        let err = board
            .lifecycle
            .accept_proposal(&board.owner(), loser.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_accepts_on_one_project_have_one_winner() {
        for _ in 0..20 {
            let board = Board::new().await;
            let a = board.bid(100).await;
            let b = board.bid(200).await;

            let left = {
                let lifecycle = board.lifecycle.clone();
                let owner = board.owner();
                tokio::spawn(async move { lifecycle.accept_proposal(&owner, a.id).await })
            };
            let right = {
                let lifecycle = board.lifecycle.clone();
                let owner = board.owner();
                tokio::spawn(async move { lifecycle.accept_proposal(&owner, b.id).await })
            };
            let outcomes = [left.await.unwrap(), right.await.unwrap()];

            assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(outcomes
                .iter()
                .all(|r| matches!(r, Ok(_) | Err(MarketError::Conflict(_)))));

            let accepted = board
                .store
                .count_proposals(board.project_id, ProposalStatus::Accepted)
                .await
                .unwrap();
            assert_eq!(accepted, 1);
            let contracts = board
                .store
                .list_contracts_for_user(board.owner)
                .await
                .unwrap();
            assert_eq!(contracts.len(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_accepts_of_one_proposal_commit_once() {
        for _ in 0..20 {
            let board = Board::new().await;
            let proposal_id = board.bid(100).await.id;

            let calls: Vec<_> = (0..2)
                .map(|_| {
                    let lifecycle = board.lifecycle.clone();
                    let owner = board.owner();
                    tokio::spawn(async move { lifecycle.accept_proposal(&owner, proposal_id).await })
                })
                .collect();

            let mut results = Vec::new();
            for call in calls {
                results.push(call.await.unwrap().unwrap());
            }

            assert_eq!(results.iter().filter(|r| !r.replayed).count(), 1);
            assert_eq!(results[0].contract.id, results[1].contract.id);
        }
    }

    #[tokio::test]
    async fn partial_acceptance_is_repaired_on_replay() {
        let board = Board::new().await;
        let sibling = board.bid(10).await;
        let winner = board.bid(20).await;
        assert!(board
            .store
            .force_proposal_status(winner.id, ProposalStatus::Accepted));

        let pending = board.lifecycle.pending_repairs(10).await.unwrap();
        assert_eq!(pending.iter().map(|p| p.id).collect::<Vec<_>>(), vec![winner.id]);

        let result = board
            .lifecycle
            .accept_proposal(&board.owner(), winner.id)
            .await
            .unwrap();
        assert!(result.replayed);
        assert_eq!(result.rejected_proposals, 1);
        assert_eq!(result.contract.freelancer_id, winner.freelancer_id);

        assert_eq!(board.proposal(sibling.id).await.status, ProposalStatus::Rejected);
        assert_eq!(board.project().await.status, ProjectStatus::InProgress);
        assert!(board.lifecycle.pending_repairs(10).await.unwrap().is_empty());

        let again = board.lifecycle.reconcile_acceptance(winner.id).await.unwrap();
        assert!(!again.contract_created);
        assert!(!again.project_promoted);
        assert_eq!(again.contract.id, result.contract.id);
    }

    #[tokio::test]
    async fn reconcile_refuses_unaccepted_proposals() {
        let board = Board::new().await;
        let proposal = board.bid(10).await;
        let err = board
            .lifecycle
            .reconcile_acceptance(proposal.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
    }

    #[tokio::test]
    async fn project_owner_alone_lists_its_proposals() {
        let board = Board::new().await;
        board.bid(10).await;
        board.bid(20).await;

        let all = board
            .lifecycle
            .list_project_proposals(&board.owner(), board.project_id)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let err = board
            .lifecycle
            .list_project_proposals(&Requester::User(Uuid::new_v4()), board.project_id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Authorization(_)));
    }
}
