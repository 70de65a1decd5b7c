use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use crate::error::MarketError;
use crate::model::{
    Contract, ContractStatus, Milestone, NewContract, Project, ProjectStatus, Proposal,
};
use crate::store::{constraints, AcceptanceWrite};

use super::Gateway;

/// Derives contracts from a winning proposal and its project.
#[derive(Clone)]
pub struct ContractMaterializer {
    gateway: Gateway,
}

impl ContractMaterializer {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Derive the contract row for `proposal` on `project`, started today.
    pub fn derive(project: &Project, proposal: &Proposal) -> Result<NewContract, MarketError> {
        Self::derive_on(project, proposal, Utc::now().date_naive())
    }

    pub fn derive_on(
        project: &Project,
        proposal: &Proposal,
        start_date: NaiveDate,
    ) -> Result<NewContract, MarketError> {
        if proposal.project_id != project.id {
            return Err(MarketError::validation(format!(
                "proposal {} does not belong to project {}",
                proposal.id, project.id
            )));
        }

        // The repair path runs after the project was promoted for this winner.
        let awarded_to_winner = project.status == ProjectStatus::InProgress
            && project.freelancer_id == Some(proposal.freelancer_id);
        if project.status != ProjectStatus::Active && !awarded_to_winner {
            return Err(MarketError::validation(format!(
                "project {} is {} and cannot be contracted",
                project.id,
                project.status.as_ref()
            )));
        }

        if proposal.bid_amount <= 0 {
            return Err(MarketError::validation("contract budget must be positive"));
        }

        let currency = project
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                MarketError::validation(format!("project {} has no currency", project.id))
            })?;

        let milestones = project
            .deliverables
            .iter()
            .map(|deliverable| Milestone::pending(deliverable.title.clone()))
            .collect();

        Ok(NewContract {
            project_id: project.id,
            proposal_id: proposal.id,
            client_id: project.owner_id,
            freelancer_id: proposal.freelancer_id,
            budget_amount: proposal.bid_amount,
            currency: currency.to_string(),
            status: ContractStatus::Active,
            progress: 0,
            start_date,
            deadline: project.deadline,
            milestones,
            terms: None,
        })
    }

    /// Everything the acceptance transaction writes for this winner.
    pub fn acceptance_write(
        project: &Project,
        proposal: &Proposal,
    ) -> Result<AcceptanceWrite, MarketError> {
        Ok(AcceptanceWrite {
            project_id: project.id,
            proposal_id: proposal.id,
            freelancer_id: proposal.freelancer_id,
            contract: Self::derive(project, proposal)?,
        })
    }

    /// Derive and persist a contract. A contract that already exists for the
    /// proposal is a `Conflict`.
    #[instrument(skip(self, project, proposal), fields(project_id = project.id, proposal_id = %proposal.id))]
    pub async fn create_contract(
        &self,
        project: &Project,
        proposal: &Proposal,
    ) -> Result<Contract, MarketError> {
        let draft = Self::derive(project, proposal)?;
        let inserted = self
            .gateway
            .call_raw("insert_contract", self.gateway.store().insert_contract(draft))
            .await?;

        match inserted {
            Ok(contract) => {
                info!(contract_id = %contract.id, "contract_created");
                Ok(contract)
            }
            Err(err) if err.violates(constraints::CONTRACT_PER_PROPOSAL) => Err(
                MarketError::conflict(format!("a contract already exists for proposal {}", proposal.id)),
            ),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::model::{Deliverable, ProjectTier, ProposalStatus};
    use crate::store::MemoryStore;

    fn project(deliverables: &[&str]) -> Project {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        Project {
            id: 7,
            owner_id: Uuid::new_v4(),
            freelancer_id: None,
            title: "Shop redesign".into(),
            short_description: None,
            description: None,
            category: Some("design".into()),
            skills: vec!["figma".into()],
            budget_min: Some(1_000_000),
            budget_max: Some(2_000_000),
            currency: Some("VND".into()),
            deadline: NaiveDate::from_ymd_opt(2024, 7, 1),
            location: None,
            attachments: vec![],
            objectives: None,
            technical_requirements: None,
            deliverables: deliverables
                .iter()
                .map(|title| Deliverable {
                    title: title.to_string(),
                    description: Some(format!("{title} details")),
                    deadline: NaiveDate::from_ymd_opt(2024, 6, 1),
                })
                .collect(),
            tier: ProjectTier::Standard,
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn proposal(project: &Project, bid: i64) -> Proposal {
        let now = Utc::now();
        Proposal {
            id: Uuid::new_v4(),
            project_id: project.id,
            freelancer_id: Uuid::new_v4(),
            bid_amount: bid,
            timeline: "4 weeks".into(),
            cover_letter: "I can do this".into(),
            status: ProposalStatus::Accepted,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn derives_budget_and_milestones_from_winner() {
        let project = project(&["A", "B"]);
        let proposal = proposal(&project, 1_500_000);
        let start = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let contract = ContractMaterializer::derive_on(&project, &proposal, start).unwrap();

        assert_eq!(contract.budget_amount, 1_500_000);
        assert_eq!(contract.currency, "VND");
        assert_eq!(contract.deadline, project.deadline);
        assert_eq!(contract.progress, 0);
        assert_eq!(contract.status, ContractStatus::Active);
        assert_eq!(contract.start_date, start);
        assert_eq!(contract.client_id, project.owner_id);
        assert_eq!(contract.freelancer_id, proposal.freelancer_id);
        assert_eq!(
            contract.milestones,
            vec![Milestone::pending("A"), Milestone::pending("B")]
        );
        assert_eq!(
            serde_json::to_value(&contract.milestones).unwrap(),
            serde_json::json!([
                {"name": "A", "completed": false, "due_date": null},
                {"name": "B", "completed": false, "due_date": null}
            ])
        );
    }

    #[test]
    fn project_without_deliverables_has_no_milestones() {
        let project = project(&[]);
        let proposal = proposal(&project, 10);
        let contract = ContractMaterializer::derive(&project, &proposal).unwrap();
        assert!(contract.milestones.is_empty());
    }

    #[test]
    fn missing_currency_is_a_validation_error() {
        let mut project = project(&["A"]);
        project.currency = Some("  ".into());
        let proposal = proposal(&project, 10);

        let err = ContractMaterializer::derive(&project, &proposal).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[test]
    fn closed_project_cannot_be_contracted() {
        let mut project = project(&[]);
        project.status = ProjectStatus::Completed;
        let proposal = proposal(&project, 10);

        let err = ContractMaterializer::derive(&project, &proposal).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[test]
    fn project_awarded_to_the_same_winner_can_be_repaired() {
        let mut project = project(&[]);
        let proposal = proposal(&project, 10);
        project.status = ProjectStatus::InProgress;
        project.freelancer_id = Some(proposal.freelancer_id);

        assert!(ContractMaterializer::derive(&project, &proposal).is_ok());

        project.freelancer_id = Some(Uuid::new_v4());
        assert!(ContractMaterializer::derive(&project, &proposal).is_err());
    }

    #[test]
    fn proposal_for_another_project_is_rejected() {
        let project = project(&[]);
        let mut proposal = proposal(&project, 10);
        proposal.project_id = 99;

        let err = ContractMaterializer::derive(&project, &proposal).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn second_contract_for_same_proposal_conflicts() {
        let store = Arc::new(MemoryStore::new());
        let materializer = ContractMaterializer::new(Gateway::with_default_deadline(store));
        let project = project(&["A"]);
        let proposal = proposal(&project, 500);

        let first = materializer.create_contract(&project, &proposal).await.unwrap();
        assert_eq!(first.proposal_id, proposal.id);

        let err = materializer
            .create_contract(&project, &proposal)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
    }
}
