use tracing::{debug, instrument};

use crate::error::MarketError;
use crate::model::{ProjectId, Requester, SavedJob};
use crate::store::constraints;

use super::Gateway;

/// Save/unsave toggle for projects a user wants to revisit.
#[derive(Clone)]
pub struct SavedJobService {
    gateway: Gateway,
}

impl SavedJobService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Anonymous requesters never have saved jobs.
    pub async fn is_saved(
        &self,
        requester: &Requester,
        project_id: ProjectId,
    ) -> Result<bool, MarketError> {
        let Some(user) = requester.user() else {
            return Ok(false);
        };
        self.gateway
            .call(
                "saved_job_exists",
                self.gateway.store().saved_job_exists(user, project_id),
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn save(
        &self,
        requester: &Requester,
        project_id: ProjectId,
    ) -> Result<SavedJob, MarketError> {
        let user = requester.require()?;

        let project = self
            .gateway
            .call("get_project", self.gateway.store().get_project(project_id))
            .await?;
        if project.is_none() {
            return Err(MarketError::not_found("project", project_id));
        }

        // Fast path only; the unique constraint below is what actually decides.
        if self.is_saved(requester, project_id).await? {
            return Err(already_saved(project_id));
        }

        let inserted = self
            .gateway
            .call_raw(
                "insert_saved_job",
                self.gateway.store().insert_saved_job(user, project_id),
            )
            .await?;
        match inserted {
            Ok(saved) => {
                debug!(project_id, "job_saved");
                Ok(saved)
            }
            Err(err) if err.violates(constraints::SAVED_JOB_PER_USER) => {
                Err(already_saved(project_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Removing a job that was never saved succeeds.
    #[instrument(skip(self))]
    pub async fn unsave(
        &self,
        requester: &Requester,
        project_id: ProjectId,
    ) -> Result<(), MarketError> {
        let user = requester.require()?;
        let removed = self
            .gateway
            .call(
                "delete_saved_job",
                self.gateway.store().delete_saved_job(user, project_id),
            )
            .await?;
        debug!(project_id, removed, "job_unsaved");
        Ok(())
    }

    pub async fn list_saved(&self, requester: &Requester) -> Result<Vec<SavedJob>, MarketError> {
        let user = requester.require()?;
        self.gateway
            .call("list_saved_jobs", self.gateway.store().list_saved_jobs(user))
            .await
    }
}

fn already_saved(project_id: ProjectId) -> MarketError {
    MarketError::Duplicate(format!("project {project_id} is already saved"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::model::NewProject;
    use crate::store::{MarketStore, MemoryStore};

    async fn setup() -> (Arc<MemoryStore>, SavedJobService, ProjectId) {
        let store = Arc::new(MemoryStore::new());
        let project = store
            .insert_project(NewProject {
                owner_id: Uuid::new_v4(),
                title: "Mobile app".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let service = SavedJobService::new(Gateway::with_default_deadline(store.clone()));
        (store, service, project.id)
    }

    #[tokio::test]
    async fn save_then_duplicate_then_unsave_twice() {
        let (_store, service, project_id) = setup().await;
        let requester = Requester::User(Uuid::new_v4());

        assert!(!service.is_saved(&requester, project_id).await.unwrap());
        service.save(&requester, project_id).await.unwrap();
        assert!(service.is_saved(&requester, project_id).await.unwrap());

        let err = service.save(&requester, project_id).await.unwrap_err();
        assert!(matches!(err, MarketError::Duplicate(_)));

        service.unsave(&requester, project_id).await.unwrap();
        service.unsave(&requester, project_id).await.unwrap();
        assert!(!service.is_saved(&requester, project_id).await.unwrap());
    }

    #[tokio::test]
    async fn anonymous_is_never_saved_and_cannot_save() {
        let (_store, service, project_id) = setup().await;

        assert!(!service
            .is_saved(&Requester::Anonymous, project_id)
            .await
            .unwrap());
        let err = service
            .save(&Requester::Anonymous, project_id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Authentication));
    }

    #[tokio::test]
    async fn saving_unknown_project_is_not_found() {
        let (_store, service, _) = setup().await;
        let err = service
            .save(&Requester::User(Uuid::new_v4()), 999)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }

    #[tokio::test]
    async fn concurrent_saves_yield_one_row() {
        let (_store, service, project_id) = setup().await;
        let requester = Requester::User(Uuid::new_v4());

        let (a, b) = tokio::join!(
            service.save(&requester, project_id),
            service.save(&requester, project_id)
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(service.list_saved(&requester).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unique_constraint_reports_duplicate_when_the_check_misses() {
        let (store, service, project_id) = setup().await;
        let requester = Requester::User(Uuid::new_v4());
        store.set_stale_saved_job_reads(true);

        service.save(&requester, project_id).await.unwrap();
        let err = service.save(&requester, project_id).await.unwrap_err();
        assert!(matches!(err, MarketError::Duplicate(msg) if msg.contains("already saved")));

        store.set_stale_saved_job_reads(false);
        assert_eq!(service.list_saved(&requester).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_outage_is_a_dependency_error() {
        let (store, service, project_id) = setup().await;
        store.set_offline(true);

        let err = service
            .is_saved(&Requester::User(Uuid::new_v4()), project_id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Dependency(_)));
    }
}
