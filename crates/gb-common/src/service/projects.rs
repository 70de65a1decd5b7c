use tracing::{info, instrument};

use crate::api::project::{ListProjectsParams, PostProjectRequest};
use crate::error::MarketError;
use crate::model::{
    Deliverable, NewProject, Page, Pagination, Project, ProjectFilter, ProjectId, Requester,
    UserId,
};
use crate::normalize::{clean_optional, normalize_skills};

use super::lifecycle::validate_text;
use super::Gateway;

const MAX_TITLE_LEN: usize = 200;

#[derive(Clone)]
pub struct ProjectService {
    gateway: Gateway,
}

impl ProjectService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    #[instrument(skip(self, request))]
    pub async fn post_project(
        &self,
        requester: &Requester,
        request: PostProjectRequest,
    ) -> Result<Project, MarketError> {
        let owner_id = requester.require()?;
        let draft = new_project(owner_id, request)?;

        let project = self
            .gateway
            .call("insert_project", self.gateway.store().insert_project(draft))
            .await?;
        info!(project_id = project.id, "project_posted");
        Ok(project)
    }

    pub async fn get_project(&self, id: ProjectId) -> Result<Project, MarketError> {
        self.gateway
            .call("get_project", self.gateway.store().get_project(id))
            .await?
            .ok_or_else(|| MarketError::not_found("project", id))
    }

    pub async fn list_projects(
        &self,
        filter: &ProjectFilter,
        pagination: Pagination,
    ) -> Result<Page<Project>, MarketError> {
        pagination.validate()?;
        self.gateway
            .call(
                "list_projects",
                self.gateway.store().list_projects(filter, pagination),
            )
            .await
    }
}

fn new_project(owner_id: UserId, request: PostProjectRequest) -> Result<NewProject, MarketError> {
    let title = validate_text("title", &request.title, MAX_TITLE_LEN)?;

    for (field, value) in [
        ("budget_min", request.budget_min),
        ("budget_max", request.budget_max),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(MarketError::validation(format!("{field} must not be negative")));
        }
    }
    if let (Some(min), Some(max)) = (request.budget_min, request.budget_max) {
        if min > max {
            return Err(MarketError::validation(
                "budget_min must not exceed budget_max",
            ));
        }
    }

    let currency = clean_optional(request.currency)
        .map(|c| c.to_uppercase())
        .ok_or_else(|| MarketError::validation("currency is required"))?;

    let deliverables = request
        .deliverables
        .into_iter()
        .map(|d| {
            let title = validate_text("deliverable title", &d.title, MAX_TITLE_LEN)?;
            Ok(Deliverable {
                title,
                description: clean_optional(d.description),
                deadline: d.deadline,
            })
        })
        .collect::<Result<Vec<_>, MarketError>>()?;

    Ok(NewProject {
        owner_id,
        title,
        short_description: clean_optional(request.short_description),
        description: clean_optional(request.description),
        category: clean_optional(request.category),
        skills: normalize_skills(&request.skills),
        budget_min: request.budget_min,
        budget_max: request.budget_max,
        currency: Some(currency),
        deadline: request.deadline,
        location: clean_optional(request.location),
        attachments: request
            .attachments
            .into_iter()
            .filter_map(|a| clean_optional(Some(a)))
            .collect(),
        objectives: clean_optional(request.objectives),
        technical_requirements: clean_optional(request.technical_requirements),
        deliverables,
        tier: request.tier,
    })
}

impl ListProjectsParams {
    /// Split query parameters into a store filter and a checked page window.
    pub fn into_query(self) -> Result<(ProjectFilter, Pagination), MarketError> {
        let pagination = Pagination::new(self.limit, self.offset)?;
        let filter = ProjectFilter {
            status: self.status,
            category: clean_optional(self.category),
            tier: self.tier,
            owner_id: self.owner_id,
            search: clean_optional(self.q),
            sort: self.sort,
        };
        Ok((filter, pagination))
    }
}
