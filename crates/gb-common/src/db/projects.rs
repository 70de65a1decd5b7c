use deadpool_postgres::GenericClient;
use tokio_postgres::types::{Json, ToSql};
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::parse_column;
use crate::db::util::{contains_pattern, TimedClientExt};
use crate::model::{
    Deliverable, NewProject, Page, Pagination, Project, ProjectFilter, ProjectId, ProjectSort,
};
use crate::store::StoreError;

const PROJECT_COLUMNS: &str = "id, owner_id, freelancer_id, title, short_description, description, category, skills, budget_min, budget_max, currency, deadline, location, attachments, objectives, technical_requirements, deliverables, tier, status, created_at, updated_at";

pub(crate) fn row_to_project(row: &Row) -> Result<Project, StoreError> {
    let Json(deliverables): Json<Vec<Deliverable>> = row.try_get("deliverables")?;

    Ok(Project {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        freelancer_id: row.try_get("freelancer_id")?,
        title: row.try_get("title")?,
        short_description: row.try_get("short_description")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        skills: row.try_get("skills")?,
        budget_min: row.try_get("budget_min")?,
        budget_max: row.try_get("budget_max")?,
        currency: row.try_get("currency")?,
        deadline: row.try_get("deadline")?,
        location: row.try_get("location")?,
        attachments: row.try_get("attachments")?,
        objectives: row.try_get("objectives")?,
        technical_requirements: row.try_get("technical_requirements")?,
        deliverables,
        tier: parse_column("tier", row.try_get::<_, &str>("tier")?)?,
        status: parse_column("status", row.try_get::<_, &str>("status")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_clause(sort: ProjectSort) -> &'static str {
    match sort {
        ProjectSort::Newest => "created_at DESC, id DESC",
        ProjectSort::Oldest => "created_at ASC, id ASC",
        ProjectSort::BudgetHigh => "budget_max DESC NULLS LAST, id DESC",
        ProjectSort::BudgetLow => "budget_min ASC NULLS LAST, id ASC",
    }
}

#[instrument(skip(client, project), fields(owner_id = %project.owner_id))]
pub async fn insert_project(
    client: &impl GenericClient,
    project: &NewProject,
) -> Result<Project, StoreError> {
    let query = format!(
        "INSERT INTO market.projects (
            owner_id, title, short_description, description, category, skills,
            budget_min, budget_max, currency, deadline, location, attachments,
            objectives, technical_requirements, deliverables, tier
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING {PROJECT_COLUMNS}"
    );

    let row = client
        .timed_query_one(
            &query,
            &[
                &project.owner_id,
                &project.title,
                &project.short_description,
                &project.description,
                &project.category,
                &project.skills,
                &project.budget_min,
                &project.budget_max,
                &project.currency,
                &project.deadline,
                &project.location,
                &project.attachments,
                &project.objectives,
                &project.technical_requirements,
                &Json(&project.deliverables),
                &project.tier.as_ref(),
            ],
            "insert_project",
        )
        .await?;

    row_to_project(&row)
}

#[instrument(skip(client))]
pub async fn get_project(
    client: &impl GenericClient,
    id: ProjectId,
) -> Result<Option<Project>, StoreError> {
    let query = format!("SELECT {PROJECT_COLUMNS} FROM market.projects WHERE id = $1");
    let row = client.timed_query_opt(&query, &[&id], "get_project").await?;
    row.map(|r| row_to_project(&r)).transpose()
}

#[instrument(skip(client))]
pub async fn list_projects(
    client: &impl GenericClient,
    filter: &ProjectFilter,
    pagination: Pagination,
) -> Result<Page<Project>, StoreError> {
    let mut values: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
    let mut query = format!("SELECT {PROJECT_COLUMNS} FROM market.projects WHERE 1=1");

    if let Some(status) = filter.status {
        query.push_str(&format!(" AND status = ${}", values.len() + 1));
        values.push(Box::new(status.as_ref().to_string()));
    }

    if let Some(category) = &filter.category {
        query.push_str(&format!(" AND category = ${}", values.len() + 1));
        values.push(Box::new(category.clone()));
    }

    if let Some(tier) = filter.tier {
        query.push_str(&format!(" AND tier = ${}", values.len() + 1));
        values.push(Box::new(tier.as_ref().to_string()));
    }

    if let Some(owner_id) = filter.owner_id {
        query.push_str(&format!(" AND owner_id = ${}", values.len() + 1));
        values.push(Box::new(owner_id));
    }

    if let Some(search) = &filter.search {
        query.push_str(&format!(" AND title ILIKE ${}", values.len() + 1));
        values.push(Box::new(contains_pattern(search)));
    }

    query.push_str(&format!(
        " ORDER BY {} LIMIT ${} OFFSET ${}",
        order_clause(filter.sort),
        values.len() + 1,
        values.len() + 2
    ));
    values.push(Box::new(pagination.limit + 1));
    values.push(Box::new(pagination.offset));

    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect();
    let rows = client.timed_query(&query, &params, "list_projects").await?;

    let items = rows
        .iter()
        .map(row_to_project)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::from_overfetch(items, pagination))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_sorts_put_unpriced_projects_last() {
        assert!(order_clause(ProjectSort::BudgetHigh).contains("NULLS LAST"));
        assert!(order_clause(ProjectSort::BudgetLow).contains("NULLS LAST"));
    }

    #[test]
    fn column_list_matches_model_fields() {
        assert_eq!(PROJECT_COLUMNS.split(", ").count(), 21);
    }
}
