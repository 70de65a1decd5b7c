use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "marketplace tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS market.categories (
    id BIGSERIAL PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS market.projects (
    id BIGSERIAL PRIMARY KEY,
    owner_id UUID NOT NULL,
    freelancer_id UUID,
    title TEXT NOT NULL,
    short_description TEXT,
    description TEXT,
    category TEXT,
    skills TEXT[] NOT NULL DEFAULT '{}',
    budget_min BIGINT,
    budget_max BIGINT,
    currency TEXT,
    deadline DATE,
    location TEXT,
    attachments TEXT[] NOT NULL DEFAULT '{}',
    objectives TEXT,
    technical_requirements TEXT,
    deliverables JSONB NOT NULL DEFAULT '[]',
    tier TEXT NOT NULL DEFAULT 'standard',
    status TEXT NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT projects_status_check
        CHECK (status IN ('active', 'in_progress', 'completed', 'cancelled')),
    CONSTRAINT projects_tier_check CHECK (tier IN ('standard', 'vip')),
    CONSTRAINT projects_budget_check
        CHECK (budget_min IS NULL OR budget_max IS NULL OR budget_min <= budget_max)
);

CREATE INDEX IF NOT EXISTS idx_projects_status_created
    ON market.projects(status, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_projects_owner ON market.projects(owner_id);

CREATE TABLE IF NOT EXISTS market.proposals (
    id UUID PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES market.projects(id) ON DELETE CASCADE,
    freelancer_id UUID NOT NULL,
    bid_amount BIGINT NOT NULL,
    timeline TEXT NOT NULL,
    cover_letter TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'submitted',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT proposals_project_freelancer_key UNIQUE (project_id, freelancer_id),
    CONSTRAINT proposals_bid_amount_check CHECK (bid_amount > 0),
    CONSTRAINT proposals_status_check CHECK (status IN ('submitted', 'accepted', 'rejected'))
);

CREATE UNIQUE INDEX IF NOT EXISTS proposals_one_accepted_per_project
    ON market.proposals(project_id)
    WHERE status = 'accepted';
CREATE INDEX IF NOT EXISTS idx_proposals_freelancer
    ON market.proposals(freelancer_id, created_at DESC);

CREATE TABLE IF NOT EXISTS market.contracts (
    id UUID PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES market.projects(id),
    proposal_id UUID NOT NULL REFERENCES market.proposals(id),
    client_id UUID NOT NULL,
    freelancer_id UUID NOT NULL,
    budget_amount BIGINT NOT NULL,
    currency TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    progress INTEGER NOT NULL DEFAULT 0,
    start_date DATE NOT NULL,
    deadline DATE,
    milestones JSONB NOT NULL DEFAULT '[]',
    terms TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT contracts_proposal_id_key UNIQUE (proposal_id),
    CONSTRAINT contracts_budget_check CHECK (budget_amount > 0),
    CONSTRAINT contracts_progress_check CHECK (progress >= 0 AND progress <= 100),
    CONSTRAINT contracts_status_check CHECK (status IN ('active', 'completed', 'cancelled'))
);

CREATE INDEX IF NOT EXISTS idx_contracts_client ON market.contracts(client_id);
CREATE INDEX IF NOT EXISTS idx_contracts_freelancer ON market.contracts(freelancer_id);

CREATE TABLE IF NOT EXISTS market.saved_jobs (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    project_id BIGINT NOT NULL REFERENCES market.projects(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT saved_jobs_user_project_key UNIQUE (user_id, project_id)
);
"#,
    },
    Migration {
        id: 2,
        description: "recruitment board",
        sql: r#"
CREATE TABLE IF NOT EXISTS market.recruitment_jobs (
    id BIGSERIAL PRIMARY KEY,
    employer_id UUID NOT NULL,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    description TEXT,
    location TEXT,
    employment_type TEXT NOT NULL,
    salary_min BIGINT,
    salary_max BIGINT,
    currency TEXT,
    status TEXT NOT NULL DEFAULT 'open',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT recruitment_jobs_status_check CHECK (status IN ('open', 'closed')),
    CONSTRAINT recruitment_jobs_type_check
        CHECK (employment_type IN ('full_time', 'part_time', 'contract', 'internship'))
);

CREATE INDEX IF NOT EXISTS idx_recruitment_jobs_status_created
    ON market.recruitment_jobs(status, created_at DESC, id DESC);

CREATE TABLE IF NOT EXISTS market.job_applications (
    id UUID PRIMARY KEY,
    job_id BIGINT NOT NULL REFERENCES market.recruitment_jobs(id) ON DELETE CASCADE,
    applicant_id UUID NOT NULL,
    cover_letter TEXT NOT NULL,
    resume_url TEXT,
    status TEXT NOT NULL DEFAULT 'submitted',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT job_applications_job_applicant_key UNIQUE (job_id, applicant_id),
    CONSTRAINT job_applications_status_check
        CHECK (status IN ('submitted', 'reviewing', 'shortlisted', 'rejected', 'hired'))
);
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS market;
             CREATE TABLE IF NOT EXISTS market.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM market.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO market.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
