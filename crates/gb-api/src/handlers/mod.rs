pub mod contracts;
pub mod health;
pub mod projects;
pub mod proposals;
pub mod recruitment;
pub mod saved_jobs;
