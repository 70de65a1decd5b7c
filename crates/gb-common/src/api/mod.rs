pub mod contract;
pub mod project;
pub mod proposal;
pub mod recruitment;
