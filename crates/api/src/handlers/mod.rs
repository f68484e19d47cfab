pub mod notes;
pub mod reports;
pub mod votes;
