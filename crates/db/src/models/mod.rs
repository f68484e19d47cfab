pub mod course_session;
pub mod lookup;
pub mod note;
pub mod report;
pub mod tag;
pub mod user;
pub mod vote;
