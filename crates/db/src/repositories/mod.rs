pub mod course_session_repo;
pub mod note_repo;
pub mod report_repo;
pub mod tag_repo;
pub mod user_repo;
pub mod vote_repo;

pub use course_session_repo::CourseSessionRepo;
pub use note_repo::NoteRepo;
pub use report_repo::ReportRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
pub use vote_repo::{RemoveVoteOutcome, VoteRepo};
