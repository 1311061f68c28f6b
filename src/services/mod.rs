pub(crate) mod grading;
pub(crate) mod identity;
pub(crate) mod leaderboard;
pub(crate) mod quiz_catalog;
pub(crate) mod results;
