pub mod autosave;
pub mod buffer;
pub mod config;
pub mod cursor;
pub mod detail;
pub mod edit;
pub mod listing;
pub mod mode;
pub mod notebook;
pub mod storage;
pub mod topic;
