pub mod edit;
pub mod export;
pub mod import;
pub mod show;
