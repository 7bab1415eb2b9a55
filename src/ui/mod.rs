pub mod app;
pub mod tree_view;
