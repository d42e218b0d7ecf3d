pub mod app_state;
pub mod commands;
pub mod page;
pub mod search;
pub mod selection;
pub mod tree;
