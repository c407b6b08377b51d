pub mod commands;
pub mod document;
pub mod grouping;
pub mod model;
pub mod reorder;
pub mod scope;
pub mod session;
pub mod snapshot;
