pub mod export;
pub mod item_ops;
pub mod list_ops;
pub mod search;
pub mod undo;
