//! Database wiping utilities
//!
//! Clears every row managed by a [`rocky_orm::DataContext`] with one `DELETE`
//! per table, ordered so foreign keys never reject a statement.

pub mod naming;
pub mod order;
pub mod wipe;

pub use naming::{format_table_name, to_snake_case};
pub use order::{deletion_order, WipeOptions};
pub use wipe::{create_empty_via_wipe, table_names_in_wipe_order, wipe_all_data, DataContextExt};
