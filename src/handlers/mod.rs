//! Route handlers, one module per resource.
//!
//! Handlers stay thin: extract, validate, call the repository, shape the
//! response. Authorization is expressed in the signature through the
//! `AuthUser` / `Owner` extractors.

pub mod categories;
pub mod menus;
pub mod users;

pub use categories::{create_category, delete_category, list_categories, update_category};
pub use menus::{create_menu, delete_menu, get_menu, list_menus, update_menu};
pub use users::{get_me, sign_in, sign_out, sign_up};
