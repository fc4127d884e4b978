//! Compiles search requests into authorization-filtered search documents.
//!
//! Compilation is pure: every fact about the requester arrives in an [`AuthorizationContext`]
//! resolved beforehand, and the output is a [`CompiledQuery`] describing the call to make.

pub mod assemble;
pub mod authorization;
pub mod clause;
pub mod delete;
pub mod filters;
pub mod routing;
pub mod text;

mod context;
mod document;
mod error;
mod settings;

pub use assemble::compile;
pub use authorization::{AuthorizationContext, AuthorizationFilters, ProjectIds};
pub use context::NameContext;
pub use delete::{DeleteQuery, WikiContainer};
pub use document::{CompiledQuery, QueryDocument};
pub use error::{Error, Result};
pub use settings::QuerySettings;
