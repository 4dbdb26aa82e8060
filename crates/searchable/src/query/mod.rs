//! Query-builder collaborator.
//!
//! - [`fragment`] - SQL text paired with its ordered bound values
//! - [`builder`] - the [`QueryBuilder`] capability and the bundled [`SelectQuery`]

pub mod builder;
pub mod fragment;

pub use builder::{
    BindingCategory, Bindings, JoinClause, JoinFilter, QueryBuilder, SelectQuery, SortDirection,
};
pub use fragment::{SqlFragment, SqlParam};
