//! Stop-name resolution and suggestions.

mod resolver;
mod suggest;

pub use resolver::{StopResolver, name_variants, query_variants};
pub use suggest::{
    DEFAULT_SUGGESTION_LIMIT, MAX_SUGGESTION_LIMIT, anchor_pattern_union, rank_suggestions,
};
