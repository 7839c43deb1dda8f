//! Domain services. Each takes a [`Repository`](crate::graphdb::Repository),
//! builds its query, runs it and reshapes the bindings.

pub mod compound;
pub mod dashboard;
pub mod pathway;
pub mod reaction;

pub use compound::{
    get_compound_role_reactions, get_compound_role_stats, search_compounds, CompoundRoleReaction, CompoundRoleStats,
    CompoundSearchResult, CompoundSelector,
};
pub use dashboard::{
    get_dashboard_stats, get_popular_compounds, get_recent_reactions, get_top_solvents, DashboardStats,
    PopularCompound, RecentReaction, TopSolvent,
};
pub use pathway::{find_paths, get_multi_set_paths, DetailedPath, FindPathsOptions, PathSummary, ReactionRef};
pub use reaction::{
    get_reaction_participants, search_reactions, ReactionParticipant, ReactionSearchFilters, ReactionSearchResult,
};
