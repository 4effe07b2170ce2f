pub(crate) mod bulk_actions;
pub(crate) mod query_cache;
pub(crate) mod roster_rules;
pub(crate) mod transition_progress;
