mod log_outside_a_repository_fails;
mod log_with_corrupt_commit_fails;
mod model_follows_change_trigger;
mod show_diverged_heads_with_common_base;
mod show_heads_resolution;
mod show_history_from_packed_objects;
mod show_history_from_packed_remote_ref;
mod show_history_in_table_format;
mod show_history_with_heads_from_environment;
mod show_history_with_unresolved_remote;
mod show_local_ahead_of_remote;
mod show_nothing_when_no_head_resolves;
mod show_shared_head_once;
