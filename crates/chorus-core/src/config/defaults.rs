//! Serde default values.

pub(super) fn default_name() -> String {
    "chorus".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_trigger_count() -> usize {
    3
}

pub(super) fn default_time_window_secs() -> u64 {
    60
}
