//! Foundational low-level utilities shared across the housekeeper crates.
//!
//! Provides the atomic file-write helper used by the tier store, unix time
//! helpers used as the sweep clock, and the human-readable duration rendering
//! used in channel notices.

pub mod atomic_io;
pub mod duration_text;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use duration_text::{render_days_hours, render_threshold};
pub use time_utils::{
    current_unix_timestamp, current_unix_timestamp_ms, elapsed_seconds, SECONDS_PER_DAY,
    SECONDS_PER_HOUR,
};

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use super::*;

    #[test]
    fn time_utils_round_trip_bounds() {
        let now_s = current_unix_timestamp();
        let now_ms = current_unix_timestamp_ms();
        let now_ms_s = now_ms / 1_000;
        assert!(now_ms_s >= now_s);
        assert!(now_ms_s <= now_s.saturating_add(1));
    }

    #[test]
    fn write_text_atomic_writes_content() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("nested").join("tiers.json");
        write_text_atomic(&path, "{}\n").expect("write");
        let contents = read_to_string(&path).expect("read");
        assert_eq!(contents, "{}\n");
    }

    #[test]
    fn write_text_atomic_replaces_existing_content() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("tiers.json");
        write_text_atomic(&path, "first").expect("first write");
        write_text_atomic(&path, "second").expect("second write");
        assert_eq!(read_to_string(&path).expect("read"), "second");
    }

    #[test]
    fn write_text_atomic_rejects_directory_destination() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let error = write_text_atomic(tempdir.path(), "payload").expect_err("directory");
        assert!(error.to_string().contains("is a directory"));
    }
}
