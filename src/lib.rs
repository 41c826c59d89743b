pub mod dataset;
pub mod fetch;
pub mod journal;

/// Timestamp layout shared by dataset rows and journal entries,
/// e.g. `2021 Feb 18 16:24`. Minute resolution on purpose.
pub const TIMESTAMP_FORMAT: &str = "%Y %b %d %H:%M";

/// Current local time rendered in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
