pub mod analyze;
pub mod config;
pub mod import;
pub mod report;
pub mod source;

/// The selected range holds no readings and the caller asked for data.
#[derive(Debug)]
pub struct NoData;

impl std::fmt::Display for NoData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("no readings in range")
    }
}

impl std::error::Error for NoData {}
