use serde::{Deserialize, Serialize};

/// What a browser test observed in the textarea fixture, posted back to the
/// web server for server-side verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct FillReport {
    pub value: String,
    pub input_events: u32,
}
