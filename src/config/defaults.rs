/// Configuration default values
///
/// All defaults for configuration options live here so they are
/// changeable in one central location.
// Storage defaults
pub const DEFAULT_NOTEBOOK_PATH: &str = "./nb";
pub const DEFAULT_QUEUE_PATH: &str = "./queue";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_FINDINGS_PATH: &str = "./findings";
pub const DEFAULT_CONFIG_PATH: &str = "./config";

// Watcher defaults
pub const DEFAULT_CHECK_INTERVAL: &str = "3s";
pub const DEFAULT_OUTPUT_GRANULARITY: &str = "d";

// Engine defaults
pub const DEFAULT_PAPERMILL_COMMAND: &str = "papermill";
pub const DEFAULT_NBCONVERT_COMMAND: &str = "jupyter";

// Log file written inside the configured log folder
pub const LOG_FILE_NAME: &str = "nb-runner.log";
