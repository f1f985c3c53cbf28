//! Constants used throughout the OpenRoom core crate.

/// Dataset loaded by the binaries when `OPENROOM_DATA` is not set.
pub const DEFAULT_DATASET_PATH: &str = "seed/demo.yaml";

/// Default bind address for the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Shown on the login form when sign-in fails for a reason other than the auth service.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Empty-state hint while a search term is active.
pub const ADJUST_SEARCH_HINT: &str = "Try adjusting your search criteria";

/// Empty-state hints when no search term is active.
pub const NO_PATIENTS_HINT: &str = "Get started by adding your first patient";
pub const NO_SUMMARIES_HINT: &str = "Summaries will appear here once generated";
pub const NO_STAFF_HINT: &str = "No staff members found";

/// Buffer size of the session-change broadcast channel.
pub const AUTH_EVENT_CAPACITY: usize = 16;

/// Shortest password the in-memory auth service accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Date format used by every date input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
