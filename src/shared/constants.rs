use std::time::Duration;

/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// TICKETS
// =============================================================================

/// Prefix for human-readable ticket ids (BDG-YYYYMMDD-NNNN)
pub const TICKET_ID_PREFIX: &str = "BDG";

/// Attempts before giving up when the random ticket-id suffix collides
pub const TICKET_ID_MAX_ATTEMPTS: u32 = 5;

/// Maximum citizen feedback length in characters
pub const FEEDBACK_MAX_LEN: usize = 1000;

// =============================================================================
// RATING OTP
// =============================================================================

/// How long an issued rating OTP stays valid
pub const OTP_VALIDITY: Duration = Duration::from_secs(30 * 60);

/// Minimum gap between OTP issues for the same ticket
pub const OTP_RESEND_COOLDOWN: Duration = Duration::from_secs(60);

// =============================================================================
// RESPONSE CACHE TTLS
// =============================================================================

pub const CACHE_TTL_LIST: Duration = Duration::from_secs(30);
pub const CACHE_TTL_STATS: Duration = Duration::from_secs(60);
pub const CACHE_TTL_MAP: Duration = Duration::from_secs(300);
pub const CACHE_TTL_TRACK: Duration = Duration::from_secs(10);

/// Author recorded on timeline entries written by the pipeline itself
pub const AUTHOR_SYSTEM: &str = "system";

/// Author recorded on timeline entries triggered by the reporter
pub const AUTHOR_REPORTER: &str = "reporter";
