// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Relay";

/// Application name in lowercase (for the default log-filter target)
pub const APP_NAME_LOWER: &str = "relay";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "BROKER_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "BROKER_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "BROKER_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7878;

// =============================================================================
// Broker Defaults
// =============================================================================

/// Bounded capacity of a single consumer's outbound queue.
pub const CONSUMER_QUEUE_CAPACITY: usize = 1024;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds.
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Request Body Limits
// =============================================================================

/// Default body limit for API requests (1 MB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
