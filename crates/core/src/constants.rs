//! Constants used throughout the TES client workspace

// API
pub const API_PREFIX: &str = "/v1";
pub const AUTHORIZATION_SCHEME: &str = "JWT";

// Environment variable names
pub const TES_SERVER_VAR: &str = "TES_SERVER";
pub const TES_API_GENERATION_VAR: &str = "TES_API_GENERATION";
pub const TES_SERVER_USER_VAR: &str = "TES_SERVER_USER";
pub const TES_SERVER_PASSWORD_VAR: &str = "TES_SERVER_PASSWORD";
pub const TES_DELEGATION_SECRET_VAR: &str = "TES_DELEGATION_SECRET";
pub const TES_S3_ENDPOINT_VAR: &str = "TES_S3_ENDPOINT";
pub const TES_LOG_VAR: &str = "TES_LOG";
pub const AWS_ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_REGION_VAR: &str = "AWS_REGION";

// Defaults
pub const DEFAULT_SERVER_ADDRESS: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const DEFAULT_S3_REGION: &str = "us-east-1";

// Storage URI schemes
pub const FILE_SCHEME: &str = "file";
pub const S3_SCHEME: &str = "s3";

// Service info storage configuration keys
pub const STORAGE_KEY_S3_ENDPOINT: &str = "S3.Endpoint";

// Config file
pub const CONFIG_DIR_NAME: &str = "tes";
pub const CONFIG_FILE_NAME: &str = "client.json";
