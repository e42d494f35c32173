pub const CLI_USER_DIRECTORY: &str = ".analytics";
pub const CLI_CONFIG_FILE: &str = "config.toml";

/// Prefix of every environment variable read into the settings
pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "ANALYTICS";
/// Overrides the user directory, which otherwise lives under the home directory
pub const ENV_USER_DIRECTORY: &str = "ANALYTICS_HOME";

pub const PYTHON_FILE_EXTENSION: &str = "py";
pub const DEFAULT_MODELS_DIRECTORY: &str = "models";
