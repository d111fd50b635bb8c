use std::env;
use std::path::PathBuf;
use tes_core::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

/// XDG Base Directory paths for the TES client
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/tes or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join(CONFIG_DIR_NAME)
    }

    /// Get the default client configuration file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_xdg_paths_with_env() {
        let config_orig = env::var("XDG_CONFIG_HOME").ok();

        env::set_var("XDG_CONFIG_HOME", "/tmp/config");
        assert_eq!(XdgPaths::config_dir(), PathBuf::from("/tmp/config/tes"));
        assert_eq!(
            XdgPaths::config_file(),
            PathBuf::from("/tmp/config/tes/client.json")
        );

        match config_orig {
            Some(val) => env::set_var("XDG_CONFIG_HOME", val),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}
