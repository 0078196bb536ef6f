use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid build argument {arg:?}: {reason}")]
    InvalidBuildArg { arg: String, reason: &'static str },

    #[error("context.channel_capacity must be at least 1")]
    ZeroChannelCapacity,
}
