#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("docker CLI not found, install: https://docs.docker.com/get-docker/")]
    NotFound { source: std::io::Error },

    #[error("docker command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("docker output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[error("docker did not answer within {after:?}")]
    TimedOut { after: std::time::Duration },
}

impl DockerError {
    /// Whether the daemon answered but does not have the image locally.
    pub fn is_missing_image(&self) -> bool {
        match self {
            Self::CommandFailed { stderr, .. } => {
                let stderr = stderr.to_lowercase();
                stderr.contains("no such image") || stderr.contains("no such object")
            }
            Self::NotFound { .. } | Self::InvalidUtf8 { .. } | Self::TimedOut { .. } => false,
        }
    }
}
