use nix::errno::Errno;

#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("poll failed: {0}")]
    Poll(#[from] Errno),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
