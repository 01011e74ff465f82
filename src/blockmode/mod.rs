pub mod gcm;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("GCM requires a block cipher with 16-byte blocks, got {}", .0)]
    InvalidBlockSize(usize),

    #[error("invalid tag size {}, must be between 4 and 16", .0)]
    InvalidTagSize(usize),

    #[error("invalid nonce size, want {}, got {}", .0, .1)]
    InvalidNonceSize(usize, usize),

    #[error("GCM nonce must not be empty")]
    EmptyNonce,

    #[error("additional data must be supplied before any plaintext or ciphertext")]
    AadAfterPayload,

    #[error("GCM authentication failed while decrypting")]
    GCMAuthenticationError,

    #[error("GCM ciphertext's length ({}) is shorter than tag size({})", .0, .1)]
    GCMCiphertextTooSmall(usize, usize),

    #[error("output too small, want: {}, got: {}", .0, .1)]
    OutputTooSmall(usize, usize),
}
pub type Result<T> = core::result::Result<T, Error>;
