#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The source ran out after some, but not all, of a primary header was read.
    #[error("truncated primary header: got {actual} of {minimum} bytes")]
    TruncatedHeader {
        /// Number of header bytes we got
        actual: usize,
        /// Number of bytes in a primary header
        minimum: usize,
    },

    /// The source ran out before the data field promised by the header was read.
    #[error("truncated packet data: got {actual} of {expected} bytes")]
    TruncatedPayload {
        /// Number of data bytes we got
        actual: usize,
        /// Data length from the primary header
        expected: usize,
    },

    /// Error reported by the underlying byte source
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
