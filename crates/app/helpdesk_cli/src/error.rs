use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("io: {}", .0)]
    Io(#[from] std::io::Error),

    #[error("logger: {}", .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("database: {}", .0)]
    Data(#[from] helpdesk_core::DataError),
}

impl Error {
    /// Process exit code: 2 when the store reports a broken invariant, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Data(err) if err.is_fatal() => 2,
            _ => 1,
        }
    }
}
