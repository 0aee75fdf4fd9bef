use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the library root")]
    Storage,
    #[display("could not open the title index")]
    Index,
    #[display("scan failed")]
    Scan,
    #[display("title operation failed")]
    Title,
    #[display("invalid argument: {_0}")]
    Argument(#[error(not(source))] String),
}
