use std::string::FromUtf8Error;
use std::time::Duration;

use derive_more::{Display, From};

pub type Result<T> = anyhow::Result<T, Error>;

#[derive(Debug, From, Display)]
pub enum Error {
    #[from]
    Custom(String),

    #[display(fmt = "invalid address: {}", _0)]
    InvalidAddress(String),

    #[display(fmt = "no reply within {:?}", _0)]
    ReceiveTimeout(Duration),

    #[display(fmt = "server event receiver was already taken")]
    ServerEventsNotFound,

    #[from]
    IO(std::io::Error),

    #[from]
    #[display(fmt = "reply is not valid UTF-8: {}", _0)]
    Decode(FromUtf8Error),
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self::Custom(value.to_string())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_display_their_message() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        assert_eq!(err.to_string(), "refused");
    }

    #[test]
    fn timeout_names_the_duration() {
        let err = Error::ReceiveTimeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "no reply within 250ms");
    }

    #[test]
    fn str_converts_to_custom() {
        let err: Error = "boom".into();
        assert!(matches!(err, Error::Custom(ref s) if s == "boom"));
    }
}
