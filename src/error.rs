use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Network(reqwest::Error),
    Json(serde_json::Error),
    CacheMiss(String),
    Host(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Network(e) => write!(f, "{}", e),
            Error::Json(e) => write!(f, "{}", e),
            Error::CacheMiss(id) => write!(f, "Chat not loaded: {}", id),
            Error::Host(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Host(value)
    }
}
