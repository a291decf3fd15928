#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Malformed document: {}", _0)]
    MalformedDocument(String),

    #[error("Reference to undeclared entity &{};", _0)]
    UndeclaredEntity(String),

    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: u64,
        source: quick_xml::Error,
    },

    #[error("IO error: {}", _0)]
    Io(#[from] std::io::Error),

    #[error("Document is not valid UTF-8: {}", _0)]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
