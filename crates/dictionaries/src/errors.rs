#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Malformed document: {}", _0)]
    MalformedDocument(String),

    #[error("Reference to undeclared entity {}", _0)]
    UnknownEntityReference(String),

    #[error("<{element} {attribute}=\"{value}\"> is not a supported value")]
    UnsupportedAttributeValue {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("{}", _0)]
    Datastore(#[from] jblite_datastore::Error),

    #[error("{}", _0)]
    Xml(jblite_xml::Error),

    #[error("IO error: {}", _0)]
    Io(#[from] std::io::Error),

    #[error("{} dictionaries don't support {}", format, operation)]
    Unsupported {
        format: &'static str,
        operation: &'static str,
    },
}

impl Error {
    /// Whether this is a lookup of a row which doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Datastore(jblite_datastore::Error::NotFound { .. }))
    }
}

impl From<jblite_xml::Error> for Error {
    fn from(e: jblite_xml::Error) -> Error {
        match e {
            jblite_xml::Error::MalformedDocument(m) => Error::MalformedDocument(m),
            jblite_xml::Error::UndeclaredEntity(name) => Error::UnknownEntityReference(name),
            other => Error::Xml(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
