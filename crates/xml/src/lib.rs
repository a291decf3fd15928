//! XML input for the dictionary loaders.
//!
//! - [read_source] reads a file, gunzipping it if needed.
//! - [expand_entities] pulls `<!ENTITY name "expansion">` declarations out of the internal DTD.
//! - [parse_document] builds an owned [Element] tree which the loaders walk.
mod dtd;
mod element;
mod errors;
mod parser;
mod source;

pub use dtd::*;
pub use element::*;
pub use errors::*;
pub use parser::*;
pub use source::*;
