use std::fs;
use std::path::Path;

use crate::error::Error;

/// Content-type tag for a simple message body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Plain,
    Html,
}

/// A file attachment resolved to its display name and raw bytes.
#[derive(Clone, Debug)]
pub struct Attachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Attachment {
    /// Read the file at `path`, resolving the name shown to the recipient
    /// and the content to send.
    pub fn from_path(path: &Path) -> Result<Attachment, Error> {
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Err(Error::BadAttachmentPath(path.to_owned())),
        };
        let content = fs::read(path)?;
        Ok(Attachment { file_name, content })
    }
}
