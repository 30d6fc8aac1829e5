use std::fmt;
use std::sync::Arc;

/// Decoded barcode/QR content
///
/// Immutable once produced. Cloning is cheap so the coordinator can keep the
/// last result while handing a copy to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload(Arc<str>);

impl Payload {
    /// Wrap decoded text
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::from(text.into()))
    }

    /// Decoded text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the decoded text in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the decoder produced an empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl PartialEq<str> for Payload {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Payload {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
