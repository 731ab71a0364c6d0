use bstr::BString;

/// A git blob object — raw file bytes, no interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: BString,
}

impl Blob {
    /// A blob's content is its payload verbatim.
    pub fn parse(content: &[u8]) -> Self {
        Self {
            data: BString::from(content),
        }
    }

    /// Size of the blob in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<&[u8]> for Blob {
    fn from(data: &[u8]) -> Self {
        Self::parse(data)
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: BString::from(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_verbatim() {
        let blob = Blob::parse(b"binary\x00data\xff");
        assert_eq!(blob.data, b"binary\x00data\xff".as_slice());
        assert_eq!(blob.len(), 12);
        assert!(!blob.is_empty());
    }

    #[test]
    fn empty_blob() {
        assert!(Blob::parse(b"").is_empty());
    }
}
