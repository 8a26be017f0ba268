//! Message batches
//!
//! A [`Message`] is an ordered list of parts. Parts are [`Bytes`], so cloning
//! a message to hand it to another stage does not copy payload data.

use bytes::Bytes;

/// An ordered batch of byte parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    parts: Vec<Bytes>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message from existing parts.
    pub fn from_parts(parts: Vec<Bytes>) -> Self {
        Self { parts }
    }

    /// Create a message with one part per string.
    pub fn from_strs<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            parts: parts
                .into_iter()
                .map(|s| Bytes::copy_from_slice(s.as_ref().as_bytes()))
                .collect(),
        }
    }

    /// Append a part.
    pub fn push(&mut self, part: impl Into<Bytes>) {
        self.parts.push(part.into());
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the message has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The part at `index`.
    pub fn get(&self, index: usize) -> Option<&Bytes> {
        self.parts.get(index)
    }

    /// Iterate over the parts in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bytes> {
        self.parts.iter()
    }

    /// Consume the message and return its parts.
    pub fn into_parts(self) -> Vec<Bytes> {
        self.parts
    }
}

impl From<Vec<Bytes>> for Message {
    fn from(parts: Vec<Bytes>) -> Self {
        Self::from_parts(parts)
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Bytes;
    type IntoIter = std::slice::Iter<'a, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_strs() {
        let msg = Message::from_strs(["a", "bc"]);
        assert_eq!(msg.len(), 2);
        assert_eq!(msg.get(1), Some(&Bytes::from_static(b"bc")));
        assert!(msg.get(2).is_none());
    }

    #[test]
    fn test_push_and_iter() {
        let mut msg = Message::new();
        assert!(msg.is_empty());

        msg.push("first");
        msg.push(vec![1u8, 2, 3]);
        assert_eq!(msg.len(), 2);

        let collected: Vec<_> = msg.iter().map(|b| b.len()).collect();
        assert_eq!(collected, vec![5, 3]);
    }

    #[test]
    fn test_clone_shares_parts() {
        let msg = Message::from_parts(vec![Bytes::from(vec![0u8; 1024])]);
        let copy = msg.clone();
        assert_eq!(msg, copy);
        assert_eq!(msg.get(0).map(|b| b.as_ptr()), copy.get(0).map(|b| b.as_ptr()));
    }
}
