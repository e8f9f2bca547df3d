//! Request types for OCR operations.

use serde::{Deserialize, Serialize};

/// A single document to recognize, identified by a client-supplied key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionRequest {
    key: String,
    locator: String,
}

impl RecognitionRequest {
    /// Creates a new recognition request.
    pub fn new(key: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            locator: locator.into(),
        }
    }

    /// Returns the client-supplied key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the resource locator of the document.
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// An ordered set of documents recognized concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    items: Vec<RecognitionRequest>,
}

impl BatchRequest {
    /// Creates a new batch from the given items.
    pub fn new(items: Vec<RecognitionRequest>) -> Self {
        Self { items }
    }

    /// Returns the items in input order.
    pub fn items(&self) -> &[RecognitionRequest] {
        &self.items
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the batch has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<RecognitionRequest> for BatchRequest {
    fn from_iter<I: IntoIterator<Item = RecognitionRequest>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
