//! Page records and their exchange form
//!
//! Each crawled page is persisted as a single self-describing JSON object:
//!
//! ```text
//! {"webpage":{"uri":"http://example.com","keywords":["Example","Domain"]}}
//! ```
//!
//! Records are written back-to-back with no enclosing array, so a reader
//! must consume one object at a time (see [`read_records`]).

use crate::output::SinkError;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// The persisted `{uri, keywords}` tuple produced per crawled page
///
/// `keywords` holds the page's sanitized visible-text fragments in document
/// order. No stemming or stopword removal is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub uri: String,
    pub keywords: Vec<String>,
}

#[derive(Serialize)]
struct Envelope<'a> {
    webpage: &'a PageRecord,
}

#[derive(Deserialize)]
struct OwnedEnvelope {
    webpage: PageRecord,
}

impl PageRecord {
    pub fn new(uri: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            uri: uri.into(),
            keywords,
        }
    }

    /// Serializes the record to its `{"webpage":{..}}` exchange form
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Envelope { webpage: self })
    }
}

/// Reads every record from a back-to-back record log
///
/// Whitespace between records is tolerated, so logs written with a newline
/// separator parse the same way.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<PageRecord>, SinkError> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<OwnedEnvelope>()
        .map(|envelope| envelope.map(|e| e.webpage).map_err(SinkError::from))
        .collect()
}
