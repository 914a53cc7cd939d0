//! TrustDoc document pipeline
//!
//! Fetches a signed trust document from the first reachable of several
//! mirrors and accepts it only if:
//! - the envelope and its JSON payload are well formed
//! - the URL it was served from is listed inside the signed payload
//! - the signature verifies under the payload's own `_ROOT` key
//!
//! Also provides the signing side (`issue_document`) and outbound master
//! requests.

pub mod document;
pub mod error;
pub mod fetch;
pub mod issue;
pub mod payload;
pub mod request;
pub mod verify;

pub use document::TrustDocument;
pub use error::{DocumentError, DocumentResult};
pub use fetch::{
    DefaultSource, DocumentSource, FetchedDocument, FileSource, HttpSource, TransportError,
    TrustDocumentFetcher,
};
pub use issue::issue_document;
pub use payload::{KeyEntry, TrustPayload, ROOT_KEY_NAME};
pub use request::{new_user_request, MasterRequest, ACTION_NEW_USER, PROTOCOL_TAG, PROTOCOL_VERSION};
pub use verify::{TrustDocumentVerifier, VerifiedPayload};
