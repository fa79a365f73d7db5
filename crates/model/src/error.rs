use crate::node::NodeKind;
use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by node construction, JSON exchange, and tree upserts.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A node was built, or a root installed, with an empty qualified
    /// identifier.
    #[error("qualified identifier must not be empty")]
    EmptyIdentifier,

    /// A kind with a mandatory simple name was built with an empty one.
    #[error("{kind} nodes require a non-empty name")]
    EmptyName { kind: NodeKind },

    /// A parent key equal to the node's own identifier was rejected.
    #[error("node `{qid}` cannot be its own parent")]
    SelfParent { qid: String },

    /// JSON decoding failed; the whole document is rejected, no partial
    /// results are produced.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// JSON encoding failed.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// An upserted node carries no parent key, so no container can be
    /// resolved for it.
    #[error("node `{qid}` carries no parent key")]
    MissingParentKey { qid: String },

    /// An upserted node names a container the tree does not contain.
    #[error("cannot place node `{qid}`: container `{parent}` is not in the tree")]
    UnresolvedParent { qid: String, parent: String },

    /// A root-level upsert does not match the installed root.
    #[error("root-level project `{qid}` does not match tree root `{root}`")]
    RootMismatch { qid: String, root: String },
}
