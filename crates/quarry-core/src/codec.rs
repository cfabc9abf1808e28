//! Serialized XR: `"{ContainerTag}-{payload}"`.
//!
//! The payload is the JSON encoding of the root node. Encoding is
//! deterministic, so the same XR always produces byte-identical text.

use serde::{Deserialize, Serialize};

use crate::xr::{ContainerTag, Xr};

/// Error while decoding serialized XR.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("serialized XR has no `-` separator")]
    MissingSeparator,

    #[error("unknown container tag `{0}`")]
    UnknownTag(String),

    #[error("malformed {tag} payload: {source}")]
    Payload {
        tag: ContainerTag,
        #[source]
        source: serde_json::Error,
    },
}

/// Serialized XR text, tag included.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedXr(String);

impl SerializedXr {
    pub fn encode(xr: &Xr) -> Self {
        let payload = match xr {
            Xr::Query(q) => serde_json::to_string(q),
            Xr::Expr(e) => serde_json::to_string(e),
            Xr::Action(a) => serde_json::to_string(a),
            Xr::Batch(b) => serde_json::to_string(b),
        }
        .expect("XR serialization should not fail");
        Self(format!("{}-{}", xr.tag(), payload))
    }

    /// Wrap text read back from storage. Validation happens in `decode`.
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The container tag, if the prefix names one.
    pub fn tag(&self) -> Result<ContainerTag, CodecError> {
        let (tag, _) = self.split()?;
        Ok(tag)
    }

    pub fn payload(&self) -> Result<&str, CodecError> {
        let (_, payload) = self.split()?;
        Ok(payload)
    }

    pub fn decode(&self) -> Result<Xr, CodecError> {
        let (tag, payload) = self.split()?;
        let wrap = |source| CodecError::Payload { tag, source };
        let xr = match tag {
            ContainerTag::Query => Xr::Query(serde_json::from_str(payload).map_err(wrap)?),
            ContainerTag::Expr => Xr::Expr(serde_json::from_str(payload).map_err(wrap)?),
            ContainerTag::Action => Xr::Action(serde_json::from_str(payload).map_err(wrap)?),
            ContainerTag::ActionBatch => Xr::Batch(serde_json::from_str(payload).map_err(wrap)?),
        };
        Ok(xr)
    }

    fn split(&self) -> Result<(ContainerTag, &str), CodecError> {
        let (tag, payload) = self.0.split_once('-').ok_or(CodecError::MissingSeparator)?;
        let tag = ContainerTag::parse(tag).ok_or_else(|| CodecError::UnknownTag(tag.to_owned()))?;
        Ok((tag, payload))
    }
}

impl std::fmt::Display for SerializedXr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
