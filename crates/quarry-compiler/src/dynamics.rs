//! Runtime-only leaves collected while parsing one capture.
//!
//! Parameters are host values bound at runtime (`param(..)` and friends).
//! Runtimes are host sub-fragments whose XR is not known statically. Both are
//! keyed by the [`Bid`] of the placeholder emitted into the XR. Inherited
//! entries are host expressions evaluating to capture instances whose own
//! params/runtimes are merged in at runtime.

use quarry_core::Bid;
use serde::{Deserialize, Serialize};

use crate::host::HostExpr;

/// How a parameter value crosses into the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    ScalarStatic,
    ScalarCustom,
    ScalarCustomValue,
    ScalarContextual,
    ListStatic,
    ListCustom,
    ListCustomValue,
    ListContextual,
}

impl ParamKind {
    pub const ALL: [ParamKind; 8] = [
        Self::ScalarStatic,
        Self::ScalarCustom,
        Self::ScalarCustomValue,
        Self::ScalarContextual,
        Self::ListStatic,
        Self::ListCustom,
        Self::ListCustomValue,
        Self::ListContextual,
    ];

    /// The binding call that selects this kind.
    pub fn call_name(self) -> &'static str {
        match self {
            Self::ScalarStatic => "param",
            Self::ScalarCustom => "paramCustom",
            Self::ScalarCustomValue => "paramCustomValue",
            Self::ScalarContextual => "paramCtx",
            Self::ListStatic => "params",
            Self::ListCustom => "paramsCustom",
            Self::ListCustomValue => "paramsCustomValue",
            Self::ListContextual => "paramsCtx",
        }
    }

    pub fn from_call_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.call_name() == name)
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            Self::ListStatic | Self::ListCustom | Self::ListCustomValue | Self::ListContextual
        )
    }

    /// Static kinds are encoded with a built-in serializer.
    pub fn is_static(self) -> bool {
        matches!(self, Self::ScalarStatic | Self::ListStatic)
    }

    /// Custom kinds carry a serializer expression as their second argument.
    pub fn is_custom(self) -> bool {
        matches!(self, Self::ScalarCustom | Self::ListCustom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamBinding {
    pub bid: Bid,
    pub value: HostExpr,
    pub kind: ParamKind,
    #[serde(default)]
    pub serializer: Option<HostExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeBinding {
    pub bid: Bid,
    pub fragment: HostExpr,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicsAccum {
    runtimes: Vec<RuntimeBinding>,
    inherited_runtimes: Vec<HostExpr>,
    params: Vec<ParamBinding>,
    inherited_params: Vec<HostExpr>,
}

impl DynamicsAccum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_param(
        &mut self,
        bid: Bid,
        value: HostExpr,
        kind: ParamKind,
        serializer: Option<HostExpr>,
    ) {
        self.params.push(ParamBinding {
            bid,
            value,
            kind,
            serializer,
        });
    }

    pub fn add_runtime(&mut self, bid: Bid, fragment: HostExpr) {
        self.runtimes.push(RuntimeBinding { bid, fragment });
    }

    pub fn inherit_params(&mut self, instance: HostExpr) {
        self.inherited_params.push(instance);
    }

    pub fn inherit_runtimes(&mut self, instance: HostExpr) {
        self.inherited_runtimes.push(instance);
    }

    /// Append `other` after `self`, preserving encounter order.
    ///
    /// Bindings whose BID is already recorded are skipped, so merging the
    /// same body twice keeps each BID once.
    pub fn merge(&mut self, other: DynamicsAccum) {
        for runtime in other.runtimes {
            if !self.runtimes.iter().any(|r| r.bid == runtime.bid) {
                self.runtimes.push(runtime);
            }
        }
        for param in other.params {
            if !self.params.iter().any(|p| p.bid == param.bid) {
                self.params.push(param);
            }
        }
        self.inherited_runtimes.extend(other.inherited_runtimes);
        self.inherited_params.extend(other.inherited_params);
    }

    /// Rewrite every binding's BID through `renumber` and order the lists by
    /// the new BIDs. Bindings mapped to `None` no longer have a placeholder
    /// and are dropped.
    pub fn renumber(&mut self, renumber: impl Fn(Bid) -> Option<Bid>) {
        self.params.retain_mut(|p| match renumber(p.bid) {
            Some(bid) => {
                p.bid = bid;
                true
            }
            None => false,
        });
        self.runtimes.retain_mut(|r| match renumber(r.bid) {
            Some(bid) => {
                r.bid = bid;
                true
            }
            None => false,
        });
        self.params.sort_by_key(|p| p.bid);
        self.runtimes.sort_by_key(|r| r.bid);
    }

    /// The sole arbiter of Uprootable vs Pluckable.
    pub fn no_runtimes(&self) -> bool {
        self.runtimes.is_empty() && self.inherited_runtimes.is_empty()
    }

    pub fn params(&self) -> &[ParamBinding] {
        &self.params
    }

    pub fn inherited_params(&self) -> &[HostExpr] {
        &self.inherited_params
    }

    pub fn runtimes(&self) -> &[RuntimeBinding] {
        &self.runtimes
    }

    pub fn inherited_runtimes(&self) -> &[HostExpr] {
        &self.inherited_runtimes
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<RuntimeBinding>,
        Vec<HostExpr>,
        Vec<ParamBinding>,
        Vec<HostExpr>,
    ) {
        (
            self.runtimes,
            self.inherited_runtimes,
            self.params,
            self.inherited_params,
        )
    }
}
