//! Capture containers: the compiled form installed in place of a capture.
//!
//! A container is *Uprootable* when its XR has no runtime dependencies and can
//! be lifted out and composed elsewhere at compile time. It is *Pluckable*
//! when runtime fragments remain; those must be supplied by the capture
//! instance at runtime.

use quarry_core::{Bid, CodecError, ContainerTag, SerializedXr, Xr};
use serde::{Deserialize, Serialize};

use crate::dynamics::{DynamicsAccum, ParamBinding, RuntimeBinding};
use crate::host::HostExpr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamsModel {
    /// Bindings evaluated at the capture site.
    Listed {
        own: Vec<ParamBinding>,
        inherited: Vec<HostExpr>,
    },
    /// Read off the runtime instance produced by this call site.
    Instance(Box<HostExpr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuntimesModel {
    Listed {
        own: Vec<RuntimeBinding>,
        inherited: Vec<HostExpr>,
    },
    Instance(Box<HostExpr>),
}

impl ParamsModel {
    pub fn empty() -> Self {
        Self::Listed {
            own: Vec::new(),
            inherited: Vec::new(),
        }
    }

    /// Bind identifiers of the listed bindings. Instances are opaque.
    pub fn bids(&self) -> Vec<Bid> {
        match self {
            Self::Listed { own, .. } => own.iter().map(|p| p.bid).collect(),
            Self::Instance(_) => Vec::new(),
        }
    }
}

impl RuntimesModel {
    pub fn bids(&self) -> Vec<Bid> {
        match self {
            Self::Listed { own, .. } => own.iter().map(|r| r.bid).collect(),
            Self::Instance(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureContainer {
    pub kind: ContainerTag,
    pub xr: SerializedXr,
    pub params: ParamsModel,
    /// Present iff the container is Pluckable.
    pub runtimes: Option<RuntimesModel>,
    /// The batch data expression of an action batch.
    #[serde(default)]
    pub batch_source: Option<Box<HostExpr>>,
}

impl CaptureContainer {
    pub fn plant_new_uprootable(xr: &Xr, params: ParamsModel) -> Self {
        Self {
            kind: xr.tag(),
            xr: SerializedXr::encode(xr),
            params,
            runtimes: None,
            batch_source: None,
        }
    }

    pub fn plant_new_pluckable(xr: &Xr, runtimes: RuntimesModel, params: ParamsModel) -> Self {
        Self {
            kind: xr.tag(),
            xr: SerializedXr::encode(xr),
            params,
            runtimes: Some(runtimes),
            batch_source: None,
        }
    }

    /// Plant Uprootable or Pluckable depending on whether runtimes were collected.
    pub fn plant(xr: &Xr, dynamics: DynamicsAccum) -> Self {
        let uprootable = dynamics.no_runtimes();
        let (runtimes, inherited_runtimes, params, inherited_params) = dynamics.into_parts();
        let params = ParamsModel::Listed {
            own: params,
            inherited: inherited_params,
        };
        if uprootable {
            Self::plant_new_uprootable(xr, params)
        } else {
            let runtimes = RuntimesModel::Listed {
                own: runtimes,
                inherited: inherited_runtimes,
            };
            Self::plant_new_pluckable(xr, runtimes, params)
        }
    }

    pub fn with_batch_source(mut self, source: HostExpr) -> Self {
        self.batch_source = Some(Box::new(source));
        self
    }

    /// The same container re-pointed at a new call site.
    ///
    /// Kind and serialized XR are kept byte-for-byte; params and runtimes are
    /// read off the instance the call site produces.
    pub fn replant(&self, call_site: &HostExpr) -> Self {
        let instance = Box::new(call_site.clone());
        Self {
            kind: self.kind,
            xr: self.xr.clone(),
            params: ParamsModel::Instance(instance.clone()),
            runtimes: self
                .runtimes
                .as_ref()
                .map(|_| RuntimesModel::Instance(instance)),
            batch_source: self.batch_source.clone(),
        }
    }

    /// A container for XR fetched from the cross-module store.
    ///
    /// Runtimes are present iff the stored XR still has runtime placeholders.
    pub fn from_store(kind: ContainerTag, xr: SerializedXr, call_site: &HostExpr) -> Self {
        let has_runtimes = xr.decode().is_ok_and(|x| x.has_runtime_tags());
        let instance = Box::new(call_site.clone());
        Self {
            kind,
            xr,
            params: ParamsModel::Instance(instance.clone()),
            runtimes: has_runtimes.then(|| RuntimesModel::Instance(instance)),
            batch_source: None,
        }
    }

    pub fn is_uprootable(&self) -> bool {
        self.runtimes.is_none()
    }

    pub fn is_pluckable(&self) -> bool {
        self.runtimes.is_some()
    }

    pub fn decode(&self) -> Result<Xr, CodecError> {
        self.xr.decode()
    }
}
