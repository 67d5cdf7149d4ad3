//! Router factory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::link_state::LinkStateRouter;
use super::q_router::QRouter;
use super::topology::Topology;
use super::Router;
use crate::error::ConfigError;
use crate::net::NodeId;
use crate::sim::RouterSettings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouterKind {
    LinkState,
    SimpleQ,
}

impl RouterKind {
    pub fn build(self, id: NodeId, topology: Topology, settings: &RouterSettings) -> Box<dyn Router> {
        match self {
            RouterKind::LinkState => Box::new(LinkStateRouter::new(id, topology)),
            RouterKind::SimpleQ => Box::new(QRouter::new(id, topology, settings.simple_q)),
        }
    }
}

impl FromStr for RouterKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link_state" => Ok(RouterKind::LinkState),
            "simple_q" => Ok(RouterKind::SimpleQ),
            other => Err(ConfigError::UnsupportedRouterType(other.to_string())),
        }
    }
}

impl fmt::Display for RouterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouterKind::LinkState => "link_state",
            RouterKind::SimpleQ => "simple_q",
        })
    }
}
