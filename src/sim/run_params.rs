//! Run parameters: network description, router settings and the injection /
//! churn schedule. Time values are virtual-time units (see [`SimTime`]).

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::SimTime;

pub const DEFAULT_PKG_SIZE: u32 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParams {
    pub network: Vec<EdgeSpec>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// An undirected edge; both directions get their own transmission resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeSpec {
    pub u: usize,
    pub v: usize,
    /// Bytes per virtual-time unit.
    pub bandwidth: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pkg_distr: PkgDistr,
    #[serde(default)]
    pub router_env: RouterEnvSettings,
    #[serde(default)]
    pub router: RouterSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkgDistr {
    #[serde(default)]
    pub sequence: Vec<RunStep>,
    #[serde(default = "default_pkg_size")]
    pub pkg_size: u32,
}

impl Default for PkgDistr {
    fn default() -> Self {
        Self {
            sequence: Vec::new(),
            pkg_size: DEFAULT_PKG_SIZE,
        }
    }
}

fn default_pkg_size() -> u32 {
    DEFAULT_PKG_SIZE
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RouterEnvSettings {
    /// Time a node holds its processing slot per inbound package.
    #[serde(default)]
    pub pkg_process_delay: f64,
}

impl RouterEnvSettings {
    pub fn process_delay(&self) -> SimTime {
        SimTime::from_secs_f64(self.pkg_process_delay)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterSettings {
    #[serde(default)]
    pub simple_q: QRouterSettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QRouterSettings {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_initial_estimate")]
    pub initial_estimate: f64,
}

impl Default for QRouterSettings {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            initial_estimate: default_initial_estimate(),
        }
    }
}

fn default_learning_rate() -> f64 {
    0.5
}

fn default_initial_estimate() -> f64 {
    10.0
}

/// One entry of the run schedule.
///
/// Accepts both the descriptive field names and the short experiment-file
/// spellings (`pkg_number`, `delta`, `dests`, `pause`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RunStep {
    Link {
        action: LinkAction,
        u: usize,
        v: usize,
        #[serde(default, alias = "pause")]
        pause_after: f64,
    },
    Packets {
        #[serde(alias = "pkg_number")]
        count: u64,
        #[serde(default)]
        sources: Option<Vec<usize>>,
        #[serde(default, alias = "dests")]
        destinations: Option<Vec<usize>>,
        #[serde(alias = "delta")]
        interval: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LinkAction {
    #[serde(rename = "break", alias = "break_link")]
    Break,
    #[serde(rename = "restore", alias = "restore_link")]
    Restore,
}

impl RunParams {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let params: RunParams = serde_json::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Node ids mentioned by the network description, ascending.
    pub fn node_ids(&self) -> BTreeSet<usize> {
        self.network.iter().flat_map(|e| [e.u, e.v]).collect()
    }

    /// Size of the node table (ids are used as indices).
    pub fn node_count(&self) -> usize {
        self.node_ids().last().map_or(0, |max| max + 1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.is_empty() {
            return Err(ConfigError::EmptyNetwork);
        }
        let mut seen = BTreeSet::new();
        for e in &self.network {
            if e.bandwidth == 0 {
                return Err(ConfigError::ZeroBandwidth { u: e.u, v: e.v });
            }
            if e.u == e.v {
                return Err(ConfigError::SelfLoop { node: e.u });
            }
            if !seen.insert((e.u.min(e.v), e.u.max(e.v))) {
                return Err(ConfigError::DuplicateLink { u: e.u, v: e.v });
            }
        }

        let nodes = self.node_ids();
        let check = |node: usize| {
            if nodes.contains(&node) {
                Ok(())
            } else {
                Err(ConfigError::UnknownNode { node })
            }
        };
        for step in &self.settings.pkg_distr.sequence {
            match step {
                RunStep::Link { u, v, .. } => {
                    check(*u)?;
                    check(*v)?;
                    if !self.has_edge(*u, *v) {
                        return Err(ConfigError::UnknownLink { u: *u, v: *v });
                    }
                }
                RunStep::Packets {
                    sources,
                    destinations,
                    ..
                } => {
                    for list in [sources, destinations].into_iter().flatten() {
                        if list.is_empty() {
                            return Err(ConfigError::EmptyNodeList);
                        }
                        list.iter().copied().try_for_each(check)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.network
            .iter()
            .any(|e| (e.u == u && e.v == v) || (e.u == v && e.v == u))
    }
}
