use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

use crate::config::ConfigError;
use crate::matcher::{MatcherSettings, NetworkMatcher};

/// The pairing rule a [`NetworkMatcher`] applies after each scoring round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkMatcherKind {
    /// Pairs of least total inverse score, solved exactly.
    Assignment,
    /// Pairs taken highest score first, each edge used once.
    Greedy,
}

impl NetworkMatcherKind {
    pub const fn name(&self) -> &'static str {
        match self {
            NetworkMatcherKind::Assignment => "AssignmentNetworkMatcher",
            NetworkMatcherKind::Greedy => "GreedyNetworkMatcher",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        MatcherRegistry::default().kind(name)
    }
}

impl Display for NetworkMatcherKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps configured matcher names onto their implementations.
#[derive(Clone, Debug)]
pub struct MatcherRegistry {
    kinds: IndexMap<&'static str, NetworkMatcherKind>,
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        let kinds = [NetworkMatcherKind::Assignment, NetworkMatcherKind::Greedy]
            .into_iter()
            .map(|kind| (kind.name(), kind))
            .collect();

        MatcherRegistry { kinds }
    }
}

impl MatcherRegistry {
    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    pub fn kind(&self, name: &str) -> Result<NetworkMatcherKind, ConfigError> {
        self.kinds
            .get(name.trim())
            .copied()
            .ok_or_else(|| ConfigError::UnknownMatcher(name.to_string()))
    }

    /// Creates the matcher registered as `name`, using the default strategies.
    pub fn create(&self, name: &str, settings: MatcherSettings) -> Result<NetworkMatcher, ConfigError> {
        NetworkMatcher::new(self.kind(name)?, settings)
    }
}
