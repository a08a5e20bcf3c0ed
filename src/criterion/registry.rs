use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use crate::config::ConfigError;
use crate::criterion::{Criterion, GeometryType};
use crate::element::{ElementId, ElementKind, Status};

/// Builds a criterion from its (optional) configured argument.
pub type Constructor = fn(Option<&str>) -> Result<Criterion, String>;

/// Maps configured criterion names onto their constructors.
///
/// Names are written `Name` or `Name=argument`, the argument being
/// everything following the first `=`. For instance:
///
/// - `HighwayCriterion`
/// - `TagKeyCriterion=bridge`
/// - `TagCriterion=surface=paved`
/// - `ElementIdCriterion=Way:12,Way:13`
/// - `NotCriterion=TagKeyCriterion=tunnel`
#[derive(Clone)]
pub struct CriterionRegistry {
    constructors: IndexMap<&'static str, Constructor>,
}

impl Debug for CriterionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Default for CriterionRegistry {
    fn default() -> Self {
        let mut registry = CriterionRegistry {
            constructors: IndexMap::new(),
        };

        registry.register("StatusCriterion", |arg| {
            let arg = required(arg)?;
            Status::from_str(arg)
                .map(Criterion::Status)
                .map_err(|_| arg.to_string())
        });
        registry.register("HighwayCriterion", |arg| {
            no_argument(arg).map(|_| Criterion::Highway)
        });
        registry.register("PointCriterion", |arg| {
            no_argument(arg).map(|_| Criterion::GeometryType(GeometryType::Point))
        });
        registry.register("LinearCriterion", |arg| {
            no_argument(arg).map(|_| Criterion::GeometryType(GeometryType::Line))
        });
        registry.register("PolygonCriterion", |arg| {
            no_argument(arg).map(|_| Criterion::GeometryType(GeometryType::Polygon))
        });
        registry.register("TagKeyCriterion", |arg| {
            Ok(Criterion::TagKey(required(arg)?.to_string()))
        });
        registry.register("TagCriterion", |arg| {
            let arg = required(arg)?;
            arg.split_once('=')
                .map(|(key, value)| Criterion::tag(key, value))
                .ok_or_else(|| arg.to_string())
        });
        registry.register("ElementIdCriterion", |arg| {
            let arg = required(arg)?;
            arg.split(',')
                .map(|id| parse_element_id(id.trim()).ok_or_else(|| id.to_string()))
                .collect::<Result<BTreeSet<_>, _>>()
                .map(Criterion::ElementIds)
        });
        registry.register("DisconnectedWayCriterion", |arg| {
            no_argument(arg).map(|_| Criterion::DisconnectedWay)
        });
        registry.register("NotCriterion", |arg| {
            let arg = required(arg)?;
            CriterionRegistry::default()
                .create(arg)
                .map(Criterion::not)
                .map_err(|_| arg.to_string())
        });

        registry
    }
}

impl CriterionRegistry {
    /// Registers a constructor, replacing any existing one of the same name.
    pub fn register(&mut self, name: &'static str, constructor: Constructor) {
        self.constructors.insert(name, constructor);
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    pub fn create(&self, configured: &str) -> Result<Criterion, ConfigError> {
        let (name, argument) = match configured.trim().split_once('=') {
            Some((name, argument)) => (name, Some(argument)),
            None => (configured.trim(), None),
        };

        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCriterion(name.to_string()))?;

        debug!("Creating criterion {name} with argument {argument:?}");
        constructor(argument).map_err(|argument| ConfigError::InvalidCriterionArgument {
            name: name.to_string(),
            argument,
        })
    }
}

fn required(argument: Option<&str>) -> Result<&str, String> {
    argument
        .filter(|argument| !argument.is_empty())
        .ok_or_else(String::new)
}

fn no_argument(argument: Option<&str>) -> Result<(), String> {
    match argument {
        None => Ok(()),
        Some(argument) => Err(argument.to_string()),
    }
}

/// Parses `Kind:id`, such as `Way:12`.
fn parse_element_id(value: &str) -> Option<ElementId> {
    let (kind, id) = value.split_once(':')?;
    Some(ElementId::new(
        ElementKind::from_str(kind).ok()?,
        id.parse().ok()?,
    ))
}
