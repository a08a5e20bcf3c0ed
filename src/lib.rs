#![doc = include_str!("../readme.md")]

pub mod element;
pub mod graph;

pub mod criterion;
pub mod network;

pub mod assign;
pub mod matcher;
pub mod score;

pub mod config;
pub mod creator;

pub mod error;
pub mod util;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use config::ConflateConfig;
#[doc(inline)]
pub use creator::{NetworkMatch, NetworkMatchCreator};
#[doc(inline)]
pub use graph::ElementGraph;
