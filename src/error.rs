use thiserror::Error;

use crate::config::ConfigError;
use crate::impl_err;
use crate::matcher::MatchError;
use crate::network::ExtractionError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(ConfigError),

    #[error("extraction error: {0}")]
    Extraction(ExtractionError),

    #[error("match error: {0}")]
    Match(MatchError),

    #[error("the run was cancelled")]
    Cancelled,
}

impl_err!(ConfigError, Config);
impl_err!(ExtractionError, Extraction);
impl_err!(MatchError, Match);

pub type Result<T> = core::result::Result<T, Error>;
