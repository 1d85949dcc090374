use std::sync::Arc;

use log::Logger;

use crate::config::{get_parsed_or, DEFAULT_NEARBY_LIMIT};
use crate::directory::Directory;

/// Everything a request handler needs, built once at startup and
/// cloned into each route.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub directory: Directory,
    pub config: Config,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, directory: Directory, config: Config) -> Self {
        Self {
            logger,
            directory,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) nearby_limit: usize,
}

impl Config {
    pub fn new(nearby_limit: usize) -> Self {
        Self { nearby_limit }
    }

    pub fn from_env() -> Self {
        Config::new(get_parsed_or("UBS_NEARBY_LIMIT", DEFAULT_NEARBY_LIMIT))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_NEARBY_LIMIT)
    }
}
