//! Explicit owner of the state shared by every prime search: the
//! calibration config and the cached primorial GCD filters.
//!
//! Construct one per application and pass it by reference, or use
//! [`PrimeContext::shared`] for a process-wide default instance.

use std::sync::OnceLock;

use crate::config::SieveConfig;
use crate::error::Result;
use crate::pretest::PrimorialCache;

pub struct PrimeContext {
    config: SieveConfig,
    primorials: PrimorialCache,
}

impl PrimeContext {
    /// Validates `config` and builds the small primorial.
    pub fn new(config: SieveConfig) -> Result<Self> {
        config.validate()?;
        Ok(PrimeContext {
            config,
            primorials: PrimorialCache::new(),
        })
    }

    /// Process-wide context with the default calibration, built on first use.
    pub fn shared() -> &'static PrimeContext {
        static SHARED: OnceLock<PrimeContext> = OnceLock::new();
        SHARED.get_or_init(PrimeContext::default)
    }

    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    pub fn primorials(&self) -> &PrimorialCache {
        &self.primorials
    }
}

impl Default for PrimeContext {
    fn default() -> Self {
        PrimeContext {
            config: SieveConfig::default(),
            primorials: PrimorialCache::new(),
        }
    }
}
