//! Pairing of a produced value with the parameters used to produce it

use crate::params::CacheParameters;

/// A freshly built object together with the parameters it was built for
#[derive(Debug, Clone)]
pub struct CacheableObject<T> {
    pub object: T,
    pub cache_parameters: CacheParameters,
}

impl<T> CacheableObject<T> {
    pub fn new(object: T, cache_parameters: CacheParameters) -> Self {
        Self {
            object,
            cache_parameters,
        }
    }

    pub fn into_object(self) -> T {
        self.object
    }
}
