//! Engine configuration types.

/// Configuration for the resolver and the grounder
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum SLD resolution depth; 0 means no limit
    pub resolver_max_depth: usize,
    /// Maximum instantiations emitted for a single schema; 0 means no limit
    pub max_groundings_per_schema: usize,
    /// Expand quantifiers over typed objects before calling the resolver;
    /// when false, quantified goals are left to the resolver's rewrites
    pub dequantify_eagerly: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            resolver_max_depth: 10_000,
            max_groundings_per_schema: 0,
            dequantify_eagerly: true,
        }
    }
}
