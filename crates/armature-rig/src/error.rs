use thiserror::Error;

/// Top-level error type for the Armature crates.
#[derive(Debug, Error)]
pub enum ArmatureError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid max_iterations: {0} (must be > 0)")]
    InvalidMaxIterations(u32),

    #[error("Invalid tolerance: {0} (must be finite and > 0)")]
    InvalidTolerance(f32),

    #[error("Unknown solver algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Chain-tree construction errors.
///
/// These are recoverable: a caller can fix the subtree selection or the rig
/// and retry solver construction.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Subtree selection is disconnected: {reached} of {selected} bones reachable from the root")]
    Disconnected { selected: usize, reached: usize },

    #[error("Leaf chain tip bone '{0}' carries no effector")]
    LeafMissingEffector(String),
}
