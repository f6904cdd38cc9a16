use crate::config::ConfigError;

/// Reasons a packing run stops before reaching its target count.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PackError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The attempt cap was reached without accepting another placement.
    #[error("packing infeasible: {placed} placed, {attempts} consecutive rejections")]
    Infeasible { placed: usize, attempts: u64 },
    #[error("packing cancelled")]
    Cancelled,
}
