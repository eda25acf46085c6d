pub mod anchoring;
pub mod workspace;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use anchoring::*;
pub use workspace::*;
