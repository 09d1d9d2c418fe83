pub mod config;
pub mod matcher;
pub mod records;

// Re-export engine types for convenience
pub use facematch_engine::{
    cluster, distance, gallery, group_all, verify, Cluster, Descriptor, Gallery, MatchPolicy,
    MatchResult, Verification, Verifier,
};
