pub mod cluster;
pub mod descriptor;
pub mod distance;
pub mod error;
pub mod gallery;
pub mod verify;

// Re-export commonly used types
pub use cluster::{group_all, Cluster, Clusterer, Member};
pub use descriptor::Descriptor;
pub use distance::{distance, match_percent, similarity_percent};
pub use error::{Error, Result};
pub use gallery::{Gallery, LabeledDescriptor, MatchPolicy, MatchResult};
pub use verify::{verify, Verification, Verifier};
