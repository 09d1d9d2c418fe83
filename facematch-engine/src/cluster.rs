//! Greedy single-pass grouping of descriptors by identity.
//!
//! Each incoming descriptor is compared only against the first member of
//! every existing cluster, in creation order, and joins the first cluster
//! whose representative is strictly closer than the threshold. Grouping is
//! therefore order dependent and not transitive: two members of one cluster
//! may be farther apart than the threshold.

use log::{debug, trace};
use serde::Serialize;

use crate::descriptor::{check_dim, Descriptor};
use crate::distance::distance;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member<S> {
    pub source: S,
    pub descriptor: Descriptor,
}

/// Non-empty group of members; the first one is the representative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster<S> {
    members: Vec<Member<S>>,
}

impl<S> Cluster<S> {
    fn seeded(source: S, descriptor: Descriptor) -> Self {
        Self {
            members: vec![Member { source, descriptor }],
        }
    }

    pub fn representative(&self) -> &Member<S> {
        &self.members[0]
    }

    /// Members in the order they were accepted.
    pub fn members(&self) -> &[Member<S>] {
        &self.members
    }

    pub fn sources(&self) -> impl Iterator<Item = &S> {
        self.members.iter().map(|m| &m.source)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Incremental form of [`group_all`].
#[derive(Debug, Clone)]
pub struct Clusterer<S> {
    threshold: f32,
    dimension: Option<usize>,
    clusters: Vec<Cluster<S>>,
}

impl<S> Clusterer<S> {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            dimension: None,
            clusters: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Add one descriptor and return the index of the cluster that took it.
    ///
    /// Fails without modifying any cluster if the descriptor length differs
    /// from the first descriptor ever pushed.
    pub fn push(&mut self, source: S, descriptor: Descriptor) -> Result<usize> {
        if let Some(dim) = self.dimension {
            check_dim(dim, &descriptor)?;
        }
        self.dimension = Some(descriptor.dim());

        for (index, cluster) in self.clusters.iter_mut().enumerate() {
            let d = distance(&cluster.representative().descriptor, &descriptor)?;
            trace!("cluster {}: distance {:.4}", index, d);
            if d < self.threshold {
                cluster.members.push(Member { source, descriptor });
                return Ok(index);
            }
        }

        self.clusters.push(Cluster::seeded(source, descriptor));
        let index = self.clusters.len() - 1;
        debug!("Started cluster {}", index);
        Ok(index)
    }

    /// Clusters in creation order.
    pub fn clusters(&self) -> &[Cluster<S>] {
        &self.clusters
    }

    pub fn into_clusters(self) -> Vec<Cluster<S>> {
        self.clusters
    }
}

/// Partition `items` into clusters of the same identity.
///
/// Either every item is placed or an error is returned; no partial result.
pub fn group_all<S, I>(items: I, threshold: f32) -> Result<Vec<Cluster<S>>>
where
    I: IntoIterator<Item = (S, Descriptor)>,
{
    let mut clusterer = Clusterer::new(threshold);
    for (source, descriptor) in items {
        clusterer.push(source, descriptor)?;
    }
    let clusters = clusterer.into_clusters();
    debug!("Grouped faces into {} cluster(s)", clusters.len());
    Ok(clusters)
}
