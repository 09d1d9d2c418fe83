//! Labeled descriptor gallery with nearest-neighbour lookup.
//!
//! Entries keep insertion order so that lookups are deterministic: when two
//! candidates are exactly as close to a probe, the one added first wins.

use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::descriptor::{check_dim, Descriptor};
use crate::distance::distance;
use crate::error::{Error, Result};

/// How the descriptors stored under one label are scored against a probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// Every stored exemplar is a candidate on its own.
    #[default]
    #[serde(rename = "nearest")]
    NearestExemplar,
    /// A label scores the mean distance to all of its exemplars.
    #[serde(rename = "mean")]
    MeanDistance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDescriptor {
    label: String,
    descriptors: Vec<Descriptor>,
}

impl LabeledDescriptor {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    fn mean_distance(&self, probe: &Descriptor) -> Result<f32> {
        let mut total = 0.0f32;
        for descriptor in &self.descriptors {
            total += distance(descriptor, probe)?;
        }
        Ok(total / self.descriptors.len() as f32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Match { label: String, distance: f32 },
    NoMatch,
}

impl MatchResult {
    pub fn label(&self) -> Option<&str> {
        match self {
            MatchResult::Match { label, .. } => Some(label),
            MatchResult::NoMatch => None,
        }
    }

    pub fn distance(&self) -> Option<f32> {
        match self {
            MatchResult::Match { distance, .. } => Some(*distance),
            MatchResult::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match { .. })
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Match { label, distance } => write!(f, "{label} ({distance:.2})"),
            MatchResult::NoMatch => f.write_str("unknown"),
        }
    }
}

/// Append-only set of known faces.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<LabeledDescriptor>,
    dimension: Option<usize>,
    policy: MatchPolicy,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Descriptor length fixed by the first stored descriptor.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LabeledDescriptor] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&LabeledDescriptor> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Register `descriptor` under `label`.
    ///
    /// A label that already exists gains another exemplar. On error the
    /// gallery is left untouched.
    pub fn add_labeled(&mut self, label: impl Into<String>, descriptor: Descriptor) -> Result<()> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(Error::EmptyLabel);
        }
        if let Some(dim) = self.dimension {
            check_dim(dim, &descriptor)?;
        }

        self.dimension = Some(descriptor.dim());
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => {
                entry.descriptors.push(descriptor);
                debug!(
                    "Added exemplar to {:?} ({} total)",
                    entry.label,
                    entry.descriptors.len()
                );
            }
            None => {
                debug!("Added new label {:?}", label);
                self.entries.push(LabeledDescriptor {
                    label,
                    descriptors: vec![descriptor],
                });
            }
        }
        Ok(())
    }

    /// Closest label to `probe`, or `NoMatch` if nothing is strictly closer
    /// than `threshold`.
    pub fn find_best_match(&self, probe: &Descriptor, threshold: f32) -> Result<MatchResult> {
        let Some(dim) = self.dimension else {
            return Ok(MatchResult::NoMatch);
        };
        check_dim(dim, probe)?;

        let mut best: Option<(&str, f32)> = None;
        for entry in &self.entries {
            match self.policy {
                MatchPolicy::NearestExemplar => {
                    for descriptor in &entry.descriptors {
                        keep_closest(&mut best, &entry.label, distance(descriptor, probe)?);
                    }
                }
                MatchPolicy::MeanDistance => {
                    keep_closest(&mut best, &entry.label, entry.mean_distance(probe)?)
                }
            }
        }

        Ok(match best {
            Some((label, distance)) if distance < threshold => MatchResult::Match {
                label: label.to_string(),
                distance,
            },
            _ => MatchResult::NoMatch,
        })
    }

    /// Look up every face of a frame, in order.
    pub fn recognize_all(&self, probes: &[Descriptor], threshold: f32) -> Result<Vec<MatchResult>> {
        probes
            .iter()
            .map(|probe| self.find_best_match(probe, threshold))
            .collect()
    }
}

/// Strict comparison keeps the earliest candidate on ties.
fn keep_closest<'a>(best: &mut Option<(&'a str, f32)>, label: &'a str, d: f32) {
    trace!("{:?}: distance {:.4}", label, d);
    if best.map_or(true, |(_, best_d)| d < best_d) {
        *best = Some((label, d));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn desc(values: &[f32]) -> Descriptor {
        Descriptor::new(values.to_vec()).unwrap()
    }

    /// Three labels at distances 0.3, 0.2 and 0.5 from the origin.
    fn three_people() -> Gallery {
        let mut gallery = Gallery::new();
        gallery.add_labeled("alice", desc(&[0.3, 0.0])).unwrap();
        gallery.add_labeled("bob", desc(&[0.0, 0.2])).unwrap();
        gallery.add_labeled("carol", desc(&[-0.5, 0.0])).unwrap();
        gallery
    }

    #[test]
    fn test_empty_gallery_yields_no_match() {
        let gallery = Gallery::new();
        assert_eq!(
            gallery.find_best_match(&desc(&[0.0; 128]), 0.6),
            Ok(MatchResult::NoMatch)
        );
    }

    #[test]
    fn test_best_match_is_global_minimum() {
        let gallery = three_people();
        let result = gallery.find_best_match(&desc(&[0.0, 0.0]), 0.6).unwrap();
        assert_eq!(result.label(), Some("bob"));
        assert_relative_eq!(result.distance().unwrap(), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_tight_threshold_yields_no_match() {
        let gallery = three_people();
        assert_eq!(
            gallery.find_best_match(&desc(&[0.0, 0.0]), 0.1),
            Ok(MatchResult::NoMatch)
        );
    }

    #[test]
    fn test_distance_equal_to_threshold_is_no_match() {
        let mut gallery = Gallery::new();
        gallery.add_labeled("alice", desc(&[0.5])).unwrap();
        assert_eq!(
            gallery.find_best_match(&desc(&[0.0]), 0.5),
            Ok(MatchResult::NoMatch)
        );
    }

    #[test]
    fn test_tie_goes_to_first_inserted() {
        let mut gallery = Gallery::new();
        gallery.add_labeled("first", desc(&[0.25, 0.0])).unwrap();
        gallery.add_labeled("second", desc(&[-0.25, 0.0])).unwrap();
        let result = gallery.find_best_match(&desc(&[0.0, 0.0]), 0.6).unwrap();
        assert_eq!(result.label(), Some("first"));
    }

    #[test]
    fn test_same_label_accumulates_exemplars() {
        let mut gallery = Gallery::new();
        gallery.add_labeled("alice", desc(&[0.9, 0.0])).unwrap();
        gallery.add_labeled("bob", desc(&[0.0, 0.5])).unwrap();
        gallery.add_labeled("alice", desc(&[0.1, 0.0])).unwrap();

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.labels().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(gallery.get("alice").unwrap().descriptors().len(), 2);

        let result = gallery.find_best_match(&desc(&[0.0, 0.0]), 0.6).unwrap();
        assert_eq!(result.label(), Some("alice"));
    }

    #[rstest]
    #[case::empty("")]
    #[case::spaces("   ")]
    #[case::tab("\t")]
    fn test_blank_label_rejected(#[case] label: &str) {
        let mut gallery = Gallery::new();
        assert_eq!(
            gallery.add_labeled(label, desc(&[0.0, 0.0])),
            Err(Error::EmptyLabel)
        );
        assert!(gallery.is_empty());
        assert_eq!(gallery.dimension(), None);
    }

    #[test]
    fn test_mismatched_descriptor_leaves_gallery_unchanged() {
        let mut gallery = three_people();
        assert_eq!(
            gallery.add_labeled("alice", desc(&[0.0, 0.0, 0.0])),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(gallery.get("alice").unwrap().descriptors().len(), 1);
        assert_eq!(gallery.len(), 3);
    }

    #[test]
    fn test_probe_dimension_mismatch() {
        let gallery = three_people();
        assert_eq!(
            gallery.find_best_match(&desc(&[0.0]), 0.6),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_mean_distance_policy_averages_exemplars() {
        let mut nearest = Gallery::new();
        let mut mean = Gallery::with_policy(MatchPolicy::MeanDistance);
        for gallery in [&mut nearest, &mut mean] {
            // alice: one very close and one far exemplar (mean 0.5)
            gallery.add_labeled("alice", desc(&[0.1, 0.0])).unwrap();
            gallery.add_labeled("alice", desc(&[0.9, 0.0])).unwrap();
            gallery.add_labeled("bob", desc(&[0.0, 0.3])).unwrap();
        }

        let probe = desc(&[0.0, 0.0]);
        assert_eq!(
            nearest.find_best_match(&probe, 0.6).unwrap().label(),
            Some("alice")
        );
        let result = mean.find_best_match(&probe, 0.6).unwrap();
        assert_eq!(result.label(), Some("bob"));
        assert_relative_eq!(result.distance().unwrap(), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_recognize_all_keeps_face_order() {
        let gallery = three_people();
        let faces = vec![desc(&[-0.5, 0.05]), desc(&[5.0, 5.0]), desc(&[0.3, 0.0])];
        let results = gallery.recognize_all(&faces, 0.6).unwrap();
        let labels: Vec<_> = results.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec![Some("carol"), None, Some("alice")]);
    }

    #[test]
    fn test_display() {
        let hit = MatchResult::Match {
            label: "alice".into(),
            distance: 0.4213,
        };
        assert_eq!(hit.to_string(), "alice (0.42)");
        assert_eq!(MatchResult::NoMatch.to_string(), "unknown");
    }
}
