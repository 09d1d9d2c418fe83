use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context, Result};
use facematch_engine::{group_all, Cluster, Descriptor, Gallery, MatchPolicy, MatchResult};

use crate::records::FaceRecord;

/// Enroll every record under its `source` as label.
pub fn build_gallery(records: &[FaceRecord], policy: MatchPolicy) -> Result<Gallery> {
    let mut gallery = Gallery::with_policy(policy);
    for record in records {
        gallery
            .add_labeled(record.source.as_str(), record.descriptor.clone())
            .with_context(|| format!("enrolling {:?}", record.source))?;
    }
    Ok(gallery)
}

pub fn group_records(records: Vec<FaceRecord>, threshold: f32) -> Result<Vec<Cluster<String>>> {
    let items = records.into_iter().map(|r| (r.source, r.descriptor));
    Ok(group_all(items, threshold)?)
}

/// Gallery shared between threads.
///
/// Enrollment takes the write lock so additions are applied one at a time in
/// a single order; lookups take the read lock and may run concurrently.
#[derive(Debug, Clone, Default)]
pub struct SharedGallery {
    inner: Arc<RwLock<Gallery>>,
}

impl SharedGallery {
    pub fn new(gallery: Gallery) -> Self {
        Self {
            inner: Arc::new(RwLock::new(gallery)),
        }
    }

    pub fn add_labeled(&self, label: &str, descriptor: Descriptor) -> Result<()> {
        let mut gallery = self
            .inner
            .write()
            .map_err(|e| anyhow!("gallery lock poisoned: {e}"))?;
        gallery.add_labeled(label, descriptor)?;
        Ok(())
    }

    pub fn find_best_match(&self, probe: &Descriptor, threshold: f32) -> Result<MatchResult> {
        let gallery = self
            .inner
            .read()
            .map_err(|e| anyhow!("gallery lock poisoned: {e}"))?;
        Ok(gallery.find_best_match(probe, threshold)?)
    }

    pub fn recognize_all(&self, probes: &[Descriptor], threshold: f32) -> Result<Vec<MatchResult>> {
        let gallery = self
            .inner
            .read()
            .map_err(|e| anyhow!("gallery lock poisoned: {e}"))?;
        Ok(gallery.recognize_all(probes, threshold)?)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current gallery contents.
    pub fn snapshot(&self) -> Result<Gallery> {
        self.inner
            .read()
            .map(|g| g.clone())
            .map_err(|e| anyhow!("gallery lock poisoned: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(values: &[f32]) -> Descriptor {
        Descriptor::new(values.to_vec()).unwrap()
    }

    fn record(source: &str, values: &[f32]) -> FaceRecord {
        FaceRecord {
            source: source.to_string(),
            descriptor: desc(values),
        }
    }

    #[test]
    fn test_build_gallery_merges_labels() {
        let records = vec![
            record("alice", &[0.0, 0.0]),
            record("bob", &[1.0, 0.0]),
            record("alice", &[0.1, 0.0]),
        ];
        let gallery = build_gallery(&records, MatchPolicy::NearestExemplar).unwrap();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.get("alice").unwrap().descriptors().len(), 2);
    }

    #[test]
    fn test_build_gallery_names_failing_record() {
        let records = vec![record("alice", &[0.0, 0.0]), record(" ", &[1.0, 0.0])];
        let err = build_gallery(&records, MatchPolicy::NearestExemplar).unwrap_err();
        assert!(format!("{err:#}").contains("enrolling \" \""));
    }

    #[test]
    fn test_group_records_keeps_sources() {
        let records = vec![
            record("a.jpg", &[0.0, 0.0]),
            record("b.jpg", &[2.0, 0.0]),
            record("c.jpg", &[0.2, 0.0]),
        ];
        let clusters = group_records(records, 0.6).unwrap();
        let sources: Vec<Vec<&str>> = clusters
            .iter()
            .map(|c| c.sources().map(String::as_str).collect())
            .collect();
        assert_eq!(sources, vec![vec!["a.jpg", "c.jpg"], vec!["b.jpg"]]);
    }

    #[test]
    fn test_shared_gallery_concurrent_lookups() {
        let shared = SharedGallery::default();
        shared.add_labeled("alice", desc(&[0.0, 0.0])).unwrap();
        shared.add_labeled("bob", desc(&[1.0, 0.0])).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let shared = shared.clone();
                    s.spawn(move || {
                        let probe = desc(&[(i % 2) as f32 * 0.95, 0.0]);
                        shared.find_best_match(&probe, 0.6).unwrap()
                    })
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                let expected = if i % 2 == 0 { "alice" } else { "bob" };
                assert_eq!(handle.join().unwrap().label(), Some(expected));
            }
        });
    }

    #[test]
    fn test_shared_gallery_concurrent_enrollment() {
        let shared = SharedGallery::default();
        std::thread::scope(|s| {
            for i in 0..16 {
                let shared = shared.clone();
                s.spawn(move || {
                    let label = format!("person-{}", i % 4);
                    shared.add_labeled(&label, desc(&[i as f32, 0.0])).unwrap();
                });
            }
        });

        let gallery = shared.snapshot().unwrap();
        assert_eq!(shared.len(), 4);
        let exemplars: usize = gallery.entries().iter().map(|e| e.descriptors().len()).sum();
        assert_eq!(exemplars, 16);
    }
}
