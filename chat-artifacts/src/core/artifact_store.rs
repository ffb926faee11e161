use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::models::{Artifact, ArtifactStats, ChatError, ChatResult};

/// Artifacts by id, plus a per-session index in insertion order
///
/// Both maps are sharded, so puts for different sessions do not serialize.
/// An artifact is inserted before its id is indexed; readers of the index
/// therefore never see an id that cannot be resolved.
#[derive(Clone, Default)]
pub struct ArtifactStore {
    inner: Arc<ArtifactStoreInner>,
}

#[derive(Default)]
struct ArtifactStoreInner {
    artifacts: DashMap<String, Artifact>,
    by_session: DashMap<String, Vec<String>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, artifact: Artifact) {
        let id = artifact.id.clone();
        let session_id = artifact.session_id.clone();

        if self.inner.artifacts.insert(id.clone(), artifact).is_some() {
            debug!("Replaced artifact {}", id);
            return;
        }

        self.inner.by_session.entry(session_id).or_default().push(id.clone());
        debug!("Stored artifact {}", id);
    }

    pub fn get(&self, artifact_id: &str) -> ChatResult<Artifact> {
        self.inner
            .artifacts
            .get(artifact_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ChatError::ArtifactNotFound(artifact_id.to_string()))
    }

    pub fn contains(&self, artifact_id: &str) -> bool {
        self.inner.artifacts.contains_key(artifact_id)
    }

    /// Artifacts of a session in the order they were stored
    pub fn list_by_session(&self, session_id: &str) -> Vec<Artifact> {
        let ids = match self.inner.by_session.get(session_id) {
            Some(ids) => ids.value().clone(),
            None => return Vec::new(),
        };

        ids.iter()
            .filter_map(|id| self.inner.artifacts.get(id).map(|entry| entry.value().clone()))
            .collect()
    }

    pub fn list_by_message(&self, session_id: &str, message_id: &str) -> Vec<Artifact> {
        self.list_by_session(session_id)
            .into_iter()
            .filter(|artifact| artifact.message_id == message_id)
            .collect()
    }

    pub fn delete(&self, artifact_id: &str) -> bool {
        let Some((_, artifact)) = self.inner.artifacts.remove(artifact_id) else {
            return false;
        };

        if let Some(mut ids) = self.inner.by_session.get_mut(&artifact.session_id) {
            ids.retain(|id| id != artifact_id);
        }
        self.inner
            .by_session
            .remove_if(&artifact.session_id, |_, ids| ids.is_empty());
        true
    }

    /// Remove every artifact of a session; returns how many were dropped
    pub fn remove_session(&self, session_id: &str) -> usize {
        let Some((_, ids)) = self.inner.by_session.remove(session_id) else {
            return 0;
        };

        let removed = ids
            .iter()
            .filter(|id| self.inner.artifacts.remove(id.as_str()).is_some())
            .count();
        debug!("Removed {} artifacts of session {}", removed, session_id);
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.artifacts.is_empty()
    }

    pub fn stats(&self) -> ArtifactStats {
        let artifacts: Vec<Artifact> = self
            .inner
            .artifacts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        summarize(&artifacts)
    }

    pub fn stats_for_session(&self, session_id: &str) -> ArtifactStats {
        summarize(&self.list_by_session(session_id))
    }
}

fn summarize(artifacts: &[Artifact]) -> ArtifactStats {
    let mut by_type = BTreeMap::new();
    let mut by_language = BTreeMap::new();

    for artifact in artifacts {
        *by_type.entry(artifact.kind.to_string()).or_insert(0) += 1;
        *by_language.entry(artifact.language.clone()).or_insert(0) += 1;
    }

    ArtifactStats {
        total_artifacts: artifacts.len(),
        by_type,
        by_language,
        runnable_count: artifacts.iter().filter(|a| a.is_runnable).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtifactKind, ArtifactMetadata, Provenance};
    use chrono::Utc;

    fn artifact(id: &str, session_id: &str, message_id: &str, kind: ArtifactKind) -> Artifact {
        Artifact {
            id: id.to_string(),
            title: format!("{id} title"),
            description: String::new(),
            kind,
            language: kind.as_str().to_string(),
            content: "x".to_string(),
            session_id: session_id.to_string(),
            message_id: message_id.to_string(),
            created_at: Utc::now(),
            is_runnable: kind.is_runnable(),
            metadata: ArtifactMetadata {
                lines_of_code: 1,
                character_count: 1,
                provenance: Provenance::Extracted,
                imports: Vec::new(),
                functions: Vec::new(),
                appears_complete: false,
            },
        }
    }

    #[test]
    fn test_put_and_get() {
        let store = ArtifactStore::new();
        store.put(artifact("a1", "s1", "m1", ArtifactKind::Python));

        assert_eq!(store.get("a1").unwrap().title, "a1 title");
        assert!(matches!(store.get("zz"), Err(ChatError::ArtifactNotFound(_))));
    }

    #[test]
    fn test_list_by_session_keeps_insertion_order() {
        let store = ArtifactStore::new();
        store.put(artifact("c", "s1", "m1", ArtifactKind::Css));
        store.put(artifact("a", "s1", "m1", ArtifactKind::Html));
        store.put(artifact("x", "s2", "m9", ArtifactKind::Json));
        store.put(artifact("b", "s1", "m2", ArtifactKind::Python));

        let ids: Vec<_> = store.list_by_session("s1").into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        let ids: Vec<_> = store
            .list_by_message("s1", "m1")
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert!(store.list_by_session("nope").is_empty());
    }

    #[test]
    fn test_reput_does_not_duplicate_index() {
        let store = ArtifactStore::new();
        store.put(artifact("a", "s1", "m1", ArtifactKind::Css));
        store.put(artifact("a", "s1", "m1", ArtifactKind::Css));
        assert_eq!(store.list_by_session("s1").len(), 1);
    }

    #[test]
    fn test_delete_and_remove_session() {
        let store = ArtifactStore::new();
        store.put(artifact("a", "s1", "m1", ArtifactKind::Css));
        store.put(artifact("b", "s1", "m1", ArtifactKind::Css));
        store.put(artifact("c", "s2", "m2", ArtifactKind::Css));

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert_eq!(store.list_by_session("s1").len(), 1);

        assert_eq!(store.remove_session("s1"), 1);
        assert_eq!(store.remove_session("s1"), 0);
        assert_eq!(store.len(), 1);
        assert!(store.contains("c"));
    }

    #[test]
    fn test_stats() {
        let store = ArtifactStore::new();
        store.put(artifact("a", "s1", "m1", ArtifactKind::Html));
        store.put(artifact("b", "s1", "m1", ArtifactKind::Python));
        store.put(artifact("c", "s1", "m2", ArtifactKind::Python));
        store.put(artifact("d", "s2", "m3", ArtifactKind::Css));

        let stats = store.stats_for_session("s1");
        assert_eq!(stats.total_artifacts, 3);
        assert_eq!(stats.by_type.get("python"), Some(&2));
        assert_eq!(stats.by_language.get("html"), Some(&1));
        assert_eq!(stats.runnable_count, 1);

        assert_eq!(store.stats().total_artifacts, 4);
        assert_eq!(store.stats().runnable_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_puts() {
        let store = ArtifactStore::new();
        let mut handles = Vec::new();

        for task in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    let session = format!("s{}", task % 2);
                    store.put(artifact(&format!("{task}-{i}"), &session, "m", ArtifactKind::Code));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 400);
        assert_eq!(store.list_by_session("s0").len(), 200);
        assert_eq!(store.list_by_session("s1").len(), 200);

        let first_task: Vec<_> = store
            .list_by_session("s0")
            .into_iter()
            .filter(|a| a.id.starts_with("0-"))
            .map(|a| a.id)
            .collect();
        let expected: Vec<_> = (0..50).map(|i| format!("0-{i}")).collect();
        assert_eq!(first_task, expected);
    }
}
