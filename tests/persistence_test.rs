//! Tests for outline persistence
//!
//! Keyed load/save through both store implementations, and the silent fallbacks
//! when storage misbehaves.

use std::io;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use coursetree::application::persistence::default_outline;
use coursetree::application::{OutlineRepository, StorageKey};
use coursetree::domain::{
    Attachment, EditorVariant, LessonDetails, LessonType, NodeType, Outline, TreePath,
};
use coursetree::infrastructure::traits::KeyValueStore;
use coursetree::infrastructure::{FileKeyValueStore, MemoryKeyValueStore};
use coursetree::util::testing::{init_test_setup, sample_curriculum};

/// Store whose every operation fails, like a full or disabled browser store.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> io::Result<Option<String>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "disabled"))
    }
    fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "quota exceeded"))
    }
    fn remove(&self, _key: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disabled"))
    }
    fn keys(&self) -> io::Result<Vec<String>> {
        Err(io::Error::new(io::ErrorKind::Other, "disabled"))
    }
}

fn edited_curriculum() -> Outline {
    let mut outline = sample_curriculum();
    outline.update_lesson(
        &"0.0.0.0".parse::<TreePath>().unwrap(),
        LessonDetails {
            duration: Some(30),
            content: Some("<p>Intro</p>".to_string()),
            lesson_type: Some(LessonType::FileBased),
            attachments: vec![Attachment {
                name: "slides".to_string(),
                url: "https://example.org/slides.pdf".to_string(),
            }],
        },
    );
    outline.duplicate(&"0.0".parse::<TreePath>().unwrap());
    outline
}

fn file_store(temp: &TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(FileKeyValueStore::new(temp.path().join("store")))
}

fn memory_store(_temp: &TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryKeyValueStore::new())
}

#[rstest]
#[case::file(file_store as fn(&TempDir) -> Arc<dyn KeyValueStore>)]
#[case::memory(memory_store as fn(&TempDir) -> Arc<dyn KeyValueStore>)]
fn given_saved_outline_when_loaded_then_deep_equal(
    #[case] make_store: fn(&TempDir) -> Arc<dyn KeyValueStore>,
) {
    init_test_setup();
    // Arrange
    let temp = TempDir::new().unwrap();
    let repo = OutlineRepository::new(make_store(&temp));
    let key = StorageKey::curriculum("c42");
    let outline = edited_curriculum();

    // Act
    assert!(repo.save(&key, &outline));
    let loaded = repo.load(&key);

    // Assert
    assert_eq!(loaded.to_nodes(), outline.to_nodes());
    assert_eq!(loaded.variant(), EditorVariant::Curriculum);
}

#[test]
fn given_nothing_stored_when_loaded_then_variant_default() {
    let repo = OutlineRepository::new(Arc::new(MemoryKeyValueStore::new()));

    let structure = repo.load(&StorageKey::structure("p1", None, None));
    let curriculum = repo.load(&StorageKey::curriculum("c1"));

    let titles: Vec<_> = structure.walk().map(|(_, _, n)| n.title.clone()).collect();
    assert_eq!(titles, vec!["Section 1", "Unit 1", "Module 1"]);
    assert!(curriculum.is_empty());
}

#[rstest]
#[case("not json at all")]
#[case("{\"id\": \"x\"}")]
#[case("[{\"id\": \"x\", \"title\": \"X\", \"type\": \"chapter\"}]")]
fn given_malformed_value_when_loaded_then_default_returned(#[case] raw: &str) {
    // Arrange
    let store = Arc::new(MemoryKeyValueStore::new());
    let key = StorageKey::structure("p1", Some("l1".into()), None);
    store.set(&key.to_string(), raw).unwrap();
    let repo = OutlineRepository::new(store);

    // Act
    let loaded = repo.load(&key);

    // Assert
    assert_eq!(loaded.len(), default_outline(EditorVariant::Structure).len());
}

#[test]
fn given_broken_store_when_loading_and_saving_then_degrades_silently() {
    let repo = OutlineRepository::new(Arc::new(BrokenStore));
    let key = StorageKey::curriculum("c1");

    assert!(repo.load(&key).is_empty());
    assert!(!repo.save(&key, &sample_curriculum()));
    assert!(repo.keys().is_err());
}

#[test]
fn given_stored_json_with_null_children_and_stale_types_when_loaded_then_normalised() {
    // Arrange
    let store = Arc::new(MemoryKeyValueStore::new());
    let key = StorageKey::curriculum("legacy");
    let raw = r#"[
        {"id": "a", "title": "A", "type": "lesson", "children": [
            {"id": "b", "title": "B", "type": "section", "children": null},
            {"id": "b", "title": "B again", "type": "unit"}
        ]}
    ]"#;
    store.set(&key.to_string(), raw).unwrap();
    let repo = OutlineRepository::new(store);

    // Act
    let loaded = repo.load(&key);

    // Assert
    let nodes = loaded.to_nodes();
    assert_eq!(nodes[0].node_type, NodeType::Section);
    assert_eq!(nodes[0].children[0].node_type, NodeType::Unit);
    let child_ids: Vec<&str> = nodes[0].children.iter().map(|c| c.id.as_str()).collect();
    assert_ne!(child_ids[0], child_ids[1]);
    assert!(child_ids.contains(&"b"));
}

#[test]
fn given_saved_outline_then_json_omits_empty_fields() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let repo = OutlineRepository::new(store.clone());
    let key = StorageKey::curriculum("c9");
    let outline = Outline::from_nodes(
        EditorVariant::Curriculum,
        vec![coursetree::util::testing::node("s", NodeType::Section)],
    )
    .unwrap();

    repo.save(&key, &outline);

    let raw = store.get("curriculum:c9").unwrap().unwrap();
    assert_eq!(raw, r#"[{"id":"s","title":"S","type":"section"}]"#);
}

#[test]
fn given_different_keys_when_saved_then_isolated_namespaces() {
    let temp = TempDir::new().unwrap();
    let repo = OutlineRepository::new(file_store(&temp));
    let a = StorageKey::structure("p1", Some("l1".into()), Some("x".into()));
    let b = StorageKey::structure("p1", Some("l2".into()), Some("x".into()));

    repo.save(&a, &Outline::new(EditorVariant::Structure));

    assert!(repo.load(&a).is_empty());
    assert_eq!(repo.load(&b).len(), 3);
    assert_eq!(repo.keys().unwrap(), vec![a.to_string()]);

    repo.remove(&a).unwrap();
    assert!(repo.keys().unwrap().is_empty());
}
