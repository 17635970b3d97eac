use reclaim::error::{ReclaimError, Result};
use reclaim::geo::GeoPoint;
use reclaim::storage::Storage;
use reclaim::storage::file::FileStorage;
use reclaim::vector::store::SnapshotFormat;
use reclaim::vector::{DuplicatePolicy, VectorStore, VectorStoreConfig};
use tempfile::TempDir;

fn populated_store() -> Result<VectorStore> {
    let store = VectorStore::new(VectorStoreConfig {
        text_dimension: Some(3),
        ..VectorStoreConfig::with_dimension(4)
    })?;
    let rows: [(&str, [f32; 4], &str); 4] = [
        ("umbrella-7", [0.9, 0.1, 0.0, 0.3], "umbrella"),
        ("wallet-2", [0.0, 2.0, 1.0, 0.0], "wallet"),
        ("keys-11", [0.1, 0.1, 0.1, 0.9], "keys"),
        ("wallet-2", [0.3, 0.3, 0.3, 0.3], "wallet"),
    ];
    for (i, (item_id, visual, category)) in rows.into_iter().enumerate() {
        store.add_item(
            item_id,
            visual.to_vec(),
            vec![0.6, 0.0, 0.8],
            GeoPoint::new(40.0 + i as f64 * 0.01, -74.0),
            category,
        )?;
    }
    Ok(store)
}

#[test]
fn file_snapshot_round_trip_preserves_ids_and_results() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let store = populated_store()?;

    for format in [SnapshotFormat::Json, SnapshotFormat::Bincode] {
        let storage = FileStorage::new(temp_dir.path().join(format!("{format:?}")))?;
        let saved = store.save(&storage, format)?;
        assert_eq!(saved.records.len(), 4);
        assert!(!storage.file_exists(&format!("{}.tmp", format.file_name())));

        let loaded = VectorStore::load(&storage, format, DuplicatePolicy::Allow)?;
        assert_eq!(loaded.len(), store.len());
        assert_eq!(loaded.text_dimension(), Some(3));
        assert_eq!(loaded.internal_ids_for("wallet-2"), vec![1, 3]);

        for query in [[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], [0.5, 0.5, 0.5, 0.5]] {
            assert_eq!(loaded.search_visual(&query, 4)?, store.search_visual(&query, 4)?);
        }
    }
    Ok(())
}

#[test]
fn reloaded_store_continues_id_sequence() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileStorage::new(temp_dir.path())?;
    populated_store()?.save(&storage, SnapshotFormat::Json)?;

    let loaded = VectorStore::load(&storage, SnapshotFormat::Json, DuplicatePolicy::Allow)?;
    let next = loaded.add_item(
        "bag-1",
        vec![0.0, 0.0, 1.0, 0.0],
        vec![1.0, 0.0, 0.0],
        GeoPoint::new(0.0, 0.0),
        "bag",
    )?;
    assert_eq!(next, 4);
    Ok(())
}

#[test]
fn corrupt_snapshot_file_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileStorage::new(temp_dir.path())?;
    populated_store()?.save(&storage, SnapshotFormat::Json)?;

    let path = temp_dir.path().join(SnapshotFormat::Json.file_name());
    let text = std::fs::read_to_string(&path)?;
    std::fs::write(&path, text.replacen("umbrella-7", "umbrella-8", 1))?;

    assert!(matches!(
        VectorStore::load(&storage, SnapshotFormat::Json, DuplicatePolicy::Allow),
        Err(ReclaimError::Snapshot(_))
    ));
    Ok(())
}

#[test]
fn missing_snapshot_is_not_found() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileStorage::new(temp_dir.path())?;
    assert_eq!(SnapshotFormat::detect(&storage), None);
    assert!(matches!(
        VectorStore::load(&storage, SnapshotFormat::Bincode, DuplicatePolicy::Allow),
        Err(ReclaimError::NotFound(_))
    ));
    Ok(())
}
