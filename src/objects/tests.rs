//! Object Store Tests
//!
//! ## Test Scopes
//! - **Range arithmetic**: Overwrites, appends, zero-filled gaps and truncation.
//! - **Bounded reads**: Clipping at the object end and out-of-range offsets.
//! - **Rename/Create/Delete**: Missing sources and occupied targets.
//! - **Locking**: Same-object sequences serialize; distinct objects do not block each other.

#[cfg(test)]
mod tests {
    use crate::containers::types::ContainerId;
    use crate::errors::ErrorCode;
    use crate::objects::locks::ObjectLocks;
    use crate::objects::memory::MemoryObjectStore;
    use crate::objects::store::ObjectStore;
    use crate::objects::types::{RangeWrite, StoreError};
    use std::sync::Arc;
    use std::time::Duration;

    fn container() -> ContainerId {
        ContainerId::new("alice", "docs")
    }

    async fn store_with(key: &str, data: &[u8]) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        store
            .create(&container(), key, "text/plain", data)
            .await
            .unwrap();
        store
    }

    fn content(store: &MemoryObjectStore, key: &str) -> Vec<u8> {
        store.get_local(&container(), key).unwrap().data
    }

    // ============================================================
    // RANGE WRITE
    // ============================================================

    #[tokio::test]
    async fn test_write_range_overwrites_in_place() {
        let store = store_with("a.txt", b"XY").await;

        store
            .write_range(&container(), "a.txt", &RangeWrite::new(0, b"AB".to_vec()))
            .await
            .unwrap();

        assert_eq!(content(&store, "a.txt"), b"AB");
    }

    #[tokio::test]
    async fn test_write_range_grows_object() {
        let store = store_with("a.txt", b"HELLO").await;

        store
            .write_range(&container(), "a.txt", &RangeWrite::new(3, b"PING".to_vec()))
            .await
            .unwrap();

        assert_eq!(content(&store, "a.txt"), b"HELPING");
    }

    #[tokio::test]
    async fn test_write_range_zero_fills_gap() {
        let store = store_with("a.txt", b"HELLO").await;

        store
            .write_range(&container(), "a.txt", &RangeWrite::new(10, b"Z".to_vec()))
            .await
            .unwrap();

        let data = content(&store, "a.txt");
        assert_eq!(data.len(), 11);
        assert_eq!(&data[..5], b"HELLO");
        assert!(data[5..10].iter().all(|b| *b == 0));
        assert_eq!(data[10], b'Z');

        let slice = store.read(&container(), "a.txt", 10, 1).await.unwrap();
        assert_eq!(slice.data, b"Z");
    }

    #[tokio::test]
    async fn test_write_range_with_truncation_restores_length() {
        let store = store_with("a.txt", b"HELLO").await;
        store
            .write_range(&container(), "a.txt", &RangeWrite::new(3, b"PING".to_vec()))
            .await
            .unwrap();

        let restore = RangeWrite {
            offset: 3,
            data: b"LO\0\0".to_vec(),
            truncate_to: Some(5),
        };
        store.write_range(&container(), "a.txt", &restore).await.unwrap();

        assert_eq!(content(&store, "a.txt"), b"HELLO");
    }

    #[tokio::test]
    async fn test_write_range_missing_object() {
        let store = MemoryObjectStore::new();

        let err = store
            .write_range(&container(), "nope", &RangeWrite::new(0, b"A".to_vec()))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_write_range_beyond_max_length_is_storage_failure() {
        let store = MemoryObjectStore::with_max_object_len(16);
        store
            .create(&container(), "a.txt", "text/plain", b"abc")
            .await
            .unwrap();

        let err = store
            .write_range(&container(), "a.txt", &RangeWrite::new(u64::MAX, b"A".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageFailure);

        let err = store
            .write_range(&container(), "a.txt", &RangeWrite::new(10, vec![1; 10]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageFailure);
        assert_eq!(content(&store, "a.txt"), b"abc");
    }

    // ============================================================
    // READ
    // ============================================================

    #[tokio::test]
    async fn test_read_is_clipped_to_object_end() {
        let store = store_with("a.txt", b"HELLO").await;

        let slice = store.read(&container(), "a.txt", 3, 10).await.unwrap();

        assert_eq!(slice.data, b"LO");
        assert_eq!(slice.object_len, 5);
        assert_eq!(slice.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_read_at_end_is_empty() {
        let store = store_with("a.txt", b"HELLO").await;

        let slice = store.read(&container(), "a.txt", 5, 3).await.unwrap();
        assert!(slice.data.is_empty());
    }

    #[tokio::test]
    async fn test_read_past_end_is_out_of_range() {
        let store = store_with("a.txt", b"HELLO").await;

        let err = store.read(&container(), "a.txt", 10, 1).await.unwrap_err();

        assert_eq!(
            err,
            StoreError::OutOfRange {
                key: "a.txt".to_string(),
                offset: 10,
                object_len: 5,
            }
        );
        assert_eq!(err.code(), ErrorCode::OutOfRange);
    }

    #[tokio::test]
    async fn test_read_missing_object() {
        let store = MemoryObjectStore::new();
        let err = store.read(&container(), "a.txt", 0, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    // ============================================================
    // RENAME / CREATE / DELETE
    // ============================================================

    #[tokio::test]
    async fn test_rename_moves_object() {
        let store = store_with("k1", b"data").await;

        store.rename(&container(), "k1", "k2").await.unwrap();

        assert!(!store.exists(&container(), "k1").await.unwrap());
        assert_eq!(content(&store, "k2"), b"data");
    }

    #[tokio::test]
    async fn test_rename_missing_source() {
        let store = store_with("k1", b"data").await;

        let err = store.rename(&container(), "k9", "k2").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_rename_onto_existing_target() {
        let store = store_with("k1", b"one").await;
        store
            .create(&container(), "k2", "text/plain", b"two")
            .await
            .unwrap();

        let err = store.rename(&container(), "k1", "k2").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(content(&store, "k1"), b"one");
        assert_eq!(content(&store, "k2"), b"two");
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let store = store_with("k1", b"one").await;

        let err = store
            .create(&container(), "k1", "text/plain", b"again")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_delete_and_stats() {
        let store = store_with("k1", b"one").await;
        store
            .create(&container(), "k2", "text/plain", b"three")
            .await
            .unwrap();

        let stats = store.stats(&container()).await.unwrap();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.total_bytes, 8);

        store.delete(&container(), "k1").await.unwrap();
        assert_eq!(store.keys(&container()), vec!["k2".to_string()]);
        assert!(store.delete(&container(), "k1").await.is_err());

        store.drop_container(&container()).await.unwrap();
        assert_eq!(store.stats(&container()).await.unwrap().object_count, 0);
    }

    // ============================================================
    // LOCKS
    // ============================================================

    #[tokio::test]
    async fn test_same_object_lock_serializes() {
        let locks = Arc::new(ObjectLocks::new());
        let guard = locks.lock(&container(), &["k1"]).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&container(), &["k1"]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_objects_do_not_block() {
        let locks = ObjectLocks::new();
        let _first = locks.lock(&container(), &["k1"]).await;

        let second = tokio::time::timeout(
            Duration::from_secs(1),
            locks.lock(&container(), &["k2", "k3"]),
        )
        .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_keys_lock_once() {
        let locks = ObjectLocks::new();

        let guard = tokio::time::timeout(
            Duration::from_secs(1),
            locks.lock(&container(), &["k1", "k1"]),
        )
        .await;

        assert!(guard.is_ok());
    }
}
