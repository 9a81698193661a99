use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use playlist_etl::{
    BatchStage, BlobStore, EtlError, Extractor, LocalBlobStore, MemoryBlobStore, PlaylistSource,
    Result, Transformer,
};
use serde_json::{json, Value};

const PENDING: &str = "raw_data/to_be_processed/";

fn item(song: &str, album: &str, album_artist: &str, track_artists: &[&str]) -> Value {
    let artist = |id: &str| json!({"id": id, "name": format!("Artist {id}"), "href": format!("h/{id}")});
    json!({
        "added_at": "2024-03-01T12:30:00Z",
        "track": {
            "id": song,
            "name": format!("Song {song}"),
            "duration_ms": 215000,
            "popularity": 77,
            "external_urls": {"spotify": format!("https://open.spotify.com/track/{song}")},
            "album": {
                "id": album,
                "name": format!("Album {album}"),
                "release_date": "2023-11-17",
                "total_tracks": 11,
                "external_urls": {"spotify": format!("https://open.spotify.com/album/{album}")},
                "artists": [artist(album_artist)]
            },
            "artists": track_artists.iter().map(|&id| artist(id)).collect::<Vec<_>>()
        }
    })
}

fn batch(items: Vec<Value>) -> Bytes {
    Bytes::from(serde_json::to_vec(&json!({ "items": items })).unwrap())
}

fn sample_batch() -> Bytes {
    batch(vec![
        item("s1", "a1", "ar1", &["ar1", "ar2"]),
        item("s2", "a1", "ar1", &["ar1"]),
        item("s3", "a2", "ar2", &["ar2", "ar3"]),
    ])
}

fn read_csv(body: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_reader(body);
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_malformed_object_is_isolated() {
    let store = MemoryBlobStore::new();
    store.put("raw_data/to_be_processed/1.json", sample_batch()).await.unwrap();
    store
        .put("raw_data/to_be_processed/2.json", Bytes::from_static(b"{\"items\": [oops"))
        .await
        .unwrap();
    store.put("raw_data/to_be_processed/3.json", sample_batch()).await.unwrap();

    let result = Transformer::new(Arc::new(store.clone())).run().await.unwrap();

    assert_eq!(result.processed.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].key, "raw_data/to_be_processed/2.json");
    assert!(matches!(result.failed[0].error, EtlError::MalformedBatch { .. }));

    assert_eq!(
        store.list("raw_data/processed/").await.unwrap(),
        ["raw_data/processed/1.json", "raw_data/processed/3.json"]
    );
    assert_eq!(store.list(PENDING).await.unwrap(), ["raw_data/to_be_processed/2.json"]);
    assert_eq!(store.list("transformed_data/").await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let store = MemoryBlobStore::new();
    store.put("raw_data/to_be_processed/1.json", sample_batch()).await.unwrap();
    let transformer = Transformer::new(Arc::new(store.clone()));

    let first = transformer.run().await.unwrap();
    assert_eq!(first.processed.len(), 1);
    let objects = store.len().await;

    let second = transformer.run().await.unwrap();
    assert_eq!(second.total(), 0);
    assert_eq!(store.len().await, objects);
}

#[tokio::test]
async fn test_tables_are_unique_and_consistent() {
    let store = MemoryBlobStore::new();
    store.put("raw_data/to_be_processed/1.json", sample_batch()).await.unwrap();

    let result = Transformer::new(Arc::new(store.clone())).run().await.unwrap();
    let processed = &result.processed[0];
    assert_eq!((processed.albums, processed.artists, processed.songs), (2, 3, 3));
    assert_eq!(processed.dangling_refs, 0);

    let (headers, albums) = read_csv(&store.get(&processed.album_key).await.unwrap());
    assert_eq!(headers, ["album_id", "name", "release_date", "total_tracks", "url"]);
    let album_ids: HashSet<_> = albums.iter().map(|r| r[0].clone()).collect();
    assert_eq!(album_ids.len(), albums.len());

    let (_, artists) = read_csv(&store.get(&processed.artist_key).await.unwrap());
    let artist_ids: Vec<_> = artists.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(artist_ids, ["ar1", "ar2", "ar3"]);

    let (headers, songs) = read_csv(&store.get(&processed.song_key).await.unwrap());
    assert_eq!(headers[6..], ["album_id", "artist_id"]);
    for song in &songs {
        assert!(album_ids.contains(&song[6]));
        assert!(artist_ids.contains(&song[7].as_str()));
        assert_eq!(song[5], "2024-03-01T12:30:00Z");
    }
}

/// Store whose deletes always fail, to exercise the copy-then-delete gap.
struct NoDeleteStore(MemoryBlobStore);

#[async_trait]
impl BlobStore for NoDeleteStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.0.list(prefix).await
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        self.0.get(key).await
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<()> {
        self.0.put(key, body).await
    }

    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<()> {
        self.0.copy(source_key, dest_key).await
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(EtlError::Storage("access denied".to_string()))
    }
}

#[tokio::test]
async fn test_failed_delete_is_partial_archive() {
    let inner = MemoryBlobStore::new();
    inner.put("raw_data/to_be_processed/1.json", sample_batch()).await.unwrap();

    let result = Transformer::new(Arc::new(NoDeleteStore(inner.clone())))
        .run()
        .await
        .unwrap();

    assert_eq!(result.failed.len(), 1);
    let failed = &result.failed[0];
    assert_eq!(failed.stage, BatchStage::Written);
    assert!(matches!(failed.error, EtlError::PartialArchive { .. }));

    // The object now exists in both areas and the tables were written.
    assert!(inner.contains("raw_data/to_be_processed/1.json").await);
    assert!(inner.contains("raw_data/processed/1.json").await);
    assert_eq!(inner.list("transformed_data/").await.unwrap().len(), 3);
}

/// Playlist source serving a fixed item list.
struct FixedSource(Vec<Value>);

#[async_trait]
impl PlaylistSource for FixedSource {
    async fn fetch_playlist_items(&self, _playlist_id: &str) -> Result<Vec<Value>> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_extract_then_transform_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalBlobStore::new(dir.path()));

    let source = FixedSource(vec![
        item("s1", "a1", "ar1", &["ar1"]),
        json!({"added_at": "2024-03-01T12:30:00Z", "track": null}),
        item("s2", "a2", "ar2", &["ar2"]),
    ]);
    let extracted = Extractor::new(Arc::new(source), store.clone())
        .run("https://open.spotify.com/playlist/abc?si=123")
        .await
        .unwrap();
    assert_eq!(extracted.item_count, 3);

    let result = Transformer::new(store.clone()).run().await.unwrap();
    assert!(result.all_successful());
    assert_eq!(result.processed[0].songs, 2);

    let archived = extracted.key.replace("to_be_processed", "processed");
    assert!(dir.path().join(&archived).exists());
    assert!(!dir.path().join(&extracted.key).exists());
    assert_eq!(store.list("transformed_data/songs_data/").await.unwrap().len(), 1);
}
