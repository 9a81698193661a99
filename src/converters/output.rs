//! CSV serialization of entity tables.

use csv::WriterBuilder;
use serde::Serialize;

use crate::error::{EtlError, Result};

/// Serialize rows to CSV text.
///
/// The header row is always written, so an empty table still produces a
/// valid file with its column names. No index column is added.
pub fn to_csv<T: Serialize>(columns: &[&str], rows: &[T]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EtlError::Storage(format!("CSV is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::parse_added_at;
    use crate::models::{AlbumRow, ArtistRow, SongRow};
    use chrono::NaiveDate;

    #[test]
    fn test_album_csv() {
        let rows = vec![AlbumRow {
            album_id: "a1".to_string(),
            name: "Album1".to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total_tracks: 10,
            url: "au1".to_string(),
        }];
        let csv = to_csv(&AlbumRow::COLUMNS, &rows).unwrap();
        assert_eq!(
            csv,
            "album_id,name,release_date,total_tracks,url\na1,Album1,2024-01-01,10,au1\n"
        );
    }

    #[test]
    fn test_song_csv() {
        let rows = vec![SongRow {
            song_id: "s1".to_string(),
            song_name: "Song1".to_string(),
            duration_ms: 200000,
            url: "u1".to_string(),
            popularity: 50,
            song_added: parse_added_at("2024-01-01T00:00:00Z").unwrap(),
            album_id: "a1".to_string(),
            artist_id: "ar1".to_string(),
        }];
        let csv = to_csv(&SongRow::COLUMNS, &rows).unwrap();
        assert_eq!(
            csv,
            "song_id,song_name,duration_ms,url,popularity,song_added,album_id,artist_id\n\
             s1,Song1,200000,u1,50,2024-01-01T00:00:00Z,a1,ar1\n"
        );
    }

    #[test]
    fn test_quotes_fields_with_commas() {
        let rows = vec![ArtistRow {
            artist_id: "ar1".to_string(),
            name: "Earth, Wind & Fire".to_string(),
            url: "arh1".to_string(),
        }];
        let csv = to_csv(&ArtistRow::COLUMNS, &rows).unwrap();
        assert_eq!(csv, "artist_id,name,url\nar1,\"Earth, Wind & Fire\",arh1\n");
    }

    #[test]
    fn test_empty_table_has_header() {
        let csv = to_csv::<ArtistRow>(&ArtistRow::COLUMNS, &[]).unwrap();
        assert_eq!(csv, "artist_id,name,url\n");
    }
}
