//! Map catalog reader.
//!
//! The catalog is a semicolon-delimited file with a `map_name`, `map_id`,
//! `tier`, and `rating` column (in any order; extra columns are ignored).
//! Empty tier or rating fields are read as `None`.

use std::io::Read;
use std::path::Path;

use tempus_records_models::MapRecord;

use crate::{DELIMITER, StorageError};

/// Loads the catalog at `path`, preserving file order.
///
/// # Errors
///
/// Returns [`StorageError::CatalogNotFound`] if `path` is not a file, or
/// another [`StorageError`] if it cannot be read or parsed.
pub fn load_catalog(path: &Path) -> Result<Vec<MapRecord>, StorageError> {
    if !path.is_file() {
        return Err(StorageError::CatalogNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path)?;
    let maps = read_catalog(file)?;
    log::info!("Loaded {} maps from {}", maps.len(), path.display());
    Ok(maps)
}

/// Parses a catalog from any reader.
///
/// # Errors
///
/// Returns [`StorageError::Csv`] if the header is missing a required column
/// or a row cannot be parsed.
pub fn read_catalog<R: Read>(reader: R) -> Result<Vec<MapRecord>, StorageError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut maps = Vec::new();
    for row in reader.deserialize::<MapRecord>() {
        maps.push(row?);
    }
    Ok(maps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_catalog_rows_in_order() {
        let text = "map_name;map_id;tier;rating\n\
                    jump_beef;12;1;1\n\
                    jump_adventure;7;4;3\n";
        let maps = read_catalog(text.as_bytes()).unwrap();

        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].map_name, "jump_beef");
        assert_eq!(maps[0].map_id, 12);
        assert_eq!(maps[1].tier.as_deref(), Some("4"));
        assert_eq!(maps[1].rating.as_deref(), Some("3"));
    }

    #[test]
    fn empty_tier_and_rating_are_none() {
        let text = "map_name;map_id;tier;rating\njump_new;99;;\n";
        let maps = read_catalog(text.as_bytes()).unwrap();

        assert_eq!(maps[0].tier, None);
        assert_eq!(maps[0].rating, None);
    }

    #[test]
    fn column_order_does_not_matter() {
        let text = "map_id;rating;map_name;tier;extra\n3;2;jump_x;5;ignored\n";
        let maps = read_catalog(text.as_bytes()).unwrap();

        assert_eq!(maps[0].map_id, 3);
        assert_eq!(maps[0].map_name, "jump_x");
        assert_eq!(maps[0].tier.as_deref(), Some("5"));
    }

    #[test]
    fn missing_column_is_an_error() {
        let text = "map_name;tier;rating\njump_beef;1;1\n";
        assert!(matches!(
            read_catalog(text.as_bytes()),
            Err(StorageError::Csv(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_catalog(Path::new("/nonexistent/all_maps_soldier_info.csv")).unwrap_err();
        assert!(matches!(err, StorageError::CatalogNotFound { .. }));
    }
}
