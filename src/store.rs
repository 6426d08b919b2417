use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::domain::{Category, PatentId};
use crate::error::PatentError;
use crate::fetcher::FrontImage;
use crate::record::{DocumentRecord, QueryRecord};

/// Owns the on-disk layout of document records and front images.
///
/// Documents land in `<document_root>/<category>/<id>.json`, images in
/// `<image_root>/<category>/<id>.<ext>`. Query records are rewritten where
/// they were read from.
#[derive(Debug, Clone)]
pub struct RecordStore {
    document_root: Utf8PathBuf,
    image_root: Utf8PathBuf,
}

impl RecordStore {
    pub fn new_with_paths(document_root: Utf8PathBuf, image_root: Utf8PathBuf) -> Self {
        Self {
            document_root,
            image_root,
        }
    }

    pub fn category_document_dir(&self, category: &Category) -> Utf8PathBuf {
        self.document_root.join(category.as_str())
    }

    pub fn category_image_dir(&self, category: &Category) -> Utf8PathBuf {
        self.image_root.join(category.as_str())
    }

    pub fn document_path(&self, category: &Category, id: &PatentId) -> Utf8PathBuf {
        self.category_document_dir(category)
            .join(format!("{}.json", id.as_str()))
    }

    pub fn image_path(&self, category: &Category, id: &PatentId, ext: &str) -> Utf8PathBuf {
        self.category_image_dir(category)
            .join(format!("{}.{ext}", id.as_str()))
    }

    pub fn load_query(&self, location: &Utf8Path) -> Result<QueryRecord, PatentError> {
        let content = fs::read_to_string(location.as_std_path())
            .map_err(|err| PatentError::malformed(location, err))?;
        QueryRecord::from_json(location, &content)
    }

    pub fn ensure_category_dirs(&self, category: &Category) -> Result<(), PatentError> {
        fs::create_dir_all(self.category_document_dir(category).as_std_path())
            .map_err(|err| PatentError::Persistence(err.to_string()))?;
        fs::create_dir_all(self.category_image_dir(category).as_std_path())
            .map_err(|err| PatentError::Persistence(err.to_string()))
    }

    pub fn write_document(
        &self,
        category: &Category,
        id: &PatentId,
        record: &DocumentRecord,
    ) -> Result<Utf8PathBuf, PatentError> {
        let path = self.document_path(category, id);
        let content = serde_json::to_vec_pretty(record)
            .map_err(|err| PatentError::Persistence(err.to_string()))?;
        Self::write_bytes_atomic(&path, &content)?;
        Ok(path)
    }

    pub fn rewrite_query(&self, record: &QueryRecord) -> Result<(), PatentError> {
        let content = record.to_json_pretty()?;
        Self::write_bytes_atomic(record.location(), &content)
    }

    pub fn save_image(
        &self,
        image: &FrontImage,
        category: &Category,
        id: &PatentId,
    ) -> Result<Utf8PathBuf, PatentError> {
        if image.bytes.is_empty() {
            return Err(PatentError::AssetUnavailable(format!(
                "empty image body for {id}"
            )));
        }
        let path = self.image_path(category, id, &image.extension);
        Self::write_bytes_atomic(&path, &image.bytes)?;
        Ok(path)
    }

    /// Writes through a sibling temp file and renames it over `path`, so a
    /// reader sees either the old or the new content.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), PatentError> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| PatentError::Persistence(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".patcite")
            .suffix(".tmp")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| PatentError::Persistence(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| PatentError::Persistence(err.to_string()))?;
        temp.as_file()
            .sync_all()
            .map_err(|err| PatentError::Persistence(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| PatentError::Persistence(format!("persist {path}: {}", err.error)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = RecordStore::new_with_paths(
            Utf8PathBuf::from("out/json/document"),
            Utf8PathBuf::from("out/front_imgs/document"),
        );
        let category: Category = "H04L".parse().unwrap();
        let id: PatentId = "US7654321B2".parse().unwrap();

        let doc = store.document_path(&category, &id);
        assert!(doc.ends_with("json/document/H04L/US7654321B2.json"));

        let img = store.image_path(&category, &id, "png");
        assert!(img.ends_with("front_imgs/document/H04L/US7654321B2.png"));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("nested/file.json")).unwrap();

        RecordStore::write_bytes_atomic(&path, b"first").unwrap();
        RecordStore::write_bytes_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(path.as_std_path()).unwrap(), b"second");
        let leftovers = fs::read_dir(path.parent().unwrap().as_std_path())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }
}
