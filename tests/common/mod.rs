#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};

use patent_citations::app::{ProgressEvent, ProgressSink};
use patent_citations::domain::{Field, PatentId};
use patent_citations::error::PatentError;
use patent_citations::fetcher::{FieldFetcher, FrontImage};
use patent_citations::record::DocumentRecord;
use patent_citations::store::RecordStore;

#[derive(Debug, Clone)]
pub enum Behavior {
    Full,
    Empty(Field),
    Fail,
}

/// Answers every field for unknown ids; configured ids misbehave.
#[derive(Default)]
pub struct StubFetcher {
    behaviors: HashMap<String, Behavior>,
    pub calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn with(mut self, id: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(id.to_string(), behavior);
        self
    }

    fn behavior(&self, id: &PatentId, field: Field) -> Result<bool, PatentError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{field}", id.as_str()));
        match self.behaviors.get(id.as_str()) {
            None | Some(Behavior::Full) => Ok(true),
            Some(Behavior::Empty(empty)) => Ok(*empty != field),
            Some(Behavior::Fail) => Err(PatentError::FetchHttp("connection reset".to_string())),
        }
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for call in self.calls.lock().unwrap().iter() {
            let id = call.split(':').next().unwrap().to_string();
            if ids.last() != Some(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl FieldFetcher for StubFetcher {
    fn fetch_title(&self, id: &PatentId) -> Result<Option<String>, PatentError> {
        Ok(self
            .behavior(id, Field::Title)?
            .then(|| format!("Title of {id}")))
    }

    fn fetch_abstract(&self, id: &PatentId) -> Result<Option<String>, PatentError> {
        Ok(self
            .behavior(id, Field::Abstract)?
            .then(|| format!("Abstract of {id}")))
    }

    fn fetch_cpc_classes(&self, id: &PatentId) -> Result<Option<Vec<String>>, PatentError> {
        Ok(self
            .behavior(id, Field::CpcClasses)?
            .then(|| vec!["G06F16/00".to_string(), "H04L9/32".to_string()]))
    }

    fn fetch_first_claim(&self, id: &PatentId) -> Result<Option<String>, PatentError> {
        Ok(self
            .behavior(id, Field::FirstClaim)?
            .then(|| format!("1. A method as in {id}.")))
    }

    fn fetch_front_image(&self, id: &PatentId) -> Result<Option<FrontImage>, PatentError> {
        Ok(self
            .behavior(id, Field::FrontImage)?
            .then(|| FrontImage {
                bytes: b"\x89PNG fake".to_vec(),
                extension: "png".to_string(),
            }))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

pub struct Workspace {
    _temp: tempfile::TempDir,
    pub root: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        Self { _temp: temp, root }
    }

    pub fn input_root(&self) -> Utf8PathBuf {
        self.root.join("json/query")
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new_with_paths(
            self.root.join("json/document"),
            self.root.join("front_imgs/document"),
        )
    }

    pub fn write_query(&self, category: &str, id: &str, json: &str) -> Utf8PathBuf {
        let dir = self.input_root().join(category);
        fs::create_dir_all(dir.as_std_path()).unwrap();
        let path = dir.join(format!("{id}.json"));
        fs::write(path.as_std_path(), json).unwrap();
        path
    }
}

pub fn read_json(path: &Utf8Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path.as_std_path()).unwrap()).unwrap()
}

pub fn read_document(path: &Utf8Path) -> DocumentRecord {
    serde_json::from_str(&fs::read_to_string(path.as_std_path()).unwrap()).unwrap()
}

pub fn file_names(dir: &Utf8Path) -> Vec<String> {
    if !dir.as_std_path().exists() {
        return Vec::new();
    }
    let mut names = fs::read_dir(dir.as_std_path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    names.sort();
    names
}
