use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Category;
use crate::error::PatentError;

pub const CITATIONS_KEY: &str = "citations_by_examiner";
pub const COUNT_KEY: &str = "document_patents_count";
pub const DOCUMENT_TYPE: &str = "document";

/// A query patent as read from `<input_root>/<category>/<id>.json`.
///
/// Identity comes from the file location; the JSON body is kept as-is so a
/// rewrite only touches `document_patents_count`.
#[derive(Debug, Clone)]
pub struct QueryRecord {
    location: Utf8PathBuf,
    id: String,
    category: Category,
    fields: Map<String, Value>,
}

impl QueryRecord {
    pub fn from_json(location: &Utf8Path, content: &str) -> Result<Self, PatentError> {
        let (category, id) = locate(location)?;
        let value: Value = serde_json::from_str(content)
            .map_err(|err| PatentError::malformed(location, err))?;
        let Value::Object(fields) = value else {
            return Err(PatentError::malformed(location, "expected a JSON object"));
        };
        let record = Self {
            location: location.to_path_buf(),
            id,
            category,
            fields,
        };
        record.citations()?;
        Ok(record)
    }

    pub fn location(&self) -> &Utf8Path {
        &self.location
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Cited identifiers in list order. A missing or `null` list is empty.
    pub fn citations(&self) -> Result<Vec<String>, PatentError> {
        match self.fields.get(CITATIONS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        PatentError::malformed(
                            &self.location,
                            format!("{CITATIONS_KEY} must contain only strings"),
                        )
                    })
                })
                .collect(),
            Some(_) => Err(PatentError::malformed(
                &self.location,
                format!("{CITATIONS_KEY} must be an array"),
            )),
        }
    }

    pub fn set_document_patents_count(&mut self, count: usize) {
        self.fields
            .insert(COUNT_KEY.to_string(), Value::from(count as u64));
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>, PatentError> {
        serde_json::to_vec_pretty(&self.fields)
            .map_err(|err| PatentError::Persistence(err.to_string()))
    }
}

fn locate(location: &Utf8Path) -> Result<(Category, String), PatentError> {
    let id = location
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| PatentError::malformed(location, "missing file name"))?;
    let category = location
        .parent()
        .and_then(Utf8Path::file_name)
        .ok_or_else(|| PatentError::malformed(location, "missing category directory"))?
        .parse::<Category>()
        .map_err(|err| PatentError::malformed(location, err))?;
    Ok((category, id.to_string()))
}

/// One resolved citation, written to `<output_root>/<category>/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub query: String,
    pub class: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(rename = "CPC_class")]
    pub cpc_classes: Vec<String>,
    pub first_claim: String,
    pub front_img: String,
}

impl DocumentRecord {
    pub fn new(
        query: &QueryRecord,
        title: String,
        abstract_text: String,
        cpc_classes: Vec<String>,
        first_claim: String,
        front_img: &Utf8Path,
    ) -> Self {
        Self {
            kind: DOCUMENT_TYPE.to_string(),
            query: query.location().to_string(),
            class: query.category().to_string(),
            title,
            abstract_text,
            cpc_classes,
            first_claim,
            front_img: front_img.to_string(),
        }
    }
}
