use std::time::Instant;

use camino::Utf8Path;
use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{Field, PatentId};
use crate::error::PatentError;
use crate::fetcher::{FieldFetcher, FrontImage};
use crate::record::{DocumentRecord, QueryRecord};
use crate::store::RecordStore;

/// Outcome of one resolution pass over a query's citation list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionSummary {
    pub query: String,
    pub category: String,
    pub attempted: usize,
    pub succeeded: usize,
}

impl ResolutionSummary {
    /// Percentage of resolved citations; `None` for an empty list.
    pub fn success_rate(&self) -> Option<f64> {
        (self.attempted > 0).then(|| self.succeeded as f64 * 100.0 / self.attempted as f64)
    }

    pub fn progress_line(&self) -> String {
        let rate = match self.success_rate() {
            Some(rate) => format!("{rate:.2}%"),
            None => "n/a".to_string(),
        };
        format!(
            "document_patents_count is: {}\t{}/{}\t{rate}",
            self.succeeded, self.succeeded, self.attempted
        )
    }
}

/// Raw results of the five fetches for one citation.
#[derive(Debug, Clone, Default)]
pub struct FetchedFields {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub cpc_classes: Option<Vec<String>>,
    pub first_claim: Option<String>,
    pub front_image: Option<FrontImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompleteFields {
    pub title: String,
    pub abstract_text: String,
    pub cpc_classes: Vec<String>,
    pub first_claim: String,
    pub front_image: FrontImage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completeness {
    Complete(CompleteFields),
    Incomplete { missing: Vec<Field> },
}

impl FetchedFields {
    pub fn fetch<F: FieldFetcher + ?Sized>(
        fetcher: &F,
        id: &PatentId,
    ) -> Result<Self, PatentError> {
        Ok(Self {
            title: fetcher.fetch_title(id)?,
            abstract_text: fetcher.fetch_abstract(id)?,
            cpc_classes: fetcher.fetch_cpc_classes(id)?,
            first_claim: fetcher.fetch_first_claim(id)?,
            front_image: fetcher.fetch_front_image(id)?,
        })
    }

    /// Blank text, an empty code list and an empty image all count as missing.
    pub fn validate(self) -> Completeness {
        let mut missing = Vec::new();
        let title = non_blank(self.title, Field::Title, &mut missing);
        let abstract_text = non_blank(self.abstract_text, Field::Abstract, &mut missing);
        let cpc_classes = self
            .cpc_classes
            .map(|codes| {
                codes
                    .into_iter()
                    .map(|code| code.trim().to_string())
                    .filter(|code| !code.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|codes| !codes.is_empty());
        if cpc_classes.is_none() {
            missing.push(Field::CpcClasses);
        }
        let first_claim = non_blank(self.first_claim, Field::FirstClaim, &mut missing);
        let front_image = self.front_image.filter(|image| !image.bytes.is_empty());
        if front_image.is_none() {
            missing.push(Field::FrontImage);
        }

        match (title, abstract_text, cpc_classes, first_claim, front_image) {
            (
                Some(title),
                Some(abstract_text),
                Some(cpc_classes),
                Some(first_claim),
                Some(front_image),
            ) => Completeness::Complete(CompleteFields {
                title,
                abstract_text,
                cpc_classes,
                first_claim,
                front_image,
            }),
            _ => Completeness::Incomplete { missing },
        }
    }
}

fn non_blank(value: Option<String>, field: Field, missing: &mut Vec<Field>) -> Option<String> {
    let value = value.filter(|text| !text.trim().is_empty());
    if value.is_none() {
        missing.push(field);
    }
    value
}

enum CitationOutcome {
    Resolved,
    Skipped,
}

/// Resolves the citations of one query record into document records.
///
/// Holds no state between calls; each query is processed to completion
/// before `resolve` returns.
pub struct DocumentResolver<F: FieldFetcher> {
    store: RecordStore,
    fetcher: F,
}

impl<F: FieldFetcher> DocumentResolver<F> {
    pub fn new(store: RecordStore, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    /// Per-citation fetch failures are logged and skipped. Malformed input
    /// and storage failures are returned; on a storage failure the query
    /// record is left as it was.
    pub fn resolve(
        &self,
        location: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<ResolutionSummary, PatentError> {
        let mut query = self.store.load_query(location)?;
        let citations = query.citations()?;
        self.store.ensure_category_dirs(query.category())?;

        sink.event(ProgressEvent {
            message: format!("Starting scraping citations for query: {}", query.id()),
            elapsed: None,
        });
        let start = Instant::now();

        let mut succeeded = 0usize;
        for raw in &citations {
            if let CitationOutcome::Resolved = self.resolve_citation(&query, raw)? {
                succeeded += 1;
            }
        }

        query.set_document_patents_count(succeeded);
        self.store.rewrite_query(&query)?;

        let summary = ResolutionSummary {
            query: query.id().to_string(),
            category: query.category().to_string(),
            attempted: citations.len(),
            succeeded,
        };
        tracing::info!(
            query = summary.query.as_str(),
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            "resolution pass complete"
        );
        sink.event(ProgressEvent {
            message: summary.progress_line(),
            elapsed: Some(start.elapsed()),
        });
        Ok(summary)
    }

    fn resolve_citation(
        &self,
        query: &QueryRecord,
        raw: &str,
    ) -> Result<CitationOutcome, PatentError> {
        let id = match raw.parse::<PatentId>() {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(query = query.id(), citation = raw, "skipping citation: {err}");
                return Ok(CitationOutcome::Skipped);
            }
        };

        let fields = match FetchedFields::fetch(&self.fetcher, &id) {
            Ok(fields) => fields,
            Err(err) => {
                tracing::warn!(
                    "Error processing patent {id} from {}: {err}",
                    self.fetcher.reference(&id)
                );
                return Ok(CitationOutcome::Skipped);
            }
        };

        let complete = match fields.validate() {
            Completeness::Complete(complete) => complete,
            Completeness::Incomplete { missing } => {
                let missing = missing
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::warn!(patent = id.as_str(), "incomplete patent, missing: {missing}");
                return Ok(CitationOutcome::Skipped);
            }
        };

        let category = query.category();
        let image_path = match self.store.save_image(&complete.front_image, category, &id) {
            Ok(path) => path,
            Err(err @ PatentError::AssetUnavailable(_)) => {
                tracing::warn!(patent = id.as_str(), "{err}");
                return Ok(CitationOutcome::Skipped);
            }
            Err(err) => return Err(err),
        };
        let record = DocumentRecord::new(
            query,
            complete.title,
            complete.abstract_text,
            complete.cpc_classes,
            complete.first_claim,
            &image_path,
        );
        self.store.write_document(category, &id, &record)?;
        Ok(CitationOutcome::Resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> FetchedFields {
        FetchedFields {
            title: Some("Title".to_string()),
            abstract_text: Some("Abstract".to_string()),
            cpc_classes: Some(vec!["H04L9/32".to_string()]),
            first_claim: Some("1. A method".to_string()),
            front_image: Some(FrontImage {
                bytes: vec![1, 2, 3],
                extension: "png".to_string(),
            }),
        }
    }

    #[test]
    fn validate_complete() {
        assert!(matches!(complete().validate(), Completeness::Complete(_)));
    }

    #[test]
    fn validate_names_every_missing_field() {
        let mut fields = complete();
        fields.abstract_text = Some("   ".to_string());
        fields.cpc_classes = Some(Vec::new());
        assert_eq!(
            fields.validate(),
            Completeness::Incomplete {
                missing: vec![Field::Abstract, Field::CpcClasses]
            }
        );
    }

    #[test]
    fn empty_list_rate_is_undefined() {
        let summary = ResolutionSummary {
            query: "Q".to_string(),
            category: "H04L".to_string(),
            attempted: 0,
            succeeded: 0,
        };
        assert_eq!(summary.success_rate(), None);
        assert!(summary.progress_line().ends_with("0/0\tn/a"));
    }

    #[test]
    fn progress_line_format() {
        let summary = ResolutionSummary {
            query: "Q".to_string(),
            category: "H04L".to_string(),
            attempted: 3,
            succeeded: 2,
        };
        assert_eq!(
            summary.progress_line(),
            "document_patents_count is: 2\t2/3\t66.67%"
        );
    }
}
