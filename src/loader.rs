//! Parallel PDF corpus loader.
//!
//! Lists the immediate `*.pdf` children of a directory and extracts
//! per-page text from each file. PDF parsing is CPU-bound, so files are
//! processed on blocking worker tasks bounded by the number of CPU
//! cores. Workers share no mutable state; results are merged in
//! filename order, not completion order, so chunk provenance is
//! reproducible across runs.
//!
//! Failure policy is skip-and-continue: a file that fails to parse is
//! recorded as an [`IngestionFailure`] and the remaining files still
//! load. The caller decides what to do with the aggregate report.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use crate::error::{NormaError, Result};
use crate::models::{CorpusLoad, Document, IngestionFailure, Page};

/// Load every PDF in `directory` (non-recursive).
///
/// Fails fast when the directory does not exist; per-file parse
/// failures are collected instead of aborting the load.
pub async fn load_directory(directory: &Path) -> Result<CorpusLoad> {
    if !directory.is_dir() {
        return Err(NormaError::Ingestion {
            path: directory.to_path_buf(),
            reason: "directory does not exist".to_string(),
        });
    }

    let paths = list_pdf_files(directory)?;
    tracing::debug!(
        directory = %directory.display(),
        files = paths.len(),
        "scanning corpus directory"
    );

    let workers = num_cpus::get().max(1);
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut handles = Vec::with_capacity(paths.len());
    for path in &paths {
        let path = path.clone();
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return Err(IngestionFailure {
                        path,
                        reason: "ingestion worker pool closed".to_string(),
                    });
                }
            };
            let worker_path = path.clone();
            match tokio::task::spawn_blocking(move || extract_document(worker_path)).await {
                Ok(result) => result,
                // A panicking worker loses its own file only.
                Err(e) => Err(IngestionFailure {
                    path,
                    reason: format!("extraction worker failed: {}", e),
                }),
            }
        }));
    }

    let mut documents = Vec::new();
    let mut failures = Vec::new();

    // Awaiting in spawn order keeps documents in filename order.
    for (handle, path) in handles.into_iter().zip(paths) {
        match handle.await {
            Ok(Ok(document)) => documents.push(document),
            Ok(Err(failure)) => {
                tracing::warn!(
                    path = %failure.path.display(),
                    "skipping file: {}",
                    failure.reason
                );
                failures.push(failure);
            }
            Err(e) => failures.push(IngestionFailure {
                path,
                reason: format!("ingestion task aborted: {}", e),
            }),
        }
    }

    Ok(CorpusLoad {
        documents,
        failures,
    })
}

/// List immediate `*.pdf` children of a directory, sorted by filename.
///
/// Filesystem listing order is platform-dependent; sorting makes the
/// corpus (and therefore the built index) reproducible.
pub fn list_pdf_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| NormaError::Ingestion {
            path: directory.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

fn extract_document(path: PathBuf) -> std::result::Result<Document, IngestionFailure> {
    let bytes = std::fs::read(&path).map_err(|e| IngestionFailure {
        path: path.clone(),
        reason: format!("read failed: {}", e),
    })?;

    let page_texts =
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| IngestionFailure {
            path: path.clone(),
            reason: format!("PDF extraction failed: {}", e),
        })?;

    let pages = page_texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Page { index, text })
        .collect();

    Ok(Document { path, pages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Write a PDF with one Helvetica text line per page.
    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_fails_fast() {
        let err = load_directory(Path::new("/nonexistent/standards"))
            .await
            .unwrap_err();
        assert!(matches!(err, NormaError::Ingestion { .. }));
    }

    #[tokio::test]
    async fn test_empty_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let load = load_directory(dir.path()).await.unwrap();
        assert!(load.documents.is_empty());
        assert!(load.failures.is_empty());
    }

    #[tokio::test]
    async fn test_non_pdf_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a standard").unwrap();
        write_pdf(&dir.path().join("norm.pdf"), &["Section 1: scope."]);

        let load = load_directory(dir.path()).await.unwrap();
        assert_eq!(load.documents.len(), 1);
        assert!(load.documents[0].path.ends_with("norm.pdf"));
    }

    #[tokio::test]
    async fn test_documents_sorted_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(&dir.path().join("b.pdf"), &["second document"]);
        write_pdf(&dir.path().join("a.pdf"), &["first document"]);
        write_pdf(&dir.path().join("c.pdf"), &["third document"]);

        let load = load_directory(dir.path()).await.unwrap();
        let names: Vec<_> = load
            .documents
            .iter()
            .map(|d| d.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn test_bad_file_skipped_others_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a valid pdf").unwrap();
        write_pdf(&dir.path().join("good.pdf"), &["Section 2: materials."]);

        let load = load_directory(dir.path()).await.unwrap();
        assert_eq!(load.documents.len(), 1);
        assert_eq!(load.failures.len(), 1);
        assert!(load.failures[0].path.ends_with("broken.pdf"));
    }

    #[tokio::test]
    async fn test_pages_extracted_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(
            &dir.path().join("norm.pdf"),
            &["wall thickness on page one", "weld inspection on page two"],
        );

        let load = load_directory(dir.path()).await.unwrap();
        assert_eq!(load.documents.len(), 1);
        let pages = &load.documents[0].pages;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].index, 0);
        assert_eq!(pages[1].index, 1);
        assert!(pages[0].text.contains("wall thickness"));
        assert!(pages[1].text.contains("weld inspection"));
    }
}
