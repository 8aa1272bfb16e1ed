use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::MAX_PDF_PAGES;
use crate::llm::{Agent, LlmClient, ResponseSieve, DOC_TYPE_KEYS, EXTRACTION_KEYS};
use crate::ocr::{
    count_pdf_pages, is_image, is_pdf, normalize_ocr_payload, DocumentConverter, OcrClient,
    PageSet,
};
use crate::validate::{now_business, validate_claim, MetadataSnapshot, ValidationRecord};

use super::layout::{new_run_id, write_json, RunLayout};
use super::merge::merge_model_outputs;
use super::types::{
    ErrorCode, ExtractedFields, FileInfo, FinalResult, Manifest, RunError, RunRequest, RunStatus,
    UserInput,
};

/// The stage machine for one document run.
///
/// Stages run in a fixed order and fail fast: the first error ends the run,
/// the manifest and final result are written regardless. After validation
/// the run is a success even when individual checks fail; failed checks
/// surface as errors on the final result, not as a run failure.
pub struct Pipeline<'a> {
    ocr: &'a dyn OcrClient,
    llm: &'a dyn LlmClient,
    converter: Option<&'a dyn DocumentConverter>,
    runs_root: PathBuf,
}

/// Outcome of a run that reached validation.
struct Validated {
    record: ValidationRecord,
    errors: Vec<RunError>,
}

impl<'a> Pipeline<'a> {
    pub fn new(ocr: &'a dyn OcrClient, llm: &'a dyn LlmClient, runs_root: &Path) -> Self {
        Self {
            ocr,
            llm,
            converter: None,
            runs_root: runs_root.to_path_buf(),
        }
    }

    pub fn with_converter(mut self, converter: &'a dyn DocumentConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Process one request end to end. Never panics and never returns an
    /// Err: every outcome, failures included, is a `FinalResult`.
    pub fn run(&self, request: &RunRequest) -> FinalResult {
        let run_id = new_run_id();
        tracing::info!(run_id = %run_id, file = %request.original_filename, "Run started");

        let layout = match RunLayout::create(&self.runs_root, &run_id) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "Cannot create run directory");
                return FinalResult {
                    run_id,
                    verdict: false,
                    errors: vec![RunError::with_details(ErrorCode::FileSaveFailed, e)],
                    checks: None,
                    artifacts: BTreeMap::new(),
                };
            }
        };

        let mut artifacts = BTreeMap::new();
        let outcome = self.execute(request, &layout, &mut artifacts);
        self.finalize(request, &layout, artifacts, outcome)
    }

    fn execute(
        &self,
        request: &RunRequest,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<Validated, RunError> {
        self.write_metadata(request, layout, artifacts)?;
        let saved = self.save_input(request, layout, artifacts)?;
        let pages = self.recognize_document(&saved, layout, artifacts)?;
        self.check_doc_type(&pages, layout, artifacts)?;
        self.extract_fields(&pages, layout, artifacts)?;
        self.merge_outputs(layout, artifacts)?;
        self.validate(layout, artifacts)
    }

    fn write_metadata(
        &self,
        request: &RunRequest,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<(), RunError> {
        let meta = MetadataSnapshot {
            fio: request.fio.clone(),
            reason: request.reason.clone(),
            doc_type: Some(request.doc_type.clone()),
        };
        let path = layout.metadata_path();
        write_json(&path, &meta)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "metadata", &path);
        Ok(())
    }

    fn save_input(
        &self,
        request: &RunRequest,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<PathBuf, RunError> {
        let saved = layout.saved_input_path(&request.original_filename);
        fs::copy(&request.source_path, &saved)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "input", &saved);
        tracing::debug!(run_id = %layout.run_id, path = %saved.display(), "Input saved");
        Ok(saved)
    }

    fn recognize_document(
        &self,
        saved: &Path,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<PageSet, RunError> {
        if is_pdf(saved) {
            if let Some(count) = count_pdf_pages(saved) {
                if count > MAX_PDF_PAGES {
                    return Err(RunError::with_details(
                        ErrorCode::PdfTooManyPages,
                        format!("{count} pages, limit {MAX_PDF_PAGES}"),
                    ));
                }
            }
        }

        // Image inputs are converted to a temporary PDF that is deleted
        // once the OCR call has completed or failed. Without a configured
        // converter the image goes to the OCR service as-is.
        let temp_pdf = match (is_image(saved), self.converter) {
            (true, Some(converter)) => Some(
                converter
                    .to_pdf(saved)
                    .map_err(|e| RunError::with_details(ErrorCode::OcrFailed, e))?,
            ),
            _ => None,
        };

        let ocr_input = temp_pdf.as_deref().unwrap_or(saved);
        let recognized = self.ocr.recognize(ocr_input);
        if let Some(temp) = temp_pdf {
            let _ = fs::remove_file(&temp);
        }
        let response =
            recognized.map_err(|e| RunError::with_details(ErrorCode::OcrFailed, e))?;

        let raw_path = layout.ocr_raw_path();
        fs::write(&raw_path, &response.raw)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "ocr_raw", &raw_path);

        if !response.is_success() {
            return Err(RunError::with_details(
                ErrorCode::OcrFailed,
                response.error_message(),
            ));
        }

        let pages = normalize_ocr_payload(&response.payload)
            .map_err(|e| RunError::with_details(ErrorCode::OcrFilterFailed, e))?;

        let pages_path = layout.ocr_pages_path();
        write_json(&pages_path, &pages)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "ocr_pages", &pages_path);

        if pages.is_empty() {
            return Err(RunError::new(ErrorCode::OcrEmptyPages));
        }
        Ok(pages)
    }

    fn check_doc_type(
        &self,
        pages: &PageSet,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<(), RunError> {
        let raw = Agent::doc_type_checker(self.llm)
            .ask(pages)
            .map_err(|e| RunError::with_details(ErrorCode::DtcFailed, e))?;

        let raw_path = layout.doc_type_raw_path();
        fs::write(&raw_path, &raw)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "doc_type_raw", &raw_path);

        let filtered = ResponseSieve::new(DOC_TYPE_KEYS).sieve(&raw);
        let filtered_path = layout.doc_type_filtered_path();
        write_json(&filtered_path, &filtered)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "doc_type_filtered", &filtered_path);

        match filtered.get("single_doc_type") {
            Some(Value::Bool(true)) => Ok(()),
            Some(Value::Bool(false)) => Err(RunError::new(ErrorCode::MultipleDocuments)),
            other => Err(RunError::with_details(
                ErrorCode::DtcParseError,
                format!("single_doc_type = {:?}", other),
            )),
        }
    }

    fn extract_fields(
        &self,
        pages: &PageSet,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<(), RunError> {
        let raw = Agent::extractor(self.llm)
            .ask(pages)
            .map_err(|e| RunError::with_details(ErrorCode::ExtractFailed, e))?;

        let raw_path = layout.extractor_raw_path();
        fs::write(&raw_path, &raw)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "extractor_raw", &raw_path);

        let filtered = ResponseSieve::new(EXTRACTION_KEYS).sieve(&raw);
        let filtered_path = layout.extractor_filtered_path();
        write_json(&filtered_path, &filtered)
            .map_err(|e| RunError::with_details(ErrorCode::FileSaveFailed, e))?;
        record(artifacts, "extractor_filtered", &filtered_path);

        ExtractedFields::from_map(&filtered)
            .map_err(|e| RunError::with_details(ErrorCode::ExtractSchemaInvalid, e))?;
        Ok(())
    }

    fn merge_outputs(
        &self,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<(), RunError> {
        let merged_path = layout.merged_path();
        merge_model_outputs(
            &layout.extractor_filtered_path(),
            &layout.doc_type_filtered_path(),
            &merged_path,
        )
        .map_err(|e| RunError::with_details(ErrorCode::MergeFailed, e))?;
        record(artifacts, "merged", &merged_path);
        Ok(())
    }

    fn validate(
        &self,
        layout: &RunLayout,
        artifacts: &mut BTreeMap<String, String>,
    ) -> Result<Validated, RunError> {
        let validation_path = layout.validation_path();
        let record_result = validate_claim(
            &layout.metadata_path(),
            &layout.merged_path(),
            &validation_path,
            now_business(),
        )
        .map_err(|e| RunError::with_details(ErrorCode::ValidationFailed, e))?;
        record(artifacts, "validation", &validation_path);

        let errors = check_errors(&record_result);
        Ok(Validated {
            record: record_result,
            errors,
        })
    }

    fn finalize(
        &self,
        request: &RunRequest,
        layout: &RunLayout,
        artifacts: BTreeMap<String, String>,
        outcome: Result<Validated, RunError>,
    ) -> FinalResult {
        let (status, error_code, verdict, checks, errors) = match outcome {
            Ok(validated) => (
                RunStatus::Success,
                None,
                validated.record.verdict,
                Some(validated.record.checks),
                validated.errors,
            ),
            Err(run_error) => {
                tracing::warn!(
                    run_id = %layout.run_id,
                    code = ?run_error.code,
                    details = ?run_error.details,
                    "Run failed"
                );
                (
                    RunStatus::Error,
                    Some(run_error.code),
                    false,
                    None,
                    vec![run_error],
                )
            }
        };

        let saved_path = artifacts.get("input").cloned();
        let size_bytes = saved_path
            .as_deref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len());

        let manifest = Manifest {
            run_id: layout.run_id.clone(),
            created_at: now_business(),
            user_input: UserInput {
                fio: request.fio.clone(),
                reason: request.reason.clone(),
                doc_type: request.doc_type.clone(),
            },
            file: FileInfo {
                original_filename: request.original_filename.clone(),
                saved_path,
                content_type: request.content_type.clone(),
                size_bytes,
            },
            processing: artifacts.clone(),
            status,
            error: error_code,
            final_result_path: layout.final_result_path().display().to_string(),
        };
        if let Err(e) = write_json(&layout.manifest_path(), &manifest) {
            tracing::error!(run_id = %layout.run_id, error = %e, "Cannot write manifest");
        }

        let mut final_artifacts = artifacts;
        record(&mut final_artifacts, "manifest", &layout.manifest_path());
        let result = FinalResult {
            run_id: layout.run_id.clone(),
            verdict,
            errors,
            checks,
            artifacts: final_artifacts,
        };
        if let Err(e) = write_json(&layout.final_result_path(), &result) {
            tracing::error!(run_id = %layout.run_id, error = %e, "Cannot write final result");
        }

        tracing::info!(
            run_id = %layout.run_id,
            verdict = result.verdict,
            errors = result.errors.len(),
            "Run finished"
        );
        result
    }
}

fn record(artifacts: &mut BTreeMap<String, String>, name: &str, path: &Path) {
    artifacts.insert(name.to_string(), path.display().to_string());
}

/// Map failed checks of a completed validation onto result errors.
/// A negative verdict always carries at least one error; checks that
/// could not be evaluated fall back to a generic validation error.
fn check_errors(record: &ValidationRecord) -> Vec<RunError> {
    let mut errors = Vec::new();
    if record.checks.fio_match == Some(false) {
        errors.push(RunError::new(ErrorCode::FioMismatch));
    }
    if record.checks.doc_type_match == Some(false) {
        errors.push(RunError::new(ErrorCode::DocTypeMismatch));
    }
    match record.checks.doc_date_valid {
        Some(true) => {}
        Some(false) => errors.push(RunError::new(ErrorCode::DocDateTooOld)),
        None => errors.push(RunError::new(ErrorCode::DocDateParseFailed)),
    }
    if record.checks.single_doc_type_valid == Some(false) {
        errors.push(RunError::new(ErrorCode::SingleDocTypeInvalid));
    }
    if !record.verdict && errors.is_empty() {
        errors.push(RunError::with_details(
            ErrorCode::ValidationFailed,
            "one or more checks could not be evaluated",
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{MockOcrClient, OcrError};
    use crate::validate::now_business;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// LLM stub replying with a queue of canned responses, in call order.
    struct SequenceLlm {
        responses: Mutex<VecDeque<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl SequenceLlm {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl LlmClient for SequenceLlm {
        fn complete(&self, prompt: &str) -> Result<String, crate::llm::LlmError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| crate::llm::LlmError::Connection("queue exhausted".into()))
        }
    }

    fn request(dir: &Path, fio: &str) -> RunRequest {
        let source = dir.join("upload.pdf");
        std::fs::write(&source, b"fake scanned document bytes").unwrap();
        RunRequest {
            fio: Some(fio.to_string()),
            reason: Some("болезнь".to_string()),
            doc_type: "Справка об инвалидности".to_string(),
            source_path: source,
            original_filename: "upload.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
        }
    }

    fn ocr_with_text(text: &str) -> MockOcrClient {
        MockOcrClient::new(
            &json!({"success": true, "data": {"text": text}}).to_string(),
        )
    }

    fn current_date_string() -> String {
        now_business().date_naive().format("%d.%m.%Y").to_string()
    }

    #[test]
    fn happy_path_accepts_document() {
        let dir = tempdir().unwrap();
        let ocr = ocr_with_text("СПРАВКА об инвалидности, Иванов Иван Иванович");
        let extractor_reply = json!({
            "fio": "Иванов Иван Иванович",
            "doc_type": "Справка об инвалидности",
            "doc_date": current_date_string(),
        })
        .to_string();
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": true}"#, &extractor_reply]);

        let result = Pipeline::new(&ocr, &llm, dir.path()).run(&request(
            dir.path(),
            "Иванов Иван Иванович",
        ));

        assert!(result.verdict, "errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
        let checks = result.checks.as_ref().unwrap();
        assert_eq!(checks.fio_match, Some(true));
        assert_eq!(llm.call_count(), 2);

        let merged_path = Path::new(&result.artifacts["merged"]);
        let merged: Value =
            serde_json::from_str(&std::fs::read_to_string(merged_path).unwrap()).unwrap();
        assert_eq!(merged["single_doc_type"], json!(true));
        assert_eq!(merged["fio"], json!("Иванов Иван Иванович"));

        let manifest: Value = serde_json::from_str(
            &std::fs::read_to_string(Path::new(&result.artifacts["manifest"])).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["status"], json!("success"));
        assert_eq!(manifest["error"], json!(null));
    }

    #[test]
    fn empty_pages_end_the_run_before_any_model_call() {
        let dir = tempdir().unwrap();
        let ocr = MockOcrClient::new(
            &json!({"success": true, "data": {"pages": []}}).to_string(),
        );
        let llm = SequenceLlm::new(&[]);

        let result =
            Pipeline::new(&ocr, &llm, dir.path()).run(&request(dir.path(), "Иванов Иван"));

        assert!(!result.verdict);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::OcrEmptyPages);
        assert_eq!(llm.call_count(), 0);
        assert!(result.checks.is_none());
        assert!(!result.artifacts.contains_key("doc_type_raw"));
        // Audit artifacts exist even on the failure path.
        assert!(result.artifacts.contains_key("ocr_pages"));
        assert!(Path::new(&result.artifacts["manifest"]).exists());
    }

    #[test]
    fn multiple_documents_are_terminal_before_extraction() {
        let dir = tempdir().unwrap();
        let ocr = ocr_with_text("two stitched documents");
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": false}"#]);

        let result =
            Pipeline::new(&ocr, &llm, dir.path()).run(&request(dir.path(), "Иванов Иван"));

        assert!(!result.verdict);
        assert_eq!(result.errors[0].code, ErrorCode::MultipleDocuments);
        assert_eq!(llm.call_count(), 1);
        assert!(!result.artifacts.contains_key("extractor_raw"));
    }

    #[test]
    fn unparsable_doc_type_reply_is_terminal() {
        let dir = tempdir().unwrap();
        let ocr = ocr_with_text("document");
        let llm = SequenceLlm::new(&["I cannot answer in JSON today."]);

        let result =
            Pipeline::new(&ocr, &llm, dir.path()).run(&request(dir.path(), "Иванов Иван"));

        assert_eq!(result.errors[0].code, ErrorCode::DtcParseError);
        // The raw and filtered replies are still on disk for audit.
        assert!(result.artifacts.contains_key("doc_type_raw"));
        assert!(result.artifacts.contains_key("doc_type_filtered"));
    }

    #[test]
    fn failed_checks_surface_as_errors_not_run_failure() {
        let dir = tempdir().unwrap();
        let ocr = ocr_with_text("СПРАВКА, Петров Петр Петрович");
        let extractor_reply = json!({
            "fio": "Петров Петр Петрович",
            "doc_type": "Справка об инвалидности",
            "doc_date": current_date_string(),
        })
        .to_string();
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": true}"#, &extractor_reply]);

        let result = Pipeline::new(&ocr, &llm, dir.path()).run(&request(
            dir.path(),
            "Иванов Иван Иванович",
        ));

        assert!(!result.verdict);
        let codes: Vec<ErrorCode> = result.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::FioMismatch]);
        let checks = result.checks.as_ref().unwrap();
        assert_eq!(checks.fio_match, Some(false));
        assert_eq!(checks.doc_date_valid, Some(true));

        let manifest: Value = serde_json::from_str(
            &std::fs::read_to_string(Path::new(&result.artifacts["manifest"])).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["status"], json!("success"));
    }

    #[test]
    fn stale_and_unparsable_dates_map_to_distinct_errors() {
        let dir = tempdir().unwrap();
        let ocr = ocr_with_text("СПРАВКА");
        let stale_reply = json!({
            "fio": "Иванов Иван",
            "doc_type": "Справка об инвалидности",
            "doc_date": "01.01.2020",
        })
        .to_string();
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": true}"#, &stale_reply]);
        let result =
            Pipeline::new(&ocr, &llm, dir.path()).run(&request(dir.path(), "Иванов Иван"));
        let codes: Vec<ErrorCode> = result.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::DocDateTooOld]);

        let garbled_reply = json!({
            "fio": "Иванов Иван",
            "doc_type": "Справка об инвалидности",
            "doc_date": "во вторник",
        })
        .to_string();
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": true}"#, &garbled_reply]);
        let result =
            Pipeline::new(&ocr, &llm, dir.path()).run(&request(dir.path(), "Иванов Иван"));
        let codes: Vec<ErrorCode> = result.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::DocDateParseFailed]);
    }

    #[test]
    fn unevaluable_check_still_yields_an_error() {
        let dir = tempdir().unwrap();
        let ocr = ocr_with_text("СПРАВКА без имени");
        let no_fio_reply = json!({
            "fio": null,
            "doc_type": "Справка об инвалидности",
            "doc_date": current_date_string(),
        })
        .to_string();
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": true}"#, &no_fio_reply]);

        let result =
            Pipeline::new(&ocr, &llm, dir.path()).run(&request(dir.path(), "Иванов Иван"));

        assert!(!result.verdict);
        assert!(!result.errors.is_empty());
        assert_eq!(result.errors[0].code, ErrorCode::ValidationFailed);
        assert_eq!(result.checks.as_ref().unwrap().fio_match, None);
    }

    #[test]
    fn missing_source_file_still_writes_audit_trail() {
        let dir = tempdir().unwrap();
        let ocr = ocr_with_text("unused");
        let llm = SequenceLlm::new(&[]);
        let req = RunRequest {
            fio: Some("Иванов Иван".to_string()),
            reason: None,
            doc_type: "Справка об инвалидности".to_string(),
            source_path: dir.path().join("does-not-exist.pdf"),
            original_filename: "does-not-exist.pdf".to_string(),
            content_type: None,
        };

        let result = Pipeline::new(&ocr, &llm, dir.path()).run(&req);

        assert!(!result.verdict);
        assert_eq!(result.errors[0].code, ErrorCode::FileSaveFailed);
        assert!(result.errors[0].details.is_some());
        assert!(result.artifacts.contains_key("metadata"));
        assert!(Path::new(&result.artifacts["manifest"]).exists());
    }

    #[test]
    fn over_limit_pdf_is_rejected_before_ocr() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("long.pdf");
        std::fs::write(
            &source,
            "%PDF-1.4 /Type /Page a /Type /Page b /Type /Page c /Type /Page d",
        )
        .unwrap();
        let ocr = ocr_with_text("unused");
        let llm = SequenceLlm::new(&[]);
        let req = RunRequest {
            fio: Some("Иванов Иван".to_string()),
            reason: None,
            doc_type: "Справка об инвалидности".to_string(),
            source_path: source,
            original_filename: "long.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
        };

        let result = Pipeline::new(&ocr, &llm, dir.path()).run(&req);

        assert_eq!(result.errors[0].code, ErrorCode::PdfTooManyPages);
        assert!(!result.artifacts.contains_key("ocr_raw"));
    }

    #[test]
    fn failed_ocr_response_body_is_saved_before_erroring() {
        let dir = tempdir().unwrap();
        let ocr = MockOcrClient::new(
            &json!({"success": false, "message": "engine overloaded"}).to_string(),
        );
        let llm = SequenceLlm::new(&[]);

        let result =
            Pipeline::new(&ocr, &llm, dir.path()).run(&request(dir.path(), "Иванов Иван"));

        assert_eq!(result.errors[0].code, ErrorCode::OcrFailed);
        assert_eq!(result.errors[0].details.as_deref(), Some("engine overloaded"));
        assert!(result.artifacts.contains_key("ocr_raw"));
    }

    #[test]
    fn image_conversion_temp_file_is_removed() {
        struct FixedConverter {
            temp: PathBuf,
        }
        impl DocumentConverter for FixedConverter {
            fn to_pdf(&self, _image_path: &Path) -> Result<PathBuf, OcrError> {
                std::fs::write(&self.temp, b"%PDF-1.4 converted").map_err(OcrError::Io)?;
                Ok(self.temp.clone())
            }
        }

        let dir = tempdir().unwrap();
        let source = dir.path().join("scan.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let converter = FixedConverter {
            temp: dir.path().join("converted.pdf"),
        };
        let ocr = ocr_with_text("СПРАВКА");
        let extractor_reply = json!({
            "fio": "Иванов Иван",
            "doc_type": "Справка об инвалидности",
            "doc_date": current_date_string(),
        })
        .to_string();
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": true}"#, &extractor_reply]);
        let req = RunRequest {
            fio: Some("Иванов Иван".to_string()),
            reason: None,
            doc_type: "Справка об инвалидности".to_string(),
            source_path: source,
            original_filename: "scan.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
        };

        let result = Pipeline::new(&ocr, &llm, dir.path())
            .with_converter(&converter)
            .run(&req);

        assert!(result.verdict, "errors: {:?}", result.errors);
        assert!(!converter.temp.exists());
    }

    #[test]
    fn image_without_converter_goes_to_ocr_as_is() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("scan.png");
        std::fs::write(&source, b"png bytes").unwrap();
        let ocr = ocr_with_text("СПРАВКА и ПРИКАЗ");
        let llm = SequenceLlm::new(&[r#"{"single_doc_type": false}"#]);
        let req = RunRequest {
            fio: None,
            reason: None,
            doc_type: "Справка об инвалидности".to_string(),
            source_path: source,
            original_filename: "scan.png".to_string(),
            content_type: Some("image/png".to_string()),
        };

        let result = Pipeline::new(&ocr, &llm, dir.path()).run(&req);
        // The OCR stage ran on the unconverted image; the run ends later.
        assert!(result.artifacts.contains_key("ocr_pages"));
        assert_eq!(result.errors[0].code, ErrorCode::MultipleDocuments);
    }
}
