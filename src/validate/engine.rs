use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dates::{is_within_validity_window, parse_doc_date};
use super::text_norm::{fold_ws_case, normalize_name, token_sort_ratio};
use super::ValidationError;
use crate::config::{FIO_MATCH_THRESHOLD, VALIDITY_WINDOW_DAYS};

/// The four checks of a run. `None` means "could not evaluate" — one of the
/// compared values was missing or unparsable — which is distinct from a
/// failed check.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Checks {
    pub fio_match: Option<bool>,
    pub doc_type_match: Option<bool>,
    pub doc_date_valid: Option<bool>,
    pub single_doc_type_valid: Option<bool>,
}

impl Checks {
    /// True iff every check is strictly true; any false or None fails.
    pub fn verdict(&self) -> bool {
        self.fio_match == Some(true)
            && self.doc_type_match == Some(true)
            && self.doc_date_valid == Some(true)
            && self.single_doc_type_valid == Some(true)
    }
}

/// Caller-supplied claim metadata snapshot (`metadata.json`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetadataSnapshot {
    pub fio: Option<String>,
    pub reason: Option<String>,
    pub doc_type: Option<String>,
}

/// Typed view of the merged record. Construction coerces at the boundary:
/// wrong-typed values become None instead of flowing through as ambiguous
/// JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedRecord {
    pub fio: Option<String>,
    pub doc_type: Option<String>,
    pub doc_date: Option<String>,
    pub single_doc_type: Option<bool>,
}

impl MergedRecord {
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        };
        Self {
            fio: field("fio"),
            doc_type: field("doc_type"),
            doc_date: field("doc_date"),
            single_doc_type: value.get("single_doc_type").and_then(Value::as_bool),
        }
    }
}

/// Per-check human-readable outcome messages (Russian, caller-facing).
#[derive(Debug, Clone, Serialize)]
pub struct CheckMessages {
    pub fio_match: Option<&'static str>,
    pub doc_type_match: Option<&'static str>,
    pub doc_date_valid: Option<&'static str>,
    pub single_doc_type_valid: Option<&'static str>,
    pub verdict: &'static str,
}

fn message(value: Option<bool>, yes: &'static str, no: &'static str) -> Option<&'static str> {
    value.map(|v| if v { yes } else { no })
}

impl CheckMessages {
    fn for_checks(checks: &Checks) -> Self {
        Self {
            fio_match: message(
                checks.fio_match,
                "Относится к заявителю",
                "Не относится к заявителю",
            ),
            doc_type_match: message(
                checks.doc_type_match,
                "Верный формат документа",
                "Неверный формат документа",
            ),
            doc_date_valid: message(
                checks.doc_date_valid,
                "Актуальная дата документа",
                "Устаревшая дата документа",
            ),
            single_doc_type_valid: message(
                checks.single_doc_type_valid,
                "Файл содержит один тип документа",
                "Файл содержит несколько типов документов",
            ),
            verdict: if checks.verdict() {
                "Отсрочка активирована: прикрепленный документ успешно прошел проверку"
            } else {
                "К сожалению, Вам отказано в отсрочке: прикрепленный документ не прошел проверку"
            },
        }
    }
}

/// Everything needed to audit a verdict without re-running the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub inputs: DiagnosticInputs,
    pub normalization: DiagnosticNormalization,
    pub scores: DiagnosticScores,
    pub timing: DiagnosticTiming,
    pub messages: CheckMessages,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticInputs {
    pub fio_expected: Option<String>,
    pub fio_extracted: Option<String>,
    pub doc_type_expected: Option<String>,
    pub doc_type_extracted: Option<String>,
    pub doc_date: Option<String>,
    pub single_doc_type: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticNormalization {
    pub fio_expected_norm: String,
    pub fio_extracted_norm: String,
    pub doc_type_expected_norm: String,
    pub doc_type_extracted_norm: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticScores {
    /// Similarity of the raw names after whitespace/case folding only.
    pub fio_similarity_raw: Option<f64>,
    /// Similarity after full normalization — the score the check uses.
    pub fio_similarity_normalized: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticTiming {
    pub evaluated_at: DateTime<FixedOffset>,
    pub doc_date_parsed: Option<NaiveDate>,
    pub validity_window_days: i64,
}

/// The validation record persisted as `validation.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRecord {
    pub checks: Checks,
    pub verdict: bool,
    pub diagnostics: Diagnostics,
}

/// Evaluate the four checks at a given instant. Pure; the instant is
/// injectable so tests pin the clock.
pub fn evaluate(
    meta: &MetadataSnapshot,
    merged: &MergedRecord,
    now: DateTime<FixedOffset>,
) -> ValidationRecord {
    let fio_expected_norm = normalize_name(meta.fio.as_deref().unwrap_or(""));
    let fio_extracted_norm = normalize_name(merged.fio.as_deref().unwrap_or(""));

    let score_normalized = if !fio_expected_norm.is_empty() && !fio_extracted_norm.is_empty() {
        Some(token_sort_ratio(&fio_expected_norm, &fio_extracted_norm))
    } else {
        None
    };
    let score_raw = match (meta.fio.as_deref(), merged.fio.as_deref()) {
        (Some(a), Some(b)) if !a.trim().is_empty() && !b.trim().is_empty() => {
            Some(token_sort_ratio(&fold_ws_case(a), &fold_ws_case(b)))
        }
        _ => None,
    };

    let fio_match = score_normalized.map(|score| {
        // Exact equality after normalization always matches, whatever the
        // scorer says.
        fio_expected_norm == fio_extracted_norm || score >= FIO_MATCH_THRESHOLD
    });

    let doc_type_expected_norm = fold_ws_case(meta.doc_type.as_deref().unwrap_or(""));
    let doc_type_extracted_norm = fold_ws_case(merged.doc_type.as_deref().unwrap_or(""));
    let doc_type_match = if !doc_type_expected_norm.is_empty() && !doc_type_extracted_norm.is_empty()
    {
        Some(doc_type_expected_norm == doc_type_extracted_norm)
    } else {
        None
    };

    let doc_date_parsed = merged.doc_date.as_deref().and_then(parse_doc_date);
    let doc_date_valid = doc_date_parsed.map(|d| is_within_validity_window(d, now));

    let checks = Checks {
        fio_match,
        doc_type_match,
        doc_date_valid,
        single_doc_type_valid: merged.single_doc_type,
    };
    let verdict = checks.verdict();

    let diagnostics = Diagnostics {
        inputs: DiagnosticInputs {
            fio_expected: meta.fio.clone(),
            fio_extracted: merged.fio.clone(),
            doc_type_expected: meta.doc_type.clone(),
            doc_type_extracted: merged.doc_type.clone(),
            doc_date: merged.doc_date.clone(),
            single_doc_type: merged.single_doc_type,
        },
        normalization: DiagnosticNormalization {
            fio_expected_norm,
            fio_extracted_norm,
            doc_type_expected_norm,
            doc_type_extracted_norm,
        },
        scores: DiagnosticScores {
            fio_similarity_raw: score_raw,
            fio_similarity_normalized: score_normalized,
        },
        timing: DiagnosticTiming {
            evaluated_at: now,
            doc_date_parsed,
            validity_window_days: VALIDITY_WINDOW_DAYS,
        },
        messages: CheckMessages::for_checks(&checks),
    };

    ValidationRecord {
        checks,
        verdict,
        diagnostics,
    }
}

/// Validate a run from its persisted artifacts and write `validation.json`.
pub fn validate_claim(
    meta_path: &Path,
    merged_path: &Path,
    output_path: &Path,
    now: DateTime<FixedOffset>,
) -> Result<ValidationRecord, ValidationError> {
    let meta: MetadataSnapshot = serde_json::from_str(&std::fs::read_to_string(meta_path)?)?;
    let merged_value: Value = serde_json::from_str(&std::fs::read_to_string(merged_path)?)?;
    let merged = MergedRecord::from_value(&merged_value);

    let record = evaluate(&meta, &merged, now);
    tracing::info!(
        verdict = record.verdict,
        fio_match = ?record.checks.fio_match,
        doc_type_match = ?record.checks.doc_type_match,
        doc_date_valid = ?record.checks.doc_date_valid,
        single_doc_type_valid = ?record.checks.single_doc_type_valid,
        "Validation complete"
    );

    std::fs::write(output_path, serde_json::to_string_pretty(&record)?)?;
    Ok(record)
}
