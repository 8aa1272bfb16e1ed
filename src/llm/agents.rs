use super::prompt::{render_prompt, DOC_TYPE_TEMPLATE, EXTRACTION_TEMPLATE};
use super::{LlmClient, LlmError};
use crate::ocr::PageSet;

/// Expected keys of the field-extraction response.
pub const EXTRACTION_KEYS: &[&str] = &["fio", "doc_type", "doc_date"];

/// Expected key of the doc-type check response.
pub const DOC_TYPE_KEYS: &[&str] = &["single_doc_type"];

/// Thin caller over the LLM collaborator: render one prompt, make one call,
/// hand back the raw response text. No parsing and no retries here — a
/// repeated call costs money and may extract differently, so transport
/// failures surface as stage errors instead.
pub struct Agent<'a> {
    llm: &'a dyn LlmClient,
    template: &'a str,
    name: &'static str,
}

impl<'a> Agent<'a> {
    /// Field-extraction agent with the production template.
    pub fn extractor(llm: &'a dyn LlmClient) -> Self {
        Self {
            llm,
            template: EXTRACTION_TEMPLATE,
            name: "extractor",
        }
    }

    /// Doc-type checker agent with the production template.
    pub fn doc_type_checker(llm: &'a dyn LlmClient) -> Self {
        Self {
            llm,
            template: DOC_TYPE_TEMPLATE,
            name: "doc_type_checker",
        }
    }

    /// Same agent with a substituted template, for deterministic tests.
    pub fn with_template(mut self, template: &'a str) -> Self {
        self.template = template;
        self
    }

    /// One rendered prompt, one call, raw text out.
    pub fn ask(&self, pages: &PageSet) -> Result<String, LlmError> {
        let prompt = render_prompt(self.template, &pages.to_json());
        tracing::debug!(agent = self.name, prompt_len = prompt.len(), "Calling LLM");
        self.llm.complete(&prompt)
    }
}
