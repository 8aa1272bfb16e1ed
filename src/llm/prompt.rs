//! Instruction templates for the two agents.
//!
//! Templates are immutable configuration data: agents receive them at
//! construction (tests substitute fixed ones) and render them with exactly
//! one `{input}` substitution, so identical page sets produce identical
//! prompts.

/// Placeholder replaced — once — with the serialized OCR page set.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// The closed set of claim document classifications the extractor may emit.
/// Also embedded verbatim in the extraction template.
pub const DOC_CLASSIFICATIONS: &[&str] = &[
    "Лист временной нетрудоспособности (больничный лист)",
    "Приказ о выходе в декретный отпуск по уходу за ребенком",
    "Справка о выходе в декретный отпуск по уходу за ребенком",
    "Выписка из стационара (выписной эпикриз)",
    "Больничный лист на сопровождающего (если предусмотрено)",
    "Заключение врачебно-консультативной комиссии (ВКК)",
    "Справка об инвалидности",
    "Справка о степени утраты общей трудоспособности",
    "Приказ/Справка о расторжении трудового договора",
    "Справка о регистрации в качестве безработного",
    "Приказ работодателя о предоставлении отпуска без сохранения заработной платы",
    "Справка о неполучении доходов",
    "Уведомление о регистрации в качестве лица, ищущего работу",
    "Лица, зарегистрированные в качестве безработных",
];

/// Field-extraction instruction.
pub const EXTRACTION_TEMPLATE: &str = r#"
You are an expert in multilingual document information extraction and normalization.
Your task is to analyze a noisy OCR text that may contain both Kazakh and Russian fragments.

Follow these steps precisely before producing the final JSON:

STEP 1 — UNDERSTAND THE TASK
You must extract the following information:
- fio: full name of the person (e.g. **Иванов Иван Иванович**)
- doc_type: if document matches one of the known templates, classify it as one of:
  - "Лист временной нетрудоспособности (больничный лист)"
  - "Приказ о выходе в декретный отпуск по уходу за ребенком"
  - "Справка о выходе в декретный отпуск по уходу за ребенком"
  - "Выписка из стационара (выписной эпикриз)"
  - "Больничный лист на сопровождающего (если предусмотрено)"
  - "Заключение врачебно-консультативной комиссии (ВКК)"
  - "Справка об инвалидности"
  - "Справка о степени утраты общей трудоспособности"
  - "Приказ/Справка о расторжении трудового договора"
  - "Справка о регистрации в качестве безработного"
  - "Приказ работодателя о предоставлении отпуска без сохранения заработной платы"
  - "Справка о неполучении доходов"
  - "Уведомление о регистрации в качестве лица, ищущего работу"
  - "Лица, зарегистрированные в качестве безработных"
  - null
- doc_date: main issuance date (convert to format DD.MM.YYYY)

STEP 2 — EXTRACTION RULES
- If several dates exist, choose the main issuance date (usually near header or "№").
- Ignore duplicates or minor typos.
- When the value is missing, set it strictly to `null`.
- Do not invent or assume missing data.
- If both Russian and Kazakh versions exist, output result in Russian.

STEP 3 — THINK BEFORE ANSWERING
Double-check:
- Is fio complete (Фамилия Имя Отчество)?
- Is doc_date formatted as DD.MM.YYYY?
- Are there exactly 3 keys in the final JSON?
- Is doc_type one of the allowed options or null?

STEP 4 — OUTPUT STRICTLY IN THIS JSON FORMAT (no explanations, no extra text, no Markdown formatting, and no ```json formatting)
{
  "fio": string | null,
  "doc_type": string | null,
  "doc_date": string | null
}

Text for analysis:
{input}
"#;

/// Single-vs-multiple document-type instruction.
pub const DOC_TYPE_TEMPLATE: &str = r#"
You are an **ultra-precise OCR document-type classifier**.

Your task: Decide if the provided OCR text represents **one single document type** or **multiple distinct document types**.

Return **strictly** one JSON object:
{"single_doc_type": true}
or
{"single_doc_type": false}

### PRIMARY OBJECTIVE
Focus on the *purpose* and *issuer* of the document — not formatting, duplication, or noise.
You must be conservative: only output `false` if there is **clear and explicit** evidence that more than one separate document exists.

### RULE HIERARCHY (most important first)
1. **Default to true.** If it is not obvious that multiple documents exist, output `true`.
2. **Ignore all OCR noise**, random English words, partial lines, numbers, or page fragments. These are NOT indicators of a second document.
3. **Ignore repetition** of headers, bilingual text (Kazakh/Russian), stamps, or partial duplicates — they belong to the same document.
4. **Output false only if** you detect at least one of the following:
   - Two or more different document names (e.g., "ПРИКАЗ" and "СПРАВКА").
   - Two distinct issuers or organizations (e.g., different ministries or companies).
   - Two unrelated people or identifiers (e.g., two different names or form numbers with unrelated context).
   - Two clearly separate document purposes (e.g., employment order vs. medical certificate).
5. **Do not overfit to surface noise.** Assume OCR outputs are messy and incomplete — reason at the semantic level.

### EXAMPLES
true:
- "БҰЙРЫҚ / ПРИКАЗ" bilingual duplicate of one order.
- Medical form with OCR garbage like "AMERICAN", "STATE", "Repair".
- Repeated header due to scanning errors.

false:
- "ПРИКАЗ" followed by "СПРАВКА" (two unrelated forms).
- Two separate letters, each signed by a different person.
- One page refers to an employment order, another to a marriage certificate.

### OUTPUT REQUIREMENTS
- Respond **only** with:
  {"single_doc_type": true}
  or
  {"single_doc_type": false}
- No explanations, no text before or after, no additional symbols.

OCR INPUT:
{input}
"#;

/// Render a template with the serialized page set. Exactly one substitution.
pub fn render_prompt(template: &str, pages_json: &str) -> String {
    template.replacen(INPUT_PLACEHOLDER, pages_json, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_carry_exactly_one_placeholder() {
        assert_eq!(EXTRACTION_TEMPLATE.matches(INPUT_PLACEHOLDER).count(), 1);
        assert_eq!(DOC_TYPE_TEMPLATE.matches(INPUT_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn render_substitutes_once() {
        let rendered = render_prompt("before {input} after {input}", "DATA");
        assert_eq!(rendered, "before DATA after {input}");
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_prompt(EXTRACTION_TEMPLATE, r#"{"pages":[]}"#);
        let b = render_prompt(EXTRACTION_TEMPLATE, r#"{"pages":[]}"#);
        assert_eq!(a, b);
        assert!(a.contains(r#"{"pages":[]}"#));
    }

    #[test]
    fn classification_list_matches_template() {
        for class in DOC_CLASSIFICATIONS {
            assert!(
                EXTRACTION_TEMPLATE.contains(class),
                "template missing classification: {class}"
            );
        }
        assert_eq!(DOC_CLASSIFICATIONS.len(), 14);
    }
}
