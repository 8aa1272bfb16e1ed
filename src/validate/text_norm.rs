//! Name normalization and similarity scoring for cross-script comparison.
//!
//! Claim names arrive in mixed Kazakh/Russian Cyrillic, with occasional
//! Latin look-alikes from OCR or keyboard switching. Both sides of a
//! comparison go through the same normalization so the scorer only sees
//! genuine differences.

/// Collapse whitespace runs to single spaces, trim, and casefold.
pub fn fold_ws_case(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .flat_map(char::to_lowercase)
        .collect()
}

/// Transliterate Kazakh-specific Cyrillic letters to their nearest Russian
/// Cyrillic counterparts.
pub fn kz_to_ru(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'қ' => 'к',
            'ұ' | 'ү' => 'у',
            'ң' => 'н',
            'ғ' => 'г',
            'ө' => 'о',
            'Қ' => 'К',
            'Ұ' | 'Ү' => 'У',
            'Ң' => 'Н',
            'Ғ' => 'Г',
            'Ө' => 'О',
            other => other,
        })
        .collect()
}

/// Map visually confusable Latin letters to their Cyrillic look-alikes.
pub fn latin_to_cyrillic(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a' => 'а',
            'e' => 'е',
            'o' => 'о',
            'p' => 'р',
            'c' => 'с',
            'y' => 'у',
            'x' => 'х',
            'k' => 'к',
            'h' => 'н',
            'b' => 'в',
            'm' => 'м',
            't' => 'т',
            'i' => 'и',
            'A' => 'А',
            'E' => 'Е',
            'O' => 'О',
            'P' => 'Р',
            'C' => 'С',
            'Y' => 'У',
            'X' => 'Х',
            'K' => 'К',
            'H' => 'Н',
            'B' => 'В',
            'M' => 'М',
            'T' => 'Т',
            'I' => 'И',
            other => other,
        })
        .collect()
}

/// Full name normalization: fold whitespace and case, then transliterate.
/// Idempotent — normalizing an already-normalized name is a no-op.
pub fn normalize_name(s: &str) -> String {
    latin_to_cyrillic(&kz_to_ru(&fold_ws_case(s)))
}

/// Token-order-insensitive similarity on a 0-100 scale.
///
/// Both sides are split into whitespace tokens, sorted, and rejoined; the
/// sorted strings are then compared with a normalized indel ratio
/// (`200·lcs / (|a|+|b|)`). Equal token multisets score 100.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted_a = sort_tokens(a);
    let sorted_b = sort_tokens(b);
    indel_ratio(&sorted_a, &sorted_b)
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Normalized indel similarity over characters, 0-100.
fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Longest-common-subsequence length, two-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
