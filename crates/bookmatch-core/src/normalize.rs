use once_cell::sync::Lazy;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Simplified → traditional substitutions applied to CJK characters so that
/// the same title printed in either script variant normalizes identically.
static SIMPLIFIED_TO_TRADITIONAL: Lazy<HashMap<char, char>> = Lazy::new(|| {
    [
        ('传', '傳'),
        ('国', '國'),
        ('学', '學'),
        ('语', '語'),
        ('汇', '匯'),
        ('浒', '滸'),
        ('历', '歷'),
        ('经', '經'),
        ('应', '應'),
        ('业', '業'),
        ('单', '單'),
        ('双', '雙'),
        ('台', '臺'),
        ('体', '體'),
        ('丰', '豐'),
        ('书', '書'),
        ('东', '東'),
        ('认', '認'),
        ('办', '辦'),
        ('义', '義'),
        ('齐', '齊'),
        ('号', '號'),
        ('万', '萬'),
        ('与', '與'),
        ('队', '隊'),
    ]
    .into_iter()
    .collect()
});

/// CJK unified ideograph block (U+4E00–U+9FFF).
pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Canonical form used for every title comparison.
///
/// Steps (order matters):
/// 1. CJK characters go through the simplified → traditional table
/// 2. Everything else is NFKD-decomposed and stripped to ASCII, which drops
///    accents and folds full-width punctuation to its ASCII form
/// 3. Lowercase
/// 4. CJK text keeps CJK, ASCII alphanumerics and `: , ( )` (full-width
///    `：，（）` were folded and interpuncts dropped in step 2); Latin text
///    keeps only `[a-z0-9]`. Anything else becomes a space
/// 5. Collapse whitespace and trim
pub fn normalize(text: &str) -> String {
    // 1-2. Script-aware character folding
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        if is_cjk(c) {
            folded.push(*SIMPLIFIED_TO_TRADITIONAL.get(&c).unwrap_or(&c));
        } else {
            folded.extend(c.nfkd().filter(|d| d.is_ascii()));
        }
    }

    // 3. Lowercase (only ASCII letters remain outside the CJK block)
    let folded = folded.to_lowercase();

    // 4. Punctuation policy depends on the script
    let kept: String = if contains_cjk(&folded) {
        folded
            .chars()
            .map(|c| {
                if is_cjk(c) || c.is_ascii_alphanumeric() || matches!(c, ':' | ',' | '(' | ')') {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    } else {
        folded
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    };

    // 5. Collapse whitespace
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
