/*!
 * Word-count estimation for mixed-script text.
 *
 * Latin tokens count as one word each; CJK characters count half a word
 * (two characters carry roughly the information of one Latin word), rounded
 * up. The estimate only needs to be consistent across segments.
 */

/// Whether `c` belongs to a CJK script (Han, kana, Hangul)
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF     // Hiragana, Katakana
        | 0x3400..=0x4DBF   // CJK Extension A
        | 0x4E00..=0x9FFF   // CJK Unified Ideographs
        | 0xAC00..=0xD7AF   // Hangul syllables
        | 0xF900..=0xFAFF   // CJK Compatibility Ideographs
        | 0x20000..=0x2A6DF // CJK Extension B
    )
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c as u32, 0x00C0..=0x024F if c.is_alphabetic())
}

/// Estimate the number of words in `text`
pub fn count_words(text: &str) -> usize {
    let cjk_chars = text.chars().filter(|c| is_cjk(*c)).count();
    let latin_words = text
        .split_whitespace()
        .filter(|token| token.chars().any(is_latin_letter))
        .count();

    latin_words + cjk_chars.div_ceil(2)
}
