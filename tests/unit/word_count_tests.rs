/*!
 * Tests for mixed-script word counting
 */

use wordweave::processing::count_words;
use wordweave::processing::word_count::is_cjk;

#[test]
fn test_countWords_withEmptyOrSymbolOnlyText_shouldBeZero() {
    assert_eq!(count_words(""), 0);
    assert_eq!(count_words("   \n\t"), 0);
    assert_eq!(count_words("123 -- 456 !!"), 0);
}

#[test]
fn test_countWords_withPunctuatedLatin_shouldCountWordTokens() {
    assert_eq!(count_words("Hello, world! It's 5 o'clock."), 4);
}

#[test]
fn test_countWords_withHangulAndExtensionB_shouldCountAsCjk() {
    assert_eq!(count_words("안녕하세요"), 3);
    assert!(is_cjk('\u{20000}'));
    assert_eq!(count_words("\u{20000}\u{20001}"), 1);
}

#[test]
fn test_isCjk_shouldRejectLatinAndCyrillic() {
    assert!(!is_cjk('a'));
    assert!(!is_cjk('ж'));
    assert!(is_cjk('カ'));
}
