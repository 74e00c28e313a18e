//! Tokenizers used by the scorer.
//!
//! Two roles, two traits:
//! - [`WordTokenizer`] is the morphological tokenizer that produces the `word_count`
//!   of an answer. It must segment text without whitespace word boundaries.
//!   [`IpadicTokenizer`] runs a full morphological analysis; the offline
//!   [`SegmentingTokenizer`] does longest-match over CJK runs with a small lexicon.
//! - [`TextTokenizer`] is the natural-language word splitter used for BLEU n-grams.
//!
//! Both are injected into [`ScoreCalculator`](crate::scoring::ScoreCalculator) so tests
//! (and hosts with a real morphological analyzer) can substitute their own.

use crate::error::{LexiconError, ScoringError};
use lindera::dictionary::{DictionaryKind, load_dictionary_from_kind};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use lindera::tokenizer::Tokenizer;
use std::collections::HashSet;
use std::path::Path;

/// Morphological tokenizer used for word counts.
pub trait WordTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, ScoringError>;

    fn name(&self) -> &str;
}

/// Word splitter used for n-gram metrics.
pub trait TextTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, ScoringError>;

    fn name(&self) -> &str;

    /// Capability probe run once when a calculator is built.
    fn is_available(&self) -> bool {
        self.tokenize("the cat sat on the mat")
            .is_ok_and(|tokens| !tokens.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

/// Common Japanese words shipped with the built-in segmenter.
const BUILTIN_WORDS: &[&str] = &[
    // particles and auxiliaries
    "は", "が", "を", "に", "で", "と", "の", "も", "へ", "や", "か", "な", "ね", "よ",
    "から", "まで", "より", "など", "だけ", "です", "ます", "でした", "ました", "ません",
    "である", "ない", "たい", "られる", "れる", "ください",
    // common verbs
    "する", "します", "した", "して", "いる", "います", "ある", "あります", "なる",
    "なります", "できる", "できます", "使う", "使います", "言う", "思う", "思います",
    // demonstratives and function nouns
    "これ", "それ", "あれ", "どれ", "この", "その", "あの", "どの", "こと", "もの",
    "ため", "よう", "とき", "ところ",
    // common content words
    "私", "日本", "日本語", "東京", "大阪", "関西", "国際", "空港", "質問", "回答",
    "答え", "正解", "説明", "意味", "機械", "学習", "機械学習", "深層", "深層学習",
    "人工", "知能", "人工知能", "言語", "自然", "自然言語", "処理", "情報", "技術",
    "計算", "計算機", "問題", "方法", "場合", "時間", "今日", "明日", "世界", "社会",
    "仕組み", "量子", "暗号", "分散", "台帳", "開発", "利用", "目的", "特徴",
];

/// Word list for dictionary-based segmentation.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
    max_chars: usize,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded Japanese word list.
    pub fn builtin() -> Self {
        Self::from_words(BUILTIN_WORDS.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lexicon = Self::new();
        lexicon.extend(words);
        lexicon
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for word in words {
            let word: String = word.into();
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            self.max_chars = self.max_chars.max(word.chars().count());
            self.words.insert(word.to_string());
        }
    }

    /// Add words from a file with one word per line (`#` starts a comment line).
    pub fn extend_from_file(&mut self, path: &Path) -> Result<(), LexiconError> {
        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let before = self.words.len();
        self.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        );
        tracing::debug!(
            path = %path.display(),
            added = self.words.len() - before,
            "Loaded lexicon entries"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Length in chars of the longest lexicon word that prefixes `chars`.
    fn longest_match(&self, chars: &[char]) -> Option<usize> {
        let limit = self.max_chars.min(chars.len());
        let mut prefix: String = chars[..limit].iter().collect();
        for len in (1..=limit).rev() {
            if self.words.contains(prefix.as_str()) {
                return Some(len);
            }
            prefix.pop();
        }
        None
    }
}

// ---------------------------------------------------------------------------
// IPADIC morphological analyzer (word counts)
// ---------------------------------------------------------------------------

/// Morphological analyzer backed by the IPADIC dictionary compiled into the binary.
///
/// Whitespace tokens emitted by the analyzer are dropped so that spacing does
/// not change the count; punctuation tokens are kept.
pub struct IpadicTokenizer {
    inner: Tokenizer,
}

impl IpadicTokenizer {
    pub fn new() -> Result<Self, LexiconError> {
        let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC).map_err(|e| {
            LexiconError::Dictionary {
                dictionary: "ipadic",
                message: e.to_string(),
            }
        })?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        Ok(Self {
            inner: Tokenizer::new(segmenter),
        })
    }
}

impl std::fmt::Debug for IpadicTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpadicTokenizer").finish_non_exhaustive()
    }
}

impl WordTokenizer for IpadicTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, ScoringError> {
        let tokens = self
            .inner
            .tokenize(text)
            .map_err(|e| ScoringError::Tokenizer {
                tokenizer: "ipadic".into(),
                message: e.to_string(),
            })?;
        Ok(tokens
            .iter()
            .map(|token| token.text.as_ref())
            .filter(|surface| !surface.trim().is_empty())
            .map(String::from)
            .collect())
    }

    fn name(&self) -> &str {
        "ipadic"
    }
}

// ---------------------------------------------------------------------------
// Segmenting tokenizer (offline word counts)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Han,
    Hiragana,
    Katakana,
    Word,
    Space,
    Symbol,
}

impl Script {
    fn of(c: char) -> Self {
        match c {
            '\u{3040}'..='\u{309F}' => Script::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
                Script::Katakana
            }
            '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}' | '々' => {
                Script::Han
            }
            c if c.is_whitespace() => Script::Space,
            c if c.is_alphanumeric() || c == '_' => Script::Word,
            _ => Script::Symbol,
        }
    }
}

/// Dictionary-based segmenter for mixed Latin/Japanese text.
///
/// Whitespace is skipped, each punctuation character is its own token, runs of
/// Latin letters and digits form one token, and CJK runs are split by forward
/// longest match against the [`Lexicon`]. Unknown Katakana runs stay together
/// (loanwords); other unknown CJK characters become single-character tokens.
#[derive(Debug, Clone)]
pub struct SegmentingTokenizer {
    lexicon: Lexicon,
}

impl Default for SegmentingTokenizer {
    fn default() -> Self {
        Self::new(Lexicon::builtin())
    }
}

impl SegmentingTokenizer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn segment(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let script = Script::of(chars[i]);
            let len = match script {
                Script::Space => {
                    i += 1;
                    continue;
                }
                Script::Symbol => 1,
                Script::Word => run_length(&chars[i..], |s| s == Script::Word),
                _ => match self.lexicon.longest_match(&chars[i..]) {
                    Some(len) => len,
                    None if script == Script::Katakana => {
                        run_length(&chars[i..], |s| s == Script::Katakana)
                    }
                    None => 1,
                },
            };
            tokens.push(chars[i..i + len].iter().collect());
            i += len;
        }

        tokens
    }
}

fn run_length(chars: &[char], keep: impl Fn(Script) -> bool) -> usize {
    chars
        .iter()
        .take_while(|&&c| keep(Script::of(c)))
        .count()
        .max(1)
}

impl WordTokenizer for SegmentingTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, ScoringError> {
        Ok(self.segment(text))
    }

    fn name(&self) -> &str {
        "segmenting"
    }
}

/// Counts whitespace-separated chunks. Suited to space-delimited languages only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl WordTokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, ScoringError> {
        Ok(text.split_whitespace().map(String::from).collect())
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

// ---------------------------------------------------------------------------
// Treebank-style tokenizer (BLEU)
// ---------------------------------------------------------------------------

const CONTRACTION_SUFFIXES: &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Penn Treebank-style word splitter.
///
/// Splits on whitespace, peels punctuation off both ends of every chunk into
/// separate tokens, and splits English contractions (`don't` → `do n't`,
/// `it's` → `it 's`). Commas and colons not followed by a digit are split out
/// inside words too (`a,b` but not `1,000`), and double quotes become
/// ``` `` ``` when opening and `''` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreebankTokenizer;

impl TreebankTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Space out inner separators and rewrite double quotes.
    fn pad_separators(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 8);
        let mut prev: Option<char> = None;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    let opening = prev
                        .is_none_or(|p| p.is_whitespace() || matches!(p, '(' | '[' | '{' | '<'));
                    out.push_str(if opening { " `` " } else { " '' " });
                }
                ',' | ':' if !chars.peek().is_some_and(char::is_ascii_digit) => {
                    out.push(' ');
                    out.push(c);
                    out.push(' ');
                }
                _ => out.push(c),
            }
            prev = Some(c);
        }
        out
    }

    fn split_chunk(chunk: &str, out: &mut Vec<String>) {
        if chunk == "``" || chunk == "''" {
            out.push(chunk.to_string());
            return;
        }
        let is_edge_punct = |c: char| !(c.is_alphanumeric() || c == '_');

        let core_start = chunk
            .char_indices()
            .find(|&(_, c)| !is_edge_punct(c))
            .map(|(i, _)| i);
        let Some(core_start) = core_start else {
            // Chunk is all punctuation.
            out.extend(chunk.chars().map(String::from));
            return;
        };
        let core_end = chunk
            .char_indices()
            .rev()
            .find(|&(_, c)| !is_edge_punct(c))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(chunk.len());

        out.extend(chunk[..core_start].chars().map(String::from));
        Self::split_contraction(&chunk[core_start..core_end], out);
        out.extend(chunk[core_end..].chars().map(String::from));
    }

    fn split_contraction(word: &str, out: &mut Vec<String>) {
        let split_at = CONTRACTION_SUFFIXES.iter().find_map(|suffix| {
            let split = word.len().checked_sub(suffix.len()).filter(|&s| s > 0)?;
            let tail = word.get(split..)?;
            tail.eq_ignore_ascii_case(suffix).then_some(split)
        });
        match split_at {
            Some(split) => {
                out.push(word[..split].to_string());
                out.push(word[split..].to_string());
            }
            None => out.push(word.to_string()),
        }
    }
}

impl TextTokenizer for TreebankTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, ScoringError> {
        let mut tokens = Vec::new();
        for chunk in Self::pad_separators(text).split_whitespace() {
            Self::split_chunk(chunk, &mut tokens);
        }
        Ok(tokens)
    }

    fn name(&self) -> &str {
        "treebank"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(tokens: &[String]) -> Vec<&str> {
        tokens.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_segmenting_latin_text() {
        let t = SegmentingTokenizer::default();
        let tokens = t.tokenize("Hello, world! 42 times").unwrap();
        assert_eq!(words(&tokens), vec!["Hello", ",", "world", "!", "42", "times"]);
    }

    #[test]
    fn test_segmenting_japanese_longest_match() {
        let t = SegmentingTokenizer::default();
        let tokens = t.tokenize("機械学習は人工知能です").unwrap();
        assert_eq!(words(&tokens), vec!["機械学習", "は", "人工知能", "です"]);
    }

    #[test]
    fn test_segmenting_unknown_katakana_run() {
        let t = SegmentingTokenizer::default();
        let tokens = t.tokenize("ブロックチェーンの仕組み").unwrap();
        assert_eq!(words(&tokens), vec!["ブロックチェーン", "の", "仕組み"]);
    }

    #[test]
    fn test_segmenting_unknown_han_falls_back_to_chars() {
        let t = SegmentingTokenizer::new(Lexicon::new());
        let tokens = t.tokenize("猫犬").unwrap();
        assert_eq!(words(&tokens), vec!["猫", "犬"]);
    }

    #[test]
    fn test_segmenting_empty() {
        let t = SegmentingTokenizer::default();
        assert!(t.tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_lexicon_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "# custom\n猫犬\n\n").unwrap();

        let mut lexicon = Lexicon::new();
        lexicon.extend_from_file(&path).unwrap();
        assert_eq!(lexicon.len(), 1);

        let t = SegmentingTokenizer::new(lexicon);
        assert_eq!(words(&t.tokenize("猫犬").unwrap()), vec!["猫犬"]);
    }

    #[test]
    fn test_lexicon_missing_file() {
        let mut lexicon = Lexicon::new();
        let err = lexicon
            .extend_from_file(Path::new("/nonexistent/lexicon.txt"))
            .unwrap_err();
        assert!(matches!(err, LexiconError::Read { .. }));
    }

    #[test]
    fn test_treebank_punctuation() {
        let tokens = TreebankTokenizer.tokenize("Hello, world. (really)").unwrap();
        assert_eq!(
            words(&tokens),
            vec!["Hello", ",", "world", ".", "(", "really", ")"]
        );
    }

    #[test]
    fn test_treebank_contractions() {
        let tokens = TreebankTokenizer.tokenize("don't stop, it's fine").unwrap();
        assert_eq!(
            words(&tokens),
            vec!["do", "n't", "stop", ",", "it", "'s", "fine"]
        );
    }

    #[test]
    fn test_treebank_inner_punctuation_kept() {
        let tokens = TreebankTokenizer.tokenize("state-of-the-art e.g.").unwrap();
        assert_eq!(words(&tokens), vec!["state-of-the-art", "e.g", "."]);
    }

    #[test]
    fn test_treebank_inner_commas() {
        let tokens = TreebankTokenizer
            .tokenize("hello,world costs 1,000 yen: ok")
            .unwrap();
        assert_eq!(
            words(&tokens),
            vec!["hello", ",", "world", "costs", "1,000", "yen", ":", "ok"]
        );
    }

    #[test]
    fn test_treebank_double_quotes() {
        let tokens = TreebankTokenizer.tokenize(r#"He said "hi" ("ok")"#).unwrap();
        assert_eq!(
            words(&tokens),
            vec!["He", "said", "``", "hi", "''", "(", "``", "ok", "''", ")"]
        );
    }

    #[test]
    fn test_treebank_is_available() {
        assert!(TreebankTokenizer.is_available());
    }

    #[test]
    fn test_lexicon_longest_match_prefers_longest() {
        let lexicon = Lexicon::from_words(["人工", "人工知能"]);
        let chars: Vec<char> = "人工知能です".chars().collect();
        assert_eq!(lexicon.longest_match(&chars), Some(4));
        let chars: Vec<char> = "人工呼吸".chars().collect();
        assert_eq!(lexicon.longest_match(&chars), Some(2));
        let chars: Vec<char> = "猫".chars().collect();
        assert_eq!(lexicon.longest_match(&chars), None);
    }

    #[test]
    fn test_ipadic_segments_words_outside_lexicon() {
        let t = IpadicTokenizer::new().unwrap();
        assert_eq!(
            words(&t.tokenize("猫が好きです").unwrap()),
            vec!["猫", "が", "好き", "です"]
        );
        assert_eq!(
            words(&t.tokenize("彼は新しい本を読んでいる").unwrap()),
            vec!["彼", "は", "新しい", "本", "を", "読ん", "で", "いる"]
        );
        assert_eq!(t.tokenize("機械学習は人工知能です").unwrap().len(), 6);
    }

    #[test]
    fn test_ipadic_ignores_whitespace() {
        let t = IpadicTokenizer::new().unwrap();
        assert!(t.tokenize("  \n ").unwrap().is_empty());
        assert_eq!(
            t.tokenize("猫 が 好き です").unwrap(),
            t.tokenize("猫が好きです").unwrap()
        );
    }
}
