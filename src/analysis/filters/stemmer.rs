use rust_stemmers::{Algorithm, Stemmer};
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Tokens at or below this many characters are left unstemmed
const MIN_STEM_INPUT: usize = 3;
/// A stem shorter than this falls back to the original token
const MIN_STEM_OUTPUT: usize = 2;

pub struct StemmerFilter {
    pub algorithm: Algorithm,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter { algorithm }
    }

    pub fn english() -> Self {
        StemmerFilter::new(Algorithm::English)
    }

    pub fn stem_word(stemmer: &Stemmer, word: &str) -> String {
        if word.chars().count() <= MIN_STEM_INPUT {
            return word.to_string();
        }
        let stemmed = stemmer.stem(word);
        if stemmed.chars().count() >= MIN_STEM_OUTPUT {
            stemmed.into_owned()
        } else {
            word.to_string()
        }
    }
}

impl TokenFilter for StemmerFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let stemmer = Stemmer::create(self.algorithm);

        tokens.into_iter()
            .map(|mut token| {
                token.text = StemmerFilter::stem_word(&stemmer, &token.text);
                token.length = token.text.len();
                token
            })
            .collect()
    }

    fn name(&self) -> &str {
        "stemmer"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(StemmerFilter {
            algorithm: self.algorithm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_words_untouched() {
        let stemmer = Stemmer::create(Algorithm::English);
        assert_eq!(StemmerFilter::stem_word(&stemmer, "ran"), "ran");
        assert_eq!(StemmerFilter::stem_word(&stemmer, "ies"), "ies");
    }

    #[test]
    fn test_inflections_share_stem() {
        let stemmer = Stemmer::create(Algorithm::English);
        let a = StemmerFilter::stem_word(&stemmer, "learning");
        let b = StemmerFilter::stem_word(&stemmer, "learned");
        assert_eq!(a, "learn");
        assert_eq!(a, b);
    }
}
