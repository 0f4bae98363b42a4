//! Fuzzy subsequence matching over todo titles.
//!
//! A query matches when its characters appear in order anywhere in the
//! candidate text. Scoring rewards runs of adjacent matches and matches
//! that start a word, so "gr" prefers "Groceries" over "Upgrade".

const MATCH_SCORE: i64 = 1;
const CONTIGUOUS_BONUS: i64 = 2;
const WORD_BOUNDARY_BONUS: i64 = 3;

/// One ranked corpus entry, by position in the input slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked {
    pub index: usize,
    pub score: i64,
}

/// Case-insensitive subsequence score. `None` means no match; an empty
/// query matches everything at score zero.
pub fn fuzzy_score(text: &str, query: &str) -> Option<i64> {
    let query: Vec<char> = query.trim().to_lowercase().chars().collect();
    if query.is_empty() {
        return Some(0);
    }
    let text: Vec<char> = text.to_lowercase().chars().collect();

    let mut score = 0i64;
    let mut query_pos = 0usize;
    let mut last_match: Option<usize> = None;
    for (pos, &ch) in text.iter().enumerate() {
        if ch != query[query_pos] {
            continue;
        }
        score += MATCH_SCORE;
        if last_match == Some(pos.wrapping_sub(1)) {
            score += CONTIGUOUS_BONUS;
        }
        if pos == 0 || matches!(text[pos - 1], ' ' | '-') {
            score += WORD_BOUNDARY_BONUS;
        }
        last_match = Some(pos);
        query_pos += 1;
        if query_pos == query.len() {
            return Some(score);
        }
    }
    None
}

/// Rank a corpus against a query: matches only, best score first, equal
/// scores kept in corpus order.
pub fn rank<T, F>(items: &[T], query: &str, text: F) -> Vec<Ranked>
where
    F: Fn(&T) -> &str,
{
    let mut hits: Vec<Ranked> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            fuzzy_score(text(item), query).map(|score| Ranked { index, score })
        })
        .collect();
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_and_contiguity_bonuses() {
        // 't' starts the text (1+3), 'l' starts a word after a space (1+3)
        assert_eq!(fuzzy_score("todo list", "tl"), Some(8));
        // 't' starts the text (1+3), 'o' is adjacent to it (1+2)
        assert_eq!(fuzzy_score("todo list", "to"), Some(7));
        // hyphen counts as a word break
        assert_eq!(fuzzy_score("follow-up", "fu"), Some(8));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(fuzzy_score("Groceries", "GR"), fuzzy_score("groceries", "gr"));
        assert!(fuzzy_score("Buy MILK", "milk").is_some());
    }

    #[test]
    fn out_of_order_characters_do_not_match() {
        assert_eq!(fuzzy_score("todo", "ot"), None);
        assert_eq!(fuzzy_score("short", "shortest"), None);
        assert_eq!(fuzzy_score("", "a"), None);
    }

    #[test]
    fn empty_query_matches_everything_at_zero() {
        assert_eq!(fuzzy_score("anything", ""), Some(0));
        assert_eq!(fuzzy_score("anything", "   "), Some(0));

        let corpus = ["one", "two", "three"];
        let ranked = rank(&corpus, "", |s| s);
        assert_eq!(
            ranked,
            vec![
                Ranked { index: 0, score: 0 },
                Ranked { index: 1, score: 0 },
                Ranked { index: 2, score: 0 },
            ]
        );
    }

    #[test]
    fn word_start_beats_mid_word_subsequence() {
        let corpus = ["Upgrade firmware", "Groceries"];
        let ranked = rank(&corpus, "gr", |s| s);
        assert_eq!(ranked[0].index, 1);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let corpus = ["alpha one", "alpha two", "beta"];
        let ranked = rank(&corpus, "alpha", |s| s);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[1].index, 1);
        assert_eq!(ranked[0].score, ranked[1].score);
    }

    #[test]
    fn non_matches_are_excluded() {
        let corpus = ["call mom", "write report"];
        let ranked = rank(&corpus, "zzz", |s| s);
        assert!(ranked.is_empty());
    }
}
