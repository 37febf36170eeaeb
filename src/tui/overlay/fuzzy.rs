//! Fuzzy scoring for the command palette.

/// Score `text` against `query`, case-insensitively. `None` means no match.
///
/// A substring hit scores 100 plus bonuses for matching at the start, after
/// a word separator, covering the whole text, or matching case exactly.
/// Otherwise the query characters must appear in order: 10 per character,
/// 5 more when adjacent to the previous hit, 15 more after a non-letter.
pub fn fuzzy_score(query: &str, text: &str) -> Option<i64> {
    if query.is_empty() {
        return Some(0);
    }

    let q: Vec<char> = query.to_lowercase().chars().collect();
    let t: Vec<char> = text.to_lowercase().chars().collect();

    if let Some(index) = find_chars(&t, &q) {
        let mut score = 100;
        if index == 0 {
            score += 50;
        } else if matches!(t[index - 1], ' ' | '_' | '-') {
            score += 25;
        }
        if q.len() == t.len() {
            score += 50;
        }
        if text.contains(query) {
            score += 10;
        }
        return Some(score);
    }

    let mut score = 0;
    let mut qi = 0;
    let mut last_match: Option<usize> = None;
    for (i, &c) in t.iter().enumerate() {
        if qi == q.len() {
            break;
        }
        if c != q[qi] {
            continue;
        }
        score += 10;
        if i > 0 && last_match == Some(i - 1) {
            score += 5;
        }
        if i == 0 || !t[i - 1].is_alphabetic() {
            score += 15;
        }
        last_match = Some(i);
        qi += 1;
    }

    (qi == q.len()).then_some(score)
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Rank `(name, description)` pairs: `max(name, 0) + description / 2`.
/// Entries where neither field matches are dropped. Ties keep input order.
pub fn rank<'a, I>(query: &str, items: I) -> Vec<(usize, i64)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut scored: Vec<(usize, i64)> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, (name, description))| {
            let name_score = fuzzy_score(query, name);
            let desc_score = fuzzy_score(query, description);
            if name_score.is_none() && desc_score.is_none() {
                return None;
            }
            let score = name_score.unwrap_or(0).max(0) + desc_score.unwrap_or(0) / 2;
            Some((index, score))
        })
        .collect();
    // stable: equal scores stay in registration order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}
