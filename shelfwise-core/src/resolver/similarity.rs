//! Gestalt (Ratcliff/Obershelp) string similarity.
//!
//! `ratio = 2 * M / T` where `T` is the combined length of both strings and
//! `M` the number of characters in matching blocks, found by taking the
//! longest common block and recursing on both sides of it.
//!
//! The second sequence is indexed; when it has 200 or more characters, any
//! character occurring in more than 1% of its positions (plus one) is left
//! out of the index, which speeds up long inputs at the cost of matching
//! through those characters only by extension.

use std::collections::HashMap;

const AUTOJUNK_MIN_LEN: usize = 200;

pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }
        if b.len() >= AUTOJUNK_MIN_LEN {
            let popular = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= popular);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` x `b[blo..bhi]` as `(i, j, size)`.
    ///
    /// Among equally long blocks the one starting earliest in `a` wins, then
    /// the one starting earliest in `b`.
    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = next;
        }

        // grow across characters left out of the index
        while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }

        (besti, bestj, bestsize)
    }

    /// Total size of all matching blocks.
    fn matching_characters(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        total
    }

    /// Similarity in `[0, 1]`; two empty strings are identical.
    pub fn ratio(&self) -> f64 {
        let length = self.a.len() + self.b.len();
        if length == 0 {
            return 1.0;
        }
        2.0 * self.matching_characters() as f64 / length as f64
    }

    /// Upper bound on `ratio()` from character multiset overlap.
    pub fn quick_ratio(&self) -> f64 {
        let length = self.a.len() + self.b.len();
        if length == 0 {
            return 1.0;
        }
        let mut available: HashMap<char, usize> = HashMap::new();
        for &c in &self.b {
            *available.entry(c).or_default() += 1;
        }
        let mut matches = 0usize;
        for c in &self.a {
            if let Some(n) = available.get_mut(c) {
                if *n > 0 {
                    *n -= 1;
                    matches += 1;
                }
            }
        }
        2.0 * matches as f64 / length as f64
    }

    /// Upper bound on `ratio()` from lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        let length = self.a.len() + self.b.len();
        if length == 0 {
            return 1.0;
        }
        2.0 * self.a.len().min(self.b.len()) as f64 / length as f64
    }
}

/// Similarity of `candidate` to `query`.
pub fn similarity(candidate: &str, query: &str) -> f64 {
    SequenceMatcher::new(candidate, query).ratio()
}

/// Up to `limit` candidates whose similarity to `query` is at least `cutoff`,
/// best first. Ties are ordered by candidate, descending.
pub fn close_matches<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    limit: usize,
    cutoff: f64,
) -> Vec<&'a str> {
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|candidate| {
            let matcher = SequenceMatcher::new(candidate, query);
            if matcher.real_quick_ratio() >= cutoff && matcher.quick_ratio() >= cutoff {
                let score = matcher.ratio();
                (score >= cutoff).then_some((score, candidate))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|x, y| y.0.total_cmp(&x.0).then_with(|| y.1.cmp(x.1)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, candidate)| candidate).collect()
}
