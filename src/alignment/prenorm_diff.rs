use crate::error::AlignmentError;
use crate::types::PrenormPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffOp<'a> {
    Equal(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

/// Pairs each original word with its abbreviation expansion.
///
/// Words common to both sides (by longest common subsequence) map to themselves.
/// Each run of changed words becomes one or more pairs: equal-sized runs are zipped,
/// otherwise expansion words are handed out greedily by matching the abbreviation's
/// letters against their first characters (see [`split_changed_run`]). Pure insertions
/// are appended to the neighbouring pair; a pure deletion cannot be paired and is an
/// error.
pub fn extract_prenorm_pairs(
    original: &[&str],
    expanded: &[&str],
) -> Result<Vec<PrenormPair>, AlignmentError> {
    let ops = diff_words(original, expanded);

    let mut pairs: Vec<PrenormPair> = Vec::with_capacity(original.len());
    let mut deleted: Vec<&str> = Vec::new();
    let mut inserted: Vec<&str> = Vec::new();
    let mut pending_prefix: Vec<&str> = Vec::new();

    for op in ops {
        match op {
            DiffOp::Delete(word) => deleted.push(word),
            DiffOp::Insert(word) => inserted.push(word),
            DiffOp::Equal(word) => {
                flush_run(&mut pairs, &mut deleted, &mut inserted, &mut pending_prefix)?;
                push_pair(&mut pairs, &mut pending_prefix, PrenormPair::new(word, word));
            }
        }
    }
    flush_run(&mut pairs, &mut deleted, &mut inserted, &mut pending_prefix)?;

    if !pending_prefix.is_empty() {
        // Nothing on the original side at all.
        return Err(AlignmentError::unmatched(
            "",
            pending_prefix.join(" "),
            "no original word to attach the expansion to",
        ));
    }
    Ok(pairs)
}

/// Convenience wrapper splitting both sentences on whitespace.
pub fn extract_prenorm_pairs_from_text(
    original: &str,
    expanded: &str,
) -> Result<Vec<PrenormPair>, AlignmentError> {
    let original: Vec<&str> = original.split_whitespace().collect();
    let expanded: Vec<&str> = expanded.split_whitespace().collect();
    extract_prenorm_pairs(&original, &expanded)
}

fn push_pair(pairs: &mut Vec<PrenormPair>, pending_prefix: &mut Vec<&str>, mut pair: PrenormPair) {
    if !pending_prefix.is_empty() {
        let mut expanded = pending_prefix.join(" ");
        expanded.push(' ');
        expanded.push_str(&pair.expanded);
        pair.expanded = expanded;
        pending_prefix.clear();
    }
    pairs.push(pair);
}

fn flush_run<'a>(
    pairs: &mut Vec<PrenormPair>,
    deleted: &mut Vec<&'a str>,
    inserted: &mut Vec<&'a str>,
    pending_prefix: &mut Vec<&'a str>,
) -> Result<(), AlignmentError> {
    match (deleted.is_empty(), inserted.is_empty()) {
        (true, true) => {}
        (true, false) => {
            tracing::debug!(
                inserted = inserted.join(" ").as_str(),
                "prenorm diff: pure insertion attached to neighbouring word"
            );
            match pairs.last_mut() {
                Some(last) => {
                    last.expanded.push(' ');
                    last.expanded.push_str(&inserted.join(" "));
                }
                None => pending_prefix.extend(inserted.iter().copied()),
            }
        }
        (false, true) => {
            return Err(AlignmentError::unmatched(
                deleted.join(" "),
                "",
                "original words deleted without expansion",
            ));
        }
        (false, false) => {
            for pair in split_changed_run(deleted, inserted) {
                push_pair(pairs, pending_prefix, pair);
            }
        }
    }
    deleted.clear();
    inserted.clear();
    Ok(())
}

/// Splits a run of `keys` replaced by `values` into per-key pairs.
///
/// Equal counts zip positionally. With more values than keys, each key takes one value
/// and then keeps taking values while the next letter group of the key (the key split
/// on `.`, trailing period stripped) starts with the value's first character, always
/// leaving at least one value per remaining key; the last key takes the rest. With
/// fewer values than keys the run stays one grouped pair.
fn split_changed_run(keys: &[&str], values: &[&str]) -> Vec<PrenormPair> {
    if keys.len() == values.len() {
        return keys
            .iter()
            .zip(values)
            .map(|(k, v)| PrenormPair::new(*k, *v))
            .collect();
    }
    if keys.len() == 1 || values.len() < keys.len() {
        return vec![PrenormPair::new(keys.join(" "), values.join(" "))];
    }

    let mut out = Vec::with_capacity(keys.len());
    let mut v = 0usize;
    for (k, key) in keys.iter().enumerate() {
        let keys_left = keys.len() - k - 1;
        if keys_left == 0 {
            out.push(PrenormPair::new(*key, values[v..].join(" ")));
            break;
        }

        let groups: Vec<&str> = key
            .trim_end_matches('.')
            .split('.')
            .filter(|g| !g.is_empty())
            .collect();
        let mut taken = vec![values[v]];
        v += 1;
        let mut group = 1usize;
        while group < groups.len()
            && values.len() - v > keys_left
            && first_char_matches(groups[group], values[v])
        {
            taken.push(values[v]);
            v += 1;
            group += 1;
        }
        out.push(PrenormPair::new(*key, taken.join(" ")));
    }
    out
}

fn first_char_matches(key_group: &str, value: &str) -> bool {
    match (key_group.chars().next(), value.chars().next()) {
        (Some(a), Some(b)) => a.to_lowercase().eq(b.to_lowercase()),
        _ => false,
    }
}

/// Word-level LCS diff. Within a changed run deletions come before insertions.
fn diff_words<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<DiffOp<'a>> {
    let n = a.len();
    let m = b.len();
    let width = m + 1;
    // lcs[i * width + j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if a[i] == b[j] {
            ops.push(DiffOp::Equal(a[i]));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            ops.push(DiffOp::Delete(a[i]));
            i += 1;
        } else {
            ops.push(DiffOp::Insert(b[j]));
            j += 1;
        }
    }
    ops.extend(a[i..].iter().map(|w| DiffOp::Delete(*w)));
    ops.extend(b[j..].iter().map(|w| DiffOp::Insert(*w)));
    ops
}
