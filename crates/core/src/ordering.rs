//! Fractional position keys for block ordering.
//!
//! Keys are base-62 strings compared lexicographically. A fresh key can
//! always be synthesized strictly between any two neighbors, so a move or
//! insert touches exactly one block. Chained inserts into the same gap grow
//! the key by roughly one character per insert; once a synthesized key
//! exceeds [`MAX_KEY_LEN`] the document performs a local rebalance
//! ([`spread`]) over the crowded run instead of renumbering everything.

use serde::{Deserialize, Serialize};

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const RADIX: usize = 62;

/// Precision bound: synthesizing a key longer than this signals that the gap
/// is exhausted and the surrounding run should be rebalanced.
pub const MAX_KEY_LEN: usize = 24;

fn digit(c: u8) -> usize {
    BASE62.iter().position(|&b| b == c).unwrap_or(0)
}

/// Orderable key determining a block's place within its document.
///
/// Compares as a plain string. Keys are local to a document's current
/// editing lineage; restore regenerates them rather than reusing stored ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    /// Key for the first block of an empty document: the midpoint of the
    /// whole key space, leaving room on both sides.
    pub fn first() -> Self {
        PositionKey("V".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthesize a key strictly between `low` and `high`.
///
/// `None` bounds are the before-all / after-all sentinels. Callers must pass
/// `low < high`; with both bounds present and equal (or inverted) the gap is
/// empty and there is nothing valid to return, so this panics in debug and
/// degrades to `low + "V"` in release.
pub fn key_between(low: Option<&PositionKey>, high: Option<&PositionKey>) -> PositionKey {
    let a = low.map(|k| k.0.as_str()).unwrap_or("");
    if let (Some(l), Some(h)) = (low, high) {
        debug_assert!(l < h, "key_between bounds out of order: {l} >= {h}");
        if l >= h {
            return PositionKey(format!("{}V", l.0));
        }
    }
    PositionKey(midpoint(a, high.map(|k| k.0.as_str())))
}

/// Lexicographic midpoint between `a` and `b` in base 62.
///
/// `a = ""` is the low sentinel, `b = None` the high sentinel (an infinite
/// run of the maximal digit). Guarantees `a < result` and `result < b`.
fn midpoint(a: &str, b: Option<&str>) -> String {
    let a = a.as_bytes();
    let b = b.map(str::as_bytes);
    let mut out: Vec<u8> = Vec::new();
    let mut i = 0;
    loop {
        let av = a.get(i).map(|&c| digit(c)).unwrap_or(0);
        let bv = match b {
            // b exhausted can only happen when b is a prefix of a, which
            // contradicts a < b; treat as the open upper bound.
            Some(b) => b.get(i).map(|&c| digit(c)).unwrap_or(RADIX),
            None => RADIX,
        };
        if av + 1 < bv {
            out.push(BASE62[(av + bv) / 2]);
            break;
        }
        out.push(BASE62[av]);
        if av + 1 == bv {
            // Adjacent digits: keep following a until a digit leaves
            // headroom below the radix, then split that headroom.
            let mut j = i + 1;
            loop {
                let aj = a.get(j).map(|&c| digit(c)).unwrap_or(0);
                if aj + 1 < RADIX {
                    out.push(BASE62[(aj + RADIX) / 2]);
                    break;
                }
                out.push(BASE62[aj]);
                j += 1;
            }
            break;
        }
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| "V".to_string())
}

/// Generate `n` fresh keys evenly spaced between the bounds, by balanced
/// bisection. Key length grows with log2(n) past the bound length, so a
/// rebalanced run always lands well under [`MAX_KEY_LEN`].
pub fn spread(low: Option<&PositionKey>, high: Option<&PositionKey>, n: usize) -> Vec<PositionKey> {
    if n == 0 {
        return Vec::new();
    }
    let mid = key_between(low, high);
    let half = n / 2;
    let mut keys = spread(low, Some(&mid), half);
    let right = spread(Some(&mid), high, n - half - 1);
    keys.push(mid);
    keys.extend(right);
    keys
}
