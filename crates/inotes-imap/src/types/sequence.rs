//! Sequence sets for message ranges.

use super::SeqNum;

/// Sequence set for specifying message ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(SeqNum),
    /// Range of sequence numbers (inclusive).
    Range(SeqNum, SeqNum),
    /// Multiple sequence specifications.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a range sequence set.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }

    /// Builds a set listing the given sequence numbers, or `None` if empty.
    #[must_use]
    pub fn from_ids(ids: &[SeqNum]) -> Option<Self> {
        match ids {
            [] => None,
            [id] => Some(Self::Single(*id)),
            _ => Some(Self::Set(ids.iter().copied().map(Self::Single).collect())),
        }
    }
}

impl From<SeqNum> for SequenceSet {
    fn from(id: SeqNum) -> Self {
        Self::Single(id)
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn range_rejects_zero() {
        assert!(SequenceSet::range(0, 4).is_none());
    }

    #[test]
    fn from_ids() {
        let ids: Vec<SeqNum> = [1, 4, 9].into_iter().filter_map(SeqNum::new).collect();
        assert_eq!(SequenceSet::from_ids(&ids).unwrap().to_string(), "1,4,9");
        assert_eq!(SequenceSet::from_ids(&ids[..1]).unwrap().to_string(), "1");
        assert!(SequenceSet::from_ids(&[]).is_none());
    }
}
