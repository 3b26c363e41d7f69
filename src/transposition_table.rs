use crate::{evaluation::Score, r#move::Move, zobrist::Hash};

/// What a finished search of a node proved about its score
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum SearchInfo {
    /// The score lies inside the window it was searched with
    Exact {
        position_hash: Hash,
        best_move: Move,
        depth_searched: u8,
        score: Score,
    },
    /// A move failed high, the real score is at least `lower_bound`
    Cutoff {
        position_hash: Hash,
        refutation_move: Move,
        depth_searched: u8,
        lower_bound: Score,
    },
    /// Every move failed low, the real score is at most `upper_bound`
    All {
        position_hash: Hash,
        best_move: Option<Move>,
        depth_searched: u8,
        upper_bound: Score,
    },
    #[default]
    None,
}

impl SearchInfo {
    pub fn position_hash(&self) -> Option<Hash> {
        match self {
            Self::Exact { position_hash: h, .. }
            | Self::Cutoff { position_hash: h, .. }
            | Self::All { position_hash: h, .. } => Some(*h),
            Self::None => None,
        }
    }

    pub fn hash_move(&self) -> Option<Move> {
        match self {
            Self::Exact { best_move: m, .. } => Some(*m),
            Self::Cutoff { refutation_move: m, .. } => Some(*m),
            Self::All { best_move: m, .. } => *m,
            Self::None => None,
        }
    }

    pub fn depth_searched(&self) -> Option<u8> {
        match self {
            Self::Exact { depth_searched: d, .. }
            | Self::Cutoff { depth_searched: d, .. }
            | Self::All { depth_searched: d, .. } => Some(*d),
            Self::None => None,
        }
    }

    pub fn score(&self) -> Option<Score> {
        match self {
            Self::Exact { score: s, .. }
            | Self::Cutoff { lower_bound: s, .. }
            | Self::All { upper_bound: s, .. } => Some(*s),
            Self::None => None,
        }
    }

    /// Replaces the stored score, keeping the bound kind
    pub fn with_score(self, score: Score) -> SearchInfo {
        match self {
            Self::Exact { position_hash, best_move, depth_searched, .. } => Self::Exact {
                position_hash,
                best_move,
                depth_searched,
                score,
            },
            Self::Cutoff { position_hash, refutation_move, depth_searched, .. } => Self::Cutoff {
                position_hash,
                refutation_move,
                depth_searched,
                lower_bound: score,
            },
            Self::All { position_hash, best_move, depth_searched, .. } => Self::All {
                position_hash,
                best_move,
                depth_searched,
                upper_bound: score,
            },
            Self::None => Self::None,
        }
    }

    /// The score to return right away for a node searched to `depth` with
    /// the `(alpha, beta)` window, if this entry is deep enough and its bound
    /// settles the node
    pub fn cutoff_score(&self, depth: u8, alpha: Score, beta: Score) -> Option<Score> {
        if self.depth_searched()? < depth {
            return None;
        }
        match *self {
            Self::Exact { score, .. } => Some(score),
            Self::Cutoff { lower_bound, .. } if lower_bound >= beta => Some(lower_bound),
            Self::All { upper_bound, .. } if upper_bound <= alpha => Some(upper_bound),
            _ => None,
        }
    }
}

pub const DEFAULT_TABLE_SIZE: usize = 1 << 20;

/// A best-effort cache of search results, indexed by `hash % buckets`.
/// Each bucket keeps the deepest entry seen and the most recent one.
pub struct TranspositionTable(Vec<(SearchInfo, SearchInfo)>);

impl TranspositionTable {
    /// A table holding up to `entries` results
    pub fn new(entries: usize) -> Self {
        TranspositionTable(vec![Default::default(); (entries / 2).max(1)])
    }

    fn key_from_hash(&self, hash: Hash) -> usize {
        (hash % (self.0.len() as u64)) as usize
    }

    pub fn get(&self, hash: Hash) -> SearchInfo {
        let (depth_entry, young_entry) = self.0[self.key_from_hash(hash)];

        if depth_entry.position_hash() == Some(hash) {
            depth_entry
        } else if young_entry.position_hash() == Some(hash) {
            young_entry
        } else {
            SearchInfo::None
        }
    }

    pub fn set(&mut self, hash: Hash, entry: SearchInfo) {
        let key = self.key_from_hash(hash);
        let (depth_entry, young_entry) = &mut self.0[key];

        if Self::should_replace(depth_entry, &entry) {
            *depth_entry = entry;
        } else {
            *young_entry = entry;
        }
    }

    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(|bucket| *bucket = Default::default());
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.0.len() * 2
    }

    fn should_replace(old_info: &SearchInfo, new_info: &SearchInfo) -> bool {
        match old_info {
            SearchInfo::None => true,
            i => i.position_hash() == new_info.position_hash() || i.depth_searched() <= new_info.depth_searched(),
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_SIZE)
    }
}
