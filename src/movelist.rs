use crate::evaluation::Score;
use crate::r#move::Move;
use arrayvec::ArrayVec;

/// No chess position has more than 218 legal moves
pub const MAX_MOVELIST_CAPACITY: usize = 255;

#[derive(Clone, Debug, Default)]
pub struct MoveList(ArrayVec<Move, MAX_MOVELIST_CAPACITY>);

impl MoveList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn push(&mut self, m: Move) {
        self.0.push(m)
    }
    pub fn extend(&mut self, moves: impl IntoIterator<Item = Move>) {
        self.0.extend(moves)
    }
    pub fn get(&self, i: usize) -> Option<&Move> {
        self.0.get(i)
    }
    pub fn contains(&self, m: &Move) -> bool {
        self.0.contains(m)
    }
    pub fn retain<F: FnMut(&mut Move) -> bool>(&mut self, f: F) {
        self.0.retain(f)
    }

    pub fn best_first_iter<F: Fn(&Move) -> Score>(
        &self,
        scoring_function: F,
    ) -> ScoredMoveListIter {
        ScoredMoveListIter::new(self, scoring_function)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.0.iter()
    }
}

impl FromIterator<Move> for MoveList {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut mv_list = MoveList::default();
        mv_list.extend(iter);
        mv_list
    }
}

impl std::fmt::Display for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        let moves: Vec<String> = self.0.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", moves.join(" "))
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = arrayvec::IntoIter<Move, MAX_MOVELIST_CAPACITY>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// A way to iterate through a movelist while scoring
// moves, best score first. Moves with equal scores come out in list order.
pub struct ScoredMoveListIter {
    moves: ArrayVec<(Move, Score), MAX_MOVELIST_CAPACITY>,
}
impl ScoredMoveListIter {
    pub fn new<F: Fn(&Move) -> Score>(move_list: &MoveList, scoring_function: F) -> Self {
        let moves = move_list
            .iter()
            .map(|mv| (*mv, scoring_function(mv)))
            .collect();
        ScoredMoveListIter { moves }
    }
}
impl Iterator for ScoredMoveListIter {
    type Item = Move;

    fn next(&mut self) -> Option<Self::Item> {
        let (mut best_index, mut best_score) = (0, self.moves.first()?.1);
        for (i, (_, s)) in self.moves.iter().enumerate() {
            if *s > best_score {
                best_score = *s;
                best_index = i;
            }
        }
        self.moves.pop_at(best_index).map(|(mv, _)| mv)
    }
}
