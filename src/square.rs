pub type Square = usize;

pub fn rank_of(sq: Square) -> usize {
    sq >> 3
}
pub fn file_of(sq: Square) -> usize {
    sq & 7
}

/// Light squares have an odd file + rank sum, a1 is dark
/// ```
/// use gambit::square::is_light_square;
/// assert!(!is_light_square(0));
/// assert!(is_light_square(7));
/// assert!(is_light_square(60));
/// ```
pub fn is_light_square(sq: Square) -> bool {
    (file_of(sq) + rank_of(sq)) % 2 == 1
}

/// Parses a square from a given string slice,
/// only caring that the first two characters form a valid square representation
/// ```
/// use gambit::square::parse_square;
/// assert_eq!(parse_square("e4"), Some(28));
/// assert_eq!(parse_square("d2someotherstuff"), Some(11));
/// assert_eq!(parse_square("randoma1stuff"), None);
/// assert_eq!(parse_square("k9"), None);
/// ```
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars_iter = s.chars();
    let file = match chars_iter.next()? {
        c @ 'a'..='h' => c as usize - 'a' as usize,
        _ => return None,
    };
    let rank = match chars_iter.next()?.to_digit(10) {
        Some(i) if (1..=8).contains(&i) => i as usize - 1,
        _ => return None,
    };
    Some(rank * 8 + file)
}

/// Returns the string representation of a square
/// ```
/// use gambit::square::square_representation;
/// assert_eq!(square_representation(28), Some(String::from("e4")));
/// assert_eq!(square_representation(11), Some(String::from("d2")));
/// assert_eq!(square_representation(65), None);
/// ```
pub fn square_representation(sq: Square) -> Option<String> {
    if !is_valid(sq) {
        return None;
    }
    let rank = ('1'..='8').nth(rank_of(sq))?;
    let file = ('a'..='h').nth(file_of(sq))?;
    let mut repr = file.to_string();
    repr.push(rank);
    Some(repr)
}

/// Checks whether a given square is in bounds (0..64) or not
/// ```
/// use gambit::square::is_valid;
/// assert!(is_valid(12));
/// assert!(!is_valid(64));
/// ```
pub fn is_valid(sq: Square) -> bool {
    sq < 64
}
