use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

fn main() -> io::Result<()> {
    let out_dir = env::var_os("OUT_DIR").expect("cargo always sets OUT_DIR for build scripts");
    let generation_file = Path::new(&out_dir).join("lookup.rs");
    let zobrist_file = Path::new(&out_dir).join("zobrist_keys.rs");

    let processed_consts = BuildPreprocessor::process();

    let mut file = File::create(generation_file)?;
    writeln!(&mut file, "impl Bitboard {{")?;
    inject_array(
        &mut file,
        "pub const KNIGHT_ATTACKS: [Bitboard; 64]",
        &processed_consts.knight_attacks,
        Some("Bitboard"),
    )?;
    inject_array(
        &mut file,
        "pub const KING_ATTACKS: [Bitboard; 64]",
        &processed_consts.king_attacks,
        Some("Bitboard"),
    )?;
    inject_2d_array(
        &mut file,
        "pub const PAWN_ATTACKS: [[Bitboard; 64]; 2]",
        Vec::from(processed_consts.pawn_attacks.map(Vec::from)),
        Some("Bitboard"),
    )?;
    inject_2d_array(
        &mut file,
        "pub const RAYS: [[Bitboard; 64]; 8]",
        Vec::from(processed_consts.rays.map(Vec::from)),
        Some("Bitboard"),
    )?;
    writeln!(&mut file, "}}")?;

    file = File::create(zobrist_file)?;
    writeln!(&mut file, "impl ZobristHasher {{")?;
    inject_array(
        &mut file,
        "pub const ZOBRIST_KEYS: [u64; 849]",
        &BuildPreprocessor::initialize_zobrist_keys(),
        None,
    )?;
    writeln!(&mut file, "}}")?;

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}

fn inject_array<T: ToString>(
    file: &mut File,
    declaration: &str,
    array: &[T],
    constructor: Option<&str>,
) -> io::Result<()> {
    writeln!(file, "{} = [", declaration)?;
    for value in array {
        write!(
            file,
            "{}, ",
            match constructor {
                Some(c) => c.to_owned() + "(" + &value.to_string() + ")",
                None => value.to_string(),
            }
        )?;
    }
    writeln!(file, "];")
}

fn inject_2d_array<T: ToString>(
    file: &mut File,
    declaration: &str,
    array: Vec<Vec<T>>,
    constructor: Option<&str>,
) -> io::Result<()> {
    writeln!(file, "{} = [", declaration)?;
    for slice in array {
        write!(file, "[")?;
        for value in slice {
            write!(
                file,
                "{}, ",
                match constructor {
                    Some(c) => c.to_owned() + "(" + &value.to_string() + ")",
                    None => value.to_string(),
                }
            )?;
        }
        writeln!(file, "], ")?;
    }
    writeln!(file, "];")
}

struct BuildPreprocessor {
    pub knight_attacks: Vec<u64>,
    pub king_attacks: Vec<u64>,
    pub pawn_attacks: [[u64; 64]; 2],
    pub rays: [[u64; 64]; 8],
}

const NOT_A_FILE: u64 = !0x101010101010101;
const NOT_H_FILE: u64 = !0x8080808080808080;

impl BuildPreprocessor {
    pub fn process() -> BuildPreprocessor {
        BuildPreprocessor {
            knight_attacks: Self::process_knight_moves(),
            king_attacks: Self::process_king_moves(),
            pawn_attacks: Self::process_pawn_attacks(),
            rays: Self::process_rays(),
        }
    }

    fn process_knight_moves() -> Vec<u64> {
        let knight_shifts: [fn(u64) -> u64; 8] = [
            |bb| (bb << 10) & !0x303030303030303,
            |bb| (bb >> 10) & !0xc0c0c0c0c0c0c0c0,
            |bb| (bb << 17) & NOT_A_FILE,
            |bb| (bb >> 17) & NOT_H_FILE,
            |bb| (bb << 15) & NOT_H_FILE,
            |bb| (bb >> 15) & NOT_A_FILE,
            |bb| (bb << 6) & !0xc0c0c0c0c0c0c0c0,
            |bb| (bb >> 6) & !0x303030303030303,
        ];
        (0..64)
            .map(|sq| {
                let origin = 1u64 << sq;
                knight_shifts.iter().fold(0u64, |acc, shift| acc | shift(origin))
            })
            .collect()
    }

    fn process_king_moves() -> Vec<u64> {
        let king_shifts: [fn(u64) -> u64; 8] = [
            |bb| (bb >> 1) & NOT_H_FILE,
            |bb| (bb << 1) & NOT_A_FILE,
            |bb| (bb << 7) & NOT_H_FILE,
            |bb| (bb >> 7) & NOT_A_FILE,
            |bb| (bb << 9) & NOT_A_FILE,
            |bb| (bb >> 9) & NOT_H_FILE,
            |bb| bb << 8,
            |bb| bb >> 8,
        ];
        (0..64)
            .map(|sq| {
                let origin = 1u64 << sq;
                king_shifts.iter().fold(0u64, |acc, shift| acc | shift(origin))
            })
            .collect()
    }

    // Index 0 holds the squares attacked by a white pawn, index 1 by a black pawn
    fn process_pawn_attacks() -> [[u64; 64]; 2] {
        let mut results = [[0u64; 64]; 2];
        for sq in 0..64 {
            let origin = 1u64 << sq;
            results[0][sq] = ((origin << 7) & NOT_H_FILE) | ((origin << 9) & NOT_A_FILE);
            results[1][sq] = ((origin >> 9) & NOT_H_FILE) | ((origin >> 7) & NOT_A_FILE);
        }
        results
    }

    // Ray order: east, west, north, south, north-west, south-east, north-east, south-west.
    // Even indices grow towards higher squares, odd ones towards lower squares.
    fn process_rays() -> [[u64; 64]; 8] {
        let shifts: [fn(u64) -> u64; 8] = [
            |b| (b << 1) & NOT_A_FILE,
            |b| (b >> 1) & NOT_H_FILE,
            |b| b << 8,
            |b| b >> 8,
            |b| (b << 7) & NOT_H_FILE,
            |b| (b >> 7) & NOT_A_FILE,
            |b| (b << 9) & NOT_A_FILE,
            |b| (b >> 9) & NOT_H_FILE,
        ];

        let mut results = [[0u64; 64]; 8];
        for sq in 0..64 {
            let origin = 1u64 << sq;
            for (i, shift) in shifts.iter().enumerate() {
                let mut ray = 0u64;
                let mut current = origin;
                while current != 0 {
                    current = shift(current);
                    ray |= current;
                }
                results[i][sq] = ray;
            }
        }
        results
    }

    // splitmix64 over the key index, so keys never change between builds
    pub fn initialize_zobrist_keys() -> [u64; 849] {
        let mut keys = [0u64; 849];
        for (index, key) in keys.iter_mut().enumerate() {
            let mut z = (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            *key = z ^ (z >> 31);
        }
        keys
    }
}
