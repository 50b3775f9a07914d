use super::SignedDecomposer;
use crate::core_crypto::commons::parameters::{DecompositionBaseLog, DecompositionLevelCount};
use rand::Rng;

// Return a random decomposition valid for 64 bits integers.
fn random_decomp(rng: &mut impl Rng) -> SignedDecomposer {
    loop {
        let base_log = rng.gen_range(2..64);
        let level_count = rng.gen_range(1..64);
        if base_log * level_count <= 64 {
            return SignedDecomposer::new(
                DecompositionBaseLog(base_log),
                DecompositionLevelCount(level_count),
            );
        }
    }
}

#[test]
fn test_decompose_recompose() {
    let mut rng = rand::thread_rng();
    // Decomposing and recomposing a value brings the closest representable
    for _ in 0..100_000 {
        let decomposer = random_decomp(&mut rng);
        let input: u64 = rng.gen();
        for term in decomposer.decompose(input) {
            assert!(1 <= term.level().0);
            assert!(term.level().0 <= decomposer.level_count);
            let signed_term = term.value() as i64 as i128;
            let half_basis = (1i128 << decomposer.base_log) / 2;
            assert!(-half_basis <= signed_term);
            assert!(signed_term <= half_basis);
        }
        let closest = decomposer.closest_representable(input);
        assert_eq!(
            closest,
            decomposer.recompose(decomposer.decompose(closest)).unwrap()
        );
    }
}

#[test]
fn test_round_to_closest_representable() {
    let mut rng = rand::thread_rng();
    for _ in 0..10_000 {
        let decomposer = random_decomp(&mut rng);
        let non_rep_bits = 64 - decomposer.base_log * decomposer.level_count;
        let input: u64 = rng.gen();
        let closest = decomposer.closest_representable(input);
        if non_rep_bits == 0 {
            assert_eq!(closest, input);
            continue;
        }
        let rep_bits = closest.trailing_zeros() as usize;
        assert!(rep_bits >= non_rep_bits);
        let distance = closest.wrapping_sub(input) as i64;
        assert!(distance.unsigned_abs() <= 1u64 << (non_rep_bits - 1));
    }
}

#[test]
fn test_full_width_and_digits_by_level() {
    let decomposer = SignedDecomposer::new(DecompositionBaseLog(16), DecompositionLevelCount(4));
    let input = 0x0123_4567_89ab_cdef_u64;
    assert_eq!(decomposer.closest_representable(input), input);

    let mut digits = [0u64; 4];
    decomposer.decompose_into(input, &mut digits);
    let recomposed = digits
        .iter()
        .enumerate()
        .fold(0u64, |acc, (j, &d)| {
            acc.wrapping_add(d.wrapping_mul(decomposer.level_scaling(j + 1)))
        });
    assert_eq!(recomposed, input);
    assert_eq!(decomposer.level_scaling(1), 1 << 48);
    assert_eq!(decomposer.level_scaling(4), 1);
}
