//! Random generators used for key generation and encryption.
//!
//! Both generators are backed by ChaCha20 streams. The encryption generator keeps separate streams
//! for the masks and for the noise, so that masks can be regenerated from their seed.

use crate::core_crypto::commons::dispersion::DispersionParameter;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// A seed value, used to initialize a generator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed(pub u128);

impl Seed {
    fn to_chacha_seed(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&self.0.to_le_bytes());
        bytes[16..].copy_from_slice(&(!self.0).to_le_bytes());
        bytes
    }
}

/// Draw a fresh seed from the operating system entropy.
pub fn new_seed() -> Seed {
    Seed(rand::thread_rng().gen())
}

fn chacha(seed: Seed) -> ChaCha20Rng {
    ChaCha20Rng::from_seed(seed.to_chacha_seed())
}

fn next_seed(rng: &mut ChaCha20Rng) -> Seed {
    Seed(u128::from(rng.next_u64()) << 64 | u128::from(rng.next_u64()))
}

/// Sample a centered gaussian value over the torus $\mathbb{Z}/2^{64}\mathbb{Z}$, the standard
/// deviation being expressed relatively to the torus.
fn torus_gaussian(rng: &mut ChaCha20Rng, std: f64) -> u64 {
    let sample: f64 = rng.sample(StandardNormal);
    let scaled = (sample * std * 2_f64.powi(64)).round();
    // Values beyond the i64 range wrap around the torus
    let wrapped = scaled.rem_euclid(2_f64.powi(64));
    if wrapped >= 2_f64.powi(63) {
        (wrapped - 2_f64.powi(64)) as i64 as u64
    } else {
        wrapped as u64
    }
}

/// A random number generator which can be used to encrypt messages.
pub struct EncryptionRandomGenerator {
    // A separate mask generator, only used to generate the mask elements.
    mask: ChaCha20Rng,
    // A separate noise generator, only used to generate the noise elements.
    noise: ChaCha20Rng,
}

impl EncryptionRandomGenerator {
    pub fn new(mask_seed: Seed, noise_seed: Seed) -> Self {
        Self {
            mask: chacha(mask_seed),
            noise: chacha(noise_seed),
        }
    }

    /// Fork the generator in `n` independent children, e.g. one per GGSW of a bootstrap key so
    /// that they can be encrypted in parallel.
    pub fn fork_n(&mut self, n: usize) -> Vec<Self> {
        (0..n)
            .map(|_| {
                let mask_seed = next_seed(&mut self.mask);
                let noise_seed = next_seed(&mut self.noise);
                Self::new(mask_seed, noise_seed)
            })
            .collect()
    }

    pub fn fill_slice_with_random_mask(&mut self, output: &mut [u64]) {
        output.iter_mut().for_each(|x| *x = self.mask.next_u64());
    }

    pub fn random_noise(&mut self, std: impl DispersionParameter) -> u64 {
        torus_gaussian(&mut self.noise, std.get_standard_dev().0)
    }

    /// Add gaussian noise to every element of `output`.
    pub fn unsigned_torus_slice_wrapping_add_random_noise_assign(
        &mut self,
        output: &mut [u64],
        std: impl DispersionParameter,
    ) {
        let std = std.get_standard_dev().0;
        output
            .iter_mut()
            .for_each(|x| *x = x.wrapping_add(torus_gaussian(&mut self.noise, std)));
    }
}

/// A random number generator which can be used to generate secret keys.
pub struct SecretRandomGenerator(ChaCha20Rng);

impl SecretRandomGenerator {
    pub fn new(seed: Seed) -> Self {
        Self(chacha(seed))
    }

    pub fn fill_slice_with_random_uniform_binary(&mut self, output: &mut [u64]) {
        output.iter_mut().for_each(|x| *x = self.0.next_u64() & 1);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core_crypto::commons::dispersion::StandardDev;

    #[test]
    fn seeded_generators_are_reproducible() {
        let mut a = EncryptionRandomGenerator::new(Seed(3), Seed(4));
        let mut b = EncryptionRandomGenerator::new(Seed(3), Seed(5));
        let (mut ma, mut mb) = ([0u64; 16], [0u64; 16]);
        a.fill_slice_with_random_mask(&mut ma);
        b.fill_slice_with_random_mask(&mut mb);
        assert_eq!(ma, mb);
        assert_ne!(
            a.random_noise(StandardDev(2_f64.powi(-20))),
            b.random_noise(StandardDev(2_f64.powi(-20)))
        );
    }

    #[test]
    fn noise_is_centered_and_small() {
        let mut generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
        let std = StandardDev(2_f64.powi(-30));
        let samples: Vec<i64> = (0..10_000)
            .map(|_| generator.random_noise(std) as i64)
            .collect();
        let bound = 8 * (1i64 << 34);
        assert!(samples.iter().all(|s| s.abs() < bound));
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 2_f64.powi(30));
    }

    #[test]
    fn binary_keys() {
        let mut generator = SecretRandomGenerator::new(Seed(0));
        let mut key = [7u64; 256];
        generator.fill_slice_with_random_uniform_binary(&mut key);
        assert!(key.iter().all(|&b| b <= 1));
        assert!(key.iter().any(|&b| b == 1));
    }
}
