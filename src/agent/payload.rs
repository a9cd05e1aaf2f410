use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

use super::settings::SIZE_1K;

/// Length of generated upload file names.
const FILE_NAME_LEN: usize = 10;

/// A generated upload body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn random_name<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

pub fn random_bytes<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; size];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// Builds a payload whose size is one of `sizes`, picked uniformly.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, sizes: &[usize]) -> Payload {
    let size = sizes.choose(rng).copied().unwrap_or(SIZE_1K);
    Payload {
        file_name: random_name(rng, FILE_NAME_LEN),
        bytes: random_bytes(rng, size),
    }
}
