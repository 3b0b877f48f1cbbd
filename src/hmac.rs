//! HMAC (RFC 2104) composed over a [`HashEngine`]

use crate::engine::HashEngine;
use crate::{HashAlgorithm, Result};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Computes `HMAC(key, message)` with the digest primitive of `engine`
///
/// Keys longer than the algorithm's block size are hashed first, then the key
/// is zero-padded to the block size.
///
/// # Errors
///
/// Propagates the engine's failure for an algorithm it cannot hash.
pub fn hmac<E>(engine: &E, algorithm: HashAlgorithm, key: &[u8], message: &[u8]) -> Result<Vec<u8>>
where
    E: HashEngine + ?Sized,
{
    let block_size = algorithm.block_size();

    let mut block = if key.len() > block_size {
        engine.digest(algorithm, key)?
    } else {
        key.to_vec()
    };
    block.resize(block_size, 0);

    let mut inner = pad(&block, IPAD);
    inner.extend_from_slice(message);
    let inner_digest = engine.digest(algorithm, &inner)?;

    let mut outer = pad(&block, OPAD);
    outer.extend_from_slice(&inner_digest);
    engine.digest(algorithm, &outer)
}

fn pad(block: &[u8], byte: u8) -> Vec<u8> {
    block.iter().map(|b| b ^ byte).collect()
}
