//! Ecash utils

pub mod hex;

use bitcoin::secp256k1::{rand, All, Secp256k1};
use once_cell::sync::Lazy;

/// Secp256k1 global context
pub static SECP256K1: Lazy<Secp256k1<All>> = Lazy::new(|| {
    let mut ctx = Secp256k1::new();
    let mut rng = rand::thread_rng();
    ctx.randomize(&mut rng);
    ctx
});
