//! Salted, iterated SHA-256 password hashing.
//!
//! Stored form: `hex(salt)$hex(digest)`.

use sha2::{Digest, Sha256};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

const ROUNDS: u32 = 10_000;
const SALT_LEN: usize = 16;

fn stretch(salt: &[u8], password: &str) -> Vec<u8> {
    let mut digest = Sha256::new().chain_update(salt).chain_update(password.as_bytes()).finalize();
    for _ in 1..ROUNDS {
        digest = Sha256::new().chain_update(digest).chain_update(salt).finalize();
    }
    digest.to_vec()
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), hex::encode(stretch(&salt, password)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    stretch(&salt, password).ct_eq(&expected).into()
}
