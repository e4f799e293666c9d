//! Password hashing tests.
//!
//! Tests cover: verify/hash round trip over random passwords, salting,
//! mismatch on wrong passwords, hashes from other cost settings.

use elasticity_core::{
    config::{HashingConfig, PanelConfig},
    password::PasswordHasher,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

fn hasher() -> PasswordHasher {
    PasswordHasher::new(&PanelConfig::default_test().hashing).expect("test hasher")
}

fn random_password(rng: &mut Pcg64Mcg) -> String {
    const ALPHABET: &[u8] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*(),.?\":{}|<> ";
    let len = rng.gen_range(0..24);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[test]
fn verify_accepts_its_own_hash() {
    let h = hasher();
    let mut rng = Pcg64Mcg::seed_from_u64(0x5EED_0001);
    for _ in 0..8 {
        let password = random_password(&mut rng);
        let hash = h.hash(&password).unwrap();
        assert!(h.verify(&password, &hash), "round trip failed for {password:?}");
    }
}

#[test]
fn hashing_twice_gives_different_strings() {
    let h = hasher();
    let a = h.hash("Abc12345!").unwrap();
    let b = h.hash("Abc12345!").unwrap();
    assert_ne!(a, b, "each hash must carry a fresh salt");
    assert!(h.verify("Abc12345!", &a));
    assert!(h.verify("Abc12345!", &b));
}

#[test]
fn verify_rejects_other_passwords() {
    let h = hasher();
    let hash = h.hash("changeme").unwrap();
    assert!(!h.verify("Changeme", &hash));
    assert!(!h.verify("changeme ", &hash));
    assert!(!h.verify("", &hash));
}

#[test]
fn non_ascii_passwords_round_trip() {
    let h = hasher();
    let password = "Sénha-forte-ção-1!";
    let hash = h.hash(password).unwrap();
    assert!(h.verify(password, &hash));
}

/// Stored hashes keep their own cost parameters, so raising the
/// configured cost does not lock out existing users.
#[test]
fn verifies_hashes_made_with_other_costs() {
    let cheap = hasher();
    let stored = cheap.hash("Abc12345!").unwrap();

    let stronger = PasswordHasher::new(&HashingConfig {
        memory_kib:  2048,
        iterations:  2,
        parallelism: 1,
    })
    .unwrap();
    assert!(stronger.verify("Abc12345!", &stored));
}
