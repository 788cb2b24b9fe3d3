//! Tests for utility functions

use worker_bridge::util::{generate_id, IdGenerator, RandomIdGenerator, ID_ALPHABET, ID_LENGTH};

#[test]
fn test_id_alphabet() {
    assert_eq!(ID_ALPHABET.len(), 64);
    let mut sorted = ID_ALPHABET.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 64, "alphabet symbols must be distinct");
}

#[test]
fn test_generate_id() {
    let id = generate_id();
    assert_eq!(id.len(), ID_LENGTH);
    assert!(id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
}

#[test]
fn test_generator_trait_object() {
    let generator: Box<dyn IdGenerator> = Box::new(RandomIdGenerator);
    assert_ne!(generator.generate(), generator.generate());
}

#[test]
fn test_init_tracing_installs_once() {
    let _ = worker_bridge::util::init_tracing();
    assert!(!worker_bridge::util::init_tracing());
}
