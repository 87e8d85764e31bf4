//! Benchmarks for chunked RSA-OAEP decryption
//!
//! This benchmark measures:
//! - Decryption cost as the number of 256-byte blocks grows
//! - Base64 decoding overhead on wrapped input

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use compredict_client::crypto::{encrypt_chunked, OaepDigest, PrivateKey};

const PRIVATE_PEM: &str = include_str!("../tests/fixtures/private_key.pem");

fn bench_chunked_decrypt(c: &mut Criterion) {
    let key = PrivateKey::from_pem(PRIVATE_PEM, None).expect("fixture key");
    let public = key.public_key();
    let mut rng = rand::thread_rng();

    let mut group = c.benchmark_group("chunked_decrypt");
    for size in [200usize, 2_000, 20_000] {
        let plaintext = vec![b'7'; size];
        let encoded = encrypt_chunked(&mut rng, &public, OaepDigest::Sha1, &plaintext).expect("encrypt");

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| key.decrypt(black_box(encoded)).expect("decrypt"))
        });
    }
    group.finish();
}

fn bench_wrapped_fixture(c: &mut Criterion) {
    let key = PrivateKey::from_pem(PRIVATE_PEM, None).expect("fixture key");
    let wrapped = include_str!("../tests/fixtures/ciphertext.b64");

    c.bench_function("decrypt_openssl_fixture", |b| {
        b.iter(|| key.decrypt(black_box(wrapped)).expect("decrypt"))
    });
}

criterion_group!(benches, bench_chunked_decrypt, bench_wrapped_fixture);
criterion_main!(benches);
