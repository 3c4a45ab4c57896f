use cbk_crypto::{AesGcmCipher, Cipher, XorCipher};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_aes_encrypt(bencher: divan::Bencher, size: usize) {
    let cipher = AesGcmCipher::new(&[0xABu8; 32]).unwrap();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| cipher.encrypt_bytes(divan::black_box(&data)).unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_aes_decrypt(bencher: divan::Bencher, size: usize) {
    let cipher = AesGcmCipher::new(&[0xABu8; 32]).unwrap();
    let encrypted = cipher.encrypt_bytes(&make_data(size)).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| cipher.decrypt_bytes(divan::black_box(&encrypted)).unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_xor(bencher: divan::Bencher, size: usize) {
    let cipher = XorCipher::new(b"a repeating key").unwrap();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| cipher.encrypt_bytes(divan::black_box(&data)).unwrap());
}

fn main() {
    divan::main();
}
