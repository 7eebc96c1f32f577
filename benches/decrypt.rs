#![allow(unused)]
extern crate keyscope;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use keyscope::{
    assembly::{decode_stream, InstructionAssembler},
    deobfuscation::{decrypt_all, ResourceDecrypter},
    metadata::{
        method::{Local, Method},
        token::Token,
        typesystem::CilFlavor,
    },
    Parser,
};
use std::hint::black_box;

/// Guarded single-phase loop shaped like generator output: rotate, mix, dead guard, round trip.
fn guarded_method() -> Method {
    let mut asm = InstructionAssembler::new();
    asm.br("start")
        .unwrap()
        .nop()
        .unwrap()
        .label("start")
        .unwrap()
        .ldloc(0)
        .unwrap()
        .ldc_i4(13)
        .unwrap()
        .shl()
        .unwrap()
        .ldloc(0)
        .unwrap()
        .ldc_i4(19)
        .unwrap()
        .shr_un()
        .unwrap()
        .or()
        .unwrap()
        .ldc_i4(0x5A5A_1234)
        .unwrap()
        .xor()
        .unwrap()
        .ldc_i4(3)
        .unwrap()
        .stloc(2)
        .unwrap()
        .ldloc(2)
        .unwrap()
        .ldc_i4(0)
        .unwrap()
        .bne_un("after")
        .unwrap()
        .ldloc(2)
        .unwrap()
        .ldc_i4(1)
        .unwrap()
        .sub()
        .unwrap()
        .stloc(2)
        .unwrap()
        .label("after")
        .unwrap()
        .ldloc(0)
        .unwrap()
        .conv_r_un()
        .unwrap()
        .conv_r8()
        .unwrap()
        .conv_u4()
        .unwrap()
        .add()
        .unwrap()
        .stloc(0)
        .unwrap();
    let (code, _, _) = asm.finish().unwrap();
    let instructions = decode_stream(&mut Parser::new(&code), 0).unwrap();

    Method::new(
        Token::new(0x0600_0001),
        "Decrypt",
        instructions,
        vec![
            Local::new(0, CilFlavor::U4),
            Local::new(1, CilFlavor::U4),
            Local::new(2, CilFlavor::I4),
        ],
        vec![],
        true,
    )
}

/// Benchmark keystream decryption of a single resource and of a batch
fn bench_decrypt(c: &mut Criterion) {
    let method = guarded_method();
    let data: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();

    let mut group = c.benchmark_group("decrypt");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("single_resource", |b| {
        let mut decrypter = ResourceDecrypter::new(&method).unwrap();
        b.iter(|| black_box(decrypter.decrypt(black_box(&data)).unwrap()));
    });
    group.finish();

    let resources: Vec<&[u8]> = data.chunks(4096).collect();
    let mut group = c.benchmark_group("decrypt_all");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("sixteen_resources", |b| {
        let decrypter = ResourceDecrypter::new(&method).unwrap();
        b.iter(|| black_box(decrypt_all(&decrypter, black_box(&resources)).unwrap()));
    });
    group.finish();
}

/// Benchmark locating the loop in the decrypter method
fn bench_locate(c: &mut Criterion) {
    let method = guarded_method();
    c.bench_function("locate", |b| {
        b.iter(|| black_box(ResourceDecrypter::new(black_box(&method)).unwrap()));
    });
}

criterion_group!(benches, bench_decrypt, bench_locate);
criterion_main!(benches);
