use criterion::{Criterion, criterion_group, criterion_main};
use image::testing::ImageBuilder;

fn program() -> Vec<u8> {
    let mut code = Vec::new();
    for i in 0..1000u32 {
        // push i32 imm; add i64 r0, imm; load i64 [r0 + r1 * 8] r2; jmp
        code.push(0x03);
        code.extend_from_slice(&i.to_le_bytes());
        code.extend_from_slice(&[0x34, 0x05]);
        code.extend_from_slice(&u64::from(i).to_le_bytes());
        code.extend_from_slice(&[0x15, 0x04, 0x1F, 0x05, 0x06, 0x08, 0x00, 0x00, 0x07]);
        code.push(0xE1);
        code.extend_from_slice(&0x40u64.to_le_bytes());
    }
    code.push(0x50);
    code
}

pub fn disassemble_benchmark(c: &mut Criterion) {
    let bytes = ImageBuilder::new().names(&["code"]).code(&program()).build();
    let image = image::parse(&bytes).unwrap();

    c.bench_function("disassemble", |b| b.iter(|| disasm::disassemble(&image)));
}

pub fn build_catalog_benchmark(c: &mut Criterion) {
    c.bench_function("build catalog", |b| {
        b.iter(|| disasm::build_catalog(disasm::encoding::INSTRUCTIONS))
    });
}

criterion_group!(benches, disassemble_benchmark, build_catalog_benchmark);
criterion_main!(benches);
