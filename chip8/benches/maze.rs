use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    {
        let mut vm = Chip8Vm::new(Chip8Conf {
            rng_seed: Some(0),
            ..Chip8Conf::default()
        });
        vm.load_bytecode(include_bytes!("../programs/maze"))
            .unwrap();

        c.bench_function("maze bytecode", |b| {
            b.iter(|| {
                let cycle_count = black_box(1000_usize);
                black_box(vm.run_cycles(cycle_count))
            })
        });
    }

    {
        let bytecode = include_bytes!("../programs/maze");

        c.bench_function("maze decode", |b| {
            b.iter(|| {
                for word in bytecode.chunks_exact(2) {
                    black_box(Op::decode(u16::from_be_bytes([word[0], word[1]])));
                }
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
