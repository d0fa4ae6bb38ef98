//! Compilation performance benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use cbpf_frontend::{Instruction, JumpCond, compile};

/// Benchmark compilation of small filters.
fn bench_small_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/small");

    // Minimal valid program
    let minimal = vec![Instruction::RetConstant { val: 0 }];

    group.bench_function("minimal", |b| {
        b.iter(|| compile(black_box(&minimal)))
    });

    // EtherType check
    let ethertype = vec![
        Instruction::LoadAbsolute { off: 12, size: 2 },
        Instruction::JumpIf { cond: JumpCond::Equal, val: 0x0800, skip_true: 1, skip_false: 0 },
        Instruction::RetConstant { val: 0 },
        Instruction::RetConstant { val: 65535 },
    ];

    group.bench_function("ethertype", |b| {
        b.iter(|| compile(black_box(&ethertype)))
    });

    // tcp dst port 80, the classic tcpdump shape
    let tcp_port = vec![
        Instruction::LoadAbsolute { off: 12, size: 2 },
        Instruction::JumpIf { cond: JumpCond::Equal, val: 0x0800, skip_true: 0, skip_false: 8 },
        Instruction::LoadAbsolute { off: 23, size: 1 },
        Instruction::JumpIf { cond: JumpCond::Equal, val: 6, skip_true: 0, skip_false: 6 },
        Instruction::LoadAbsolute { off: 20, size: 2 },
        Instruction::JumpIf { cond: JumpCond::BitsSet, val: 0x1fff, skip_true: 4, skip_false: 0 },
        Instruction::LoadMemShift { off: 14 },
        Instruction::LoadIndirect { off: 16, size: 2 },
        Instruction::JumpIf { cond: JumpCond::Equal, val: 80, skip_true: 0, skip_false: 1 },
        Instruction::RetConstant { val: 65535 },
        Instruction::RetConstant { val: 0 },
    ];

    group.bench_function("tcp_port", |b| {
        b.iter(|| compile(black_box(&tcp_port)))
    });

    group.finish();
}

/// Benchmark compilation scaling with program size.
fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/scaling");

    for insn_count in [10, 50, 100, 500, 1000] {
        // A long run of guarded loads split by conditionals.
        let mut insns = Vec::with_capacity(insn_count);
        for i in 0..insn_count - 1 {
            if i % 4 == 3 {
                insns.push(Instruction::JumpIf {
                    cond: JumpCond::Equal,
                    val: i as u32,
                    skip_true: 0,
                    skip_false: 0,
                });
            } else {
                insns.push(Instruction::LoadAbsolute { off: (i % 64) as u32, size: 4 });
            }
        }
        insns.push(Instruction::RetA);

        group.throughput(Throughput::Elements(insn_count as u64));
        group.bench_with_input(
            BenchmarkId::new("instructions", insn_count),
            &insn_count,
            |b, _| b.iter(|| compile(black_box(&insns))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_small_filters, bench_scaling);

criterion_main!(benches);
