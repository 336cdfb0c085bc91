use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tcforge_core::format::{IOFormat, IOFormatBuilder, IOSegment};
use tcforge_core::printer::IOVariablesPrinter;
use tcforge_core::scoring::{DiffMode, DiffScorer};
use tcforge_core::variable::{Value, Values, Variable};

fn array_format() -> IOFormat {
    IOFormatBuilder::new()
        .prepare_for_input_format()
        .add_io_segment(IOSegment::line(vec![Variable::scalar("N")]).unwrap())
        .add_io_segment(IOSegment::line(vec![Variable::sized_vector("A", "N")]).unwrap())
        .build()
        .unwrap()
}

fn grid_format() -> IOFormat {
    IOFormatBuilder::new()
        .prepare_for_input_format()
        .add_io_segment(IOSegment::line(vec![Variable::scalar("R"), Variable::scalar("C")]).unwrap())
        .add_io_segment(IOSegment::grid("G", "R", "C").unwrap())
        .build()
        .unwrap()
}

fn bench_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("print_input");

    let array = IOVariablesPrinter::new(array_format(), None).unwrap();
    for n in [10usize, 1_000, 100_000] {
        let values = Values::new()
            .with("N", n as i64)
            .with("A", Value::vector((0..n as i64).map(|i| i * 7 % 1_000_003)));
        group.bench_function(format!("array_{n}"), |b| {
            b.iter(|| {
                let mut out = Vec::with_capacity(n * 8);
                array.print_input(black_box(&values), &mut out).unwrap();
                out
            })
        });
    }

    let grid = IOVariablesPrinter::new(grid_format(), None).unwrap();
    let rows: Vec<String> = (0..500)
        .map(|r| (0..500).map(|c| if (r + c) % 3 == 0 { '#' } else { '.' }).collect())
        .collect();
    let values = Values::new()
        .with("R", 500)
        .with("C", 500)
        .with("G", Value::char_grid(&rows));
    group.bench_function("char_grid_500x500", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(501 * 500);
            grid.print_input(black_box(&values), &mut out).unwrap();
            out
        })
    });

    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    let text: String = (0..10_000).map(|i| format!("{i} {}\n", i * 2)).collect();
    let spaced: String = (0..10_000).map(|i| format!("{i}   {} \n", i * 2)).collect();

    let exact = DiffScorer::new(DiffMode::Exact);
    let loose = DiffScorer::new(DiffMode::IgnoreWhitespace);

    group.bench_function("exact_10k_lines", |b| {
        b.iter(|| exact.compare(black_box(text.as_bytes()), black_box(text.as_bytes())))
    });

    group.bench_function("ignore_whitespace_10k_lines", |b| {
        b.iter(|| loose.compare(black_box(spaced.as_bytes()), black_box(text.as_bytes())))
    });

    group.finish();
}

criterion_group!(benches, bench_print, bench_diff);
criterion_main!(benches);
