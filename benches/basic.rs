// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Row streaming benchmarks
//!
//! The workbook is generated in memory (20k rows of mixed values), so no
//! fixture is needed:
//!
//! ```bash
//! cargo bench --bench basic
//! ```

use std::hint::black_box;
use std::io::Cursor;
use std::ops::ControlFlow;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use rust_xlsxwriter::{Format, Workbook};
use xlstream::{ColIndexing, ResultMode, RowIndexing, Xlsx};

const ROWS: u32 = 20_000;

fn generate() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format("yyyy-mm-dd hh:mm");
    let sheet = workbook.add_worksheet();
    for (col, title) in ["id", "name", "amount", "when", "flag"].iter().enumerate() {
        sheet
            .write_string(0, col as u16, *title)
            .expect("cannot write header");
    }
    for row in 1..=ROWS {
        sheet.write_number(row, 0, row).expect("cannot write id");
        sheet
            .write_string(row, 1, format!("item {}", row % 500))
            .expect("cannot write name");
        sheet
            .write_number(row, 2, row as f64 * 1.25)
            .expect("cannot write amount");
        sheet
            .write_number_with_format(row, 3, 45000. + row as f64 / 24., &date)
            .expect("cannot write date");
        sheet
            .write_boolean(row, 4, row % 2 == 0)
            .expect("cannot write flag");
    }
    workbook.save_to_buffer().expect("cannot save workbook")
}

fn open(buf: &[u8]) -> Xlsx<Cursor<Vec<u8>>> {
    let mut wb = Xlsx::new(Cursor::new(buf.to_vec())).expect("cannot open workbook");
    wb.select_first_sheet().expect("no sheet");
    wb
}

fn bench_rows(c: &mut Criterion) {
    let buf = generate();
    let mut group = c.benchmark_group("rows");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("open", |b| b.iter(|| black_box(open(&buf))));

    group.bench_function("stream", |b| {
        b.iter(|| {
            let mut wb = open(&buf);
            let count = wb
                .rows(ResultMode::new())
                .expect("cannot read rows")
                .map(|r| r.map(|r| r.len()).unwrap_or(0))
                .sum::<usize>();
            black_box(count)
        })
    });

    group.bench_function("first_row_keys", |b| {
        b.iter(|| {
            let mut wb = open(&buf);
            let rows = wb
                .read_rows(
                    ResultMode::new()
                        .with_first_row(true)
                        .with_row(RowIndexing::ZeroBased),
                )
                .expect("cannot read rows");
            black_box(rows.len())
        })
    });

    group.bench_function("columns", |b| {
        b.iter(|| {
            let mut wb = open(&buf);
            wb.set_read_columns("B:D").expect("invalid columns");
            let cols = wb
                .read_columns(
                    ResultMode::new()
                        .with_row(RowIndexing::OneBased)
                        .with_col(ColIndexing::OneBased),
                )
                .expect("cannot read columns");
            black_box(cols.len())
        })
    });

    group.bench_function("first_100", |b| {
        b.iter(|| {
            let mut wb = open(&buf);
            let mut rows = wb.rows(ResultMode::new()).expect("cannot read rows");
            let mut n = 0;
            rows.for_each_row(|_| {
                n += 1;
                if n == 100 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .expect("cannot read rows");
            black_box(n)
        })
    });

    group.bench_function("formatted_dates", |b| {
        b.iter(|| {
            let mut wb = open(&buf);
            wb.set_read_columns("D:D").expect("invalid columns");
            wb.set_date_format("%Y-%m-%d %H:%M");
            black_box(wb.read_cells().expect("cannot read cells").len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_rows);
criterion_main!(benches);
