use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pdf_objects::{KnownName, Obj, PdfResult};

fn font_dict(entries: usize) -> PdfResult<Obj> {
    let dict = Obj::new_dict(None, entries);
    for i in 0..entries {
        dict.dict_put_int(format!("F{i}").as_str(), i as i64)?;
    }
    dict.dict_put("Type", &Obj::known(KnownName::Font))?;
    Ok(dict)
}

fn bench_dict_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict_lookup");
    for entries in [8usize, 64, 512] {
        let Ok(dict) = font_dict(entries) else {
            continue;
        };
        let key = format!("F{}", entries / 2);
        group.bench_with_input(BenchmarkId::new("unsorted", entries), &entries, |b, _| {
            b.iter(|| black_box(dict.dict_get_int(key.as_str())))
        });

        let sorted = dict.copy_dict().unwrap_or_default();
        sorted.dict_sort().ok();
        group.bench_with_input(BenchmarkId::new("sorted", entries), &entries, |b, _| {
            b.iter(|| black_box(sorted.dict_get_int(key.as_str())))
        });
    }
    group.finish();
}

fn bench_array_push(c: &mut Criterion) {
    c.bench_function("array_push_1000", |b| {
        b.iter(|| {
            let arr = Obj::new_array(None, 0);
            for i in 0..1000 {
                arr.array_push_int(i).ok();
            }
            black_box(arr.array_len())
        })
    });
}

fn bench_serialize(c: &mut Criterion) {
    let Ok(dict) = font_dict(64) else {
        return;
    };
    let kids = Obj::new_array(None, 256);
    for i in 0..256 {
        kids.array_push_real(i as f32 * 0.25).ok();
    }
    dict.dict_put("Widths", &kids).ok();

    let mut group = c.benchmark_group("serialize");
    for tight in [false, true] {
        group.bench_with_input(BenchmarkId::new("tight", tight), &tight, |b, &tight| {
            b.iter(|| black_box(dict.to_pdf_bytes(tight).map(|v| v.len())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dict_lookup, bench_array_push, bench_serialize);
criterion_main!(benches);
