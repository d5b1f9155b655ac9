use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use fevtk::{Binary, Layout, Model, ModelBuilder, Placement, VtkWriter, WriterOptions};

/// `n` by `n` quads with a random displacement field
fn plate(n: usize) -> Model {
    let side = n + 1;
    let id = |i: usize, j: usize| (j * side + i + 1) as u64;

    let mut builder = ModelBuilder::new("plate").part("PLATE");
    for j in 0..side {
        for i in 0..side {
            builder = builder.node(id(i, j), [i as f64, j as f64, 0.0]);
        }
    }
    for j in 0..n {
        for i in 0..n {
            let nodes = [id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)];
            builder = builder.element((j * n + i + 1) as u64, "CPS4R", nodes);
        }
    }
    let mut model = builder.build().unwrap();

    let displacement: Array2<f64> = Array2::random((side * side, 3), Uniform::new(-1., 1.));
    let values = displacement
        .outer_iter()
        .enumerate()
        .map(|(index, row)| ((index + 1) as u64, row.to_vec()));
    model
        .add_field("U", Placement::Nodes, values, Layout::Vector(3))
        .unwrap();

    model
}

fn write_binary_bench(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();

    for n in [100, 300] {
        let model = plate(n);
        let options = WriterOptions::new(dir.path());

        // a fresh writer restarts the frame counter, so every iteration overwrites the same file
        c.bench_function(&format!("write binary {n}x{n}"), |b| {
            b.iter(|| {
                VtkWriter::new(Binary, options.clone())
                    .write(black_box(&model))
                    .unwrap()
            })
        });
    }
}

criterion_group!(benches, write_binary_bench);
criterion_main!(benches);
