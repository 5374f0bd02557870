//! # Kinematics Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use swerve_lib::swerve_ctrl::{ChassisGeometry, RobotMotionVector};

fn kinematics_benchmark(c: &mut Criterion) {
    let geometry = ChassisGeometry::new(0.7, 0.6, [0.0, 0.05]);

    // Mix of translation-only, rotation-only and saturating demands
    let motions = [
        RobotMotionVector::new(0.5, 30.0, 0.0),
        RobotMotionVector::new(0.0, 0.0, 0.8),
        RobotMotionVector::new(1.0, 275.0, 1.0),
    ];

    c.bench_function("calc_module_vectors", |b| {
        b.iter(|| {
            for m in motions.iter() {
                black_box(geometry.calc_module_vectors(black_box(m)));
            }
        })
    });
}

criterion_group!(benches, kinematics_benchmark);
criterion_main!(benches);
