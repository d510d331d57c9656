//! Win detector and step throughput on a full-size board.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gomoku_engine::game::win::detect;
use gomoku_engine::{Application, Cell, Color, EngineConfig, GomokuEngine, Intent};

const WIDTH: usize = 19;

/// Busy board with no completed line: stripes of two of each color.
fn crowded_board() -> Vec<Cell> {
    (0..WIDTH * WIDTH)
        .map(|i| {
            let (row, col) = (i / WIDTH, i % WIDTH);
            match (row + col / 2) % 3 {
                0 => Some(Color::Black),
                1 => Some(Color::White),
                _ => None,
            }
        })
        .collect()
}

fn bench_detect(c: &mut Criterion) {
    let empty: Vec<Cell> = vec![None; WIDTH * WIDTH];
    let crowded = crowded_board();

    let mut late_win = empty.clone();
    for k in 0..5 {
        late_win[(WIDTH - 1) * WIDTH + 10 + k] = Some(Color::White);
    }

    c.bench_function("detect_empty", |b| b.iter(|| detect(black_box(&empty), WIDTH)));
    c.bench_function("detect_crowded", |b| b.iter(|| detect(black_box(&crowded), WIDTH)));
    c.bench_function("detect_last_row", |b| b.iter(|| detect(black_box(&late_win), WIDTH)));
}

fn bench_step(c: &mut Criterion) {
    let mut batch = vec![Intent::join("p1"), Intent::join("p2")];
    for i in 0..150 {
        batch.push(Intent::play("p1", i * 2));
        batch.push(Intent::play("p2", i * 2 + 1));
    }

    c.bench_function("step_full_game", |b| {
        b.iter(|| {
            let mut engine = GomokuEngine::new(EngineConfig::default()).unwrap();
            engine.init(b"bench");
            black_box(engine.step(black_box(&batch)))
        })
    });
}

criterion_group!(benches, bench_detect, bench_step);
criterion_main!(benches);
