//! Benchmarks for the tree layout.
//!
//! Run with: cargo bench -p kifu-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kifu_core::{Color, GameTree, Move, NodeData, NodeId, Point};
use kifu_layout::{LayoutConfig, TreeLayout};
use std::hint::black_box;

/// A main line of `moves` moves with a short variation every `every` moves.
fn make_tree(moves: usize, every: usize) -> GameTree {
    let mut tree = GameTree::new(19);
    let mut at = tree.root();
    let mut branch_points: Vec<NodeId> = Vec::new();
    for i in 0..moves {
        let point = Point::new((i % 19) as u16, ((i / 19) % 19) as u16);
        let color = if i % 2 == 0 { Color::Black } else { Color::White };
        at = tree.create_child(at, NodeData::play(Move::play(color, point)));
        if i % every == 0 {
            branch_points.push(at);
        }
    }
    for (n, parent) in branch_points.into_iter().enumerate() {
        let mut v = parent;
        for depth in 0..(n % 7 + 1) {
            let point = Point::new(depth as u16, 18);
            v = tree.create_child(v, NodeData::play(Move::play(Color::Black, point)));
        }
    }
    tree
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/rebuild");

    for moves in [100, 300, 1000] {
        let tree = make_tree(moves, 5);
        let mut layout = TreeLayout::new(LayoutConfig::default());
        group.bench_with_input(BenchmarkId::new("variations_every_5", moves), &tree, |b, tree| {
            b.iter(|| {
                layout.rebuild(tree);
                black_box(layout.columns())
            })
        });
    }

    group.finish();
}

fn bench_viewport(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/elements_within");
    let tree = make_tree(1000, 3);
    let layout = TreeLayout::for_tree(&tree, LayoutConfig::default());

    for rows in [10u32, 40, 200] {
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            b.iter(|| black_box(layout.elements_within(500, 500 + rows).count()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_viewport);
criterion_main!(benches);
