//! Statistical recall check against brute-force search (spec §8).
//!
//! Too slow for the default `cargo test` loop — run explicitly with
//! `cargo test --test recall -- --ignored`.

use hnswgraph::metric::{CosineDistance, Metric};
use hnswgraph::{HnswIndex, IndexOptions, NodeKey};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DIM: usize = 100;
const DATASET_SIZE: usize = 10_000;
const QUERY_COUNT: usize = 100;
const K: usize = 10;

fn random_unit_vector(rng: &mut ChaCha8Rng) -> Vec<f32> {
    let raw: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        raw
    } else {
        raw.into_iter().map(|v| v / norm).collect()
    }
}

fn brute_force_top_k(dataset: &[(NodeKey, Vec<f32>)], target: &[f32], k: usize) -> Vec<NodeKey> {
    let metric = CosineDistance::default();
    let mut scored: Vec<(NodeKey, f32)> = dataset
        .iter()
        .map(|(key, vector)| (*key, metric.distance(target, vector).unwrap()))
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.into_iter().take(k).map(|(key, _)| key).collect()
}

#[test]
#[ignore]
fn recall_at_10_against_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let dataset: Vec<(NodeKey, Vec<f32>)> = (0..DATASET_SIZE as u32)
        .map(|i| (NodeKey(i), random_unit_vector(&mut rng)))
        .collect();

    let mut index: HnswIndex<CosineDistance> =
        HnswIndex::new(IndexOptions::default(), 7).unwrap();
    for (key, vector) in &dataset {
        index.insert(*key, vector.clone()).unwrap();
    }

    let queries: Vec<Vec<f32>> = (0..QUERY_COUNT).map(|_| random_unit_vector(&mut rng)).collect();

    let mut hits = 0usize;
    let mut total = 0usize;
    for query in &queries {
        let exact: std::collections::HashSet<NodeKey> =
            brute_force_top_k(&dataset, query, K).into_iter().collect();
        let approx = index.search_with_ef(query, K, 200).unwrap();

        for result in &approx {
            if exact.contains(&result.key) {
                hits += 1;
            }
        }
        total += K;
    }

    let recall = hits as f64 / total as f64;
    assert!(recall >= 0.9, "recall@{K} was {recall:.3}, expected >= 0.9");
}

#[test]
#[ignore]
fn top1_accuracy_against_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(123);
    let dataset: Vec<(NodeKey, Vec<f32>)> = (0..DATASET_SIZE as u32)
        .map(|i| (NodeKey(i), random_unit_vector(&mut rng)))
        .collect();

    let mut index: HnswIndex<CosineDistance> =
        HnswIndex::new(IndexOptions::default(), 11).unwrap();
    for (key, vector) in &dataset {
        index.insert(*key, vector.clone()).unwrap();
    }

    let controls: Vec<&(NodeKey, Vec<f32>)> = dataset.iter().take(100).collect();
    let mut correct = 0usize;
    for (_, vector) in &controls {
        let exact = brute_force_top_k(&dataset, vector, 1);
        let approx = index.search_with_ef(vector, 1, 200).unwrap();
        if approx.first().map(|r| r.key) == exact.first().copied() {
            correct += 1;
        }
    }

    let accuracy = correct as f64 / controls.len() as f64;
    assert!(accuracy >= 0.85, "top-1 accuracy was {accuracy:.3}, expected >= 0.85");
}
