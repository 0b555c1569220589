//! Offline model fitting for the `ipo-train` binary.
//!
//! Generates the synthetic IPO dataset, fits a bootstrap ensemble of
//! variance-reducing regression trees, and bundles the result into a
//! [`ModelArtifact`]. One-shot: no checkpointing, no validation loop.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::artifact::ModelArtifact;
use crate::model::{Forest, Model, Node, Tree};

/// Fitting parameters.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Synthetic dataset size
    pub rows: usize,
    /// Number of trees in the ensemble
    pub trees: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// RNG seed for data generation and bootstrap sampling
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            rows: 5000,
            trees: 50,
            max_depth: 8,
            min_samples_leaf: 5,
            seed: 42,
        }
    }
}

/// An encoded training set plus the metadata that describes its columns.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_columns: Vec<String>,
    pub category_maps: BTreeMap<String, Vec<String>>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

const EXCHANGES: [&str; 3] = ["NSE", "BSE", "OTH"];
const SECTORS: [&str; 4] = ["TECH", "FIN", "HEALTH", "CONS"];

/// Generate the synthetic listing dataset.
///
/// Issue prices are uniform in 10..1000, listing dates span 2023, and the
/// target is `(issue_price mod 10) * 0.7 + (month - 6) * 0.2` plus N(0, 2)
/// noise. Category maps are the sorted value universes, so codes are stable.
pub fn synthetic_dataset(rows: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut exchange_map: Vec<String> = EXCHANGES.iter().map(|s| s.to_string()).collect();
    exchange_map.sort();
    let mut sector_map: Vec<String> = SECTORS.iter().map(|s| s.to_string()).collect();
    sector_map.sort();

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");

    let mut data_rows = Vec::with_capacity(rows);
    let mut targets = Vec::with_capacity(rows);
    for _ in 0..rows {
        let issue_price = rng.gen_range(10.0..1000.0);
        let exchange = EXCHANGES[rng.gen_range(0..EXCHANGES.len())];
        let sector = SECTORS[rng.gen_range(0..SECTORS.len())];
        let date = start + Duration::days(rng.gen_range(0..365));

        let month = f64::from(date.month());
        let day = f64::from(date.day());
        let exchange_code = exchange_map.iter().position(|c| c == exchange).unwrap() as f64;
        let sector_code = sector_map.iter().position(|c| c == sector).unwrap() as f64;

        let noise = sample_normal(&mut rng, 0.0, 2.0);
        targets.push((issue_price % 10.0) * 0.7 + (month - 6.0) * 0.2 + noise);
        data_rows.push(vec![issue_price, month, day, exchange_code, sector_code]);
    }

    Dataset {
        feature_columns: [
            "issue_price",
            "listing_month",
            "listing_day",
            "exchange_code",
            "sector_code",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        category_maps: BTreeMap::from([
            ("exchange".to_string(), exchange_map),
            ("sector".to_string(), sector_map),
        ]),
        rows: data_rows,
        targets,
    }
}

/// Box-Muller normal sample.
fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen();
    mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Generate data, fit the ensemble, and bundle the artifact.
pub fn train_artifact(config: &TrainConfig) -> ModelArtifact {
    let dataset = synthetic_dataset(config.rows, config.seed);
    info!(
        rows = dataset.rows.len(),
        trees = config.trees,
        max_depth = config.max_depth,
        "fitting ensemble"
    );
    let forest = fit_forest(&dataset.rows, &dataset.targets, config);

    ModelArtifact {
        model: Model::Forest(forest),
        feature_columns: dataset.feature_columns,
        category_maps: dataset.category_maps,
    }
}

/// Fit a bootstrap ensemble of regression trees.
///
/// Feature importances are accumulated as total impurity (SSE) decrease per
/// feature across all splits, normalized to sum to 1.
pub fn fit_forest(rows: &[Vec<f64>], targets: &[f64], config: &TrainConfig) -> Forest {
    assert!(!rows.is_empty(), "cannot fit on an empty dataset");
    let width = rows[0].len();
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let mut importance = vec![0.0; width];

    let mut trees = Vec::with_capacity(config.trees);
    for _ in 0..config.trees {
        let sample: Vec<usize> = (0..rows.len())
            .map(|_| rng.gen_range(0..rows.len()))
            .collect();
        let mut builder = TreeBuilder {
            rows,
            targets,
            config,
            nodes: Vec::new(),
            importance: &mut importance,
        };
        builder.grow(&sample, 0);
        trees.push(Tree {
            nodes: builder.nodes,
        });
    }

    let total: f64 = importance.iter().sum();
    let feature_importances = if total > 0.0 {
        Some(importance.iter().map(|v| v / total).collect())
    } else {
        None
    };

    Forest {
        trees,
        feature_importances,
    }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    config: &'a TrainConfig,
    nodes: Vec<Node>,
    importance: &'a mut [f64],
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl TreeBuilder<'_> {
    /// Grow a subtree over `indices`, returning its root node index.
    fn grow(&mut self, indices: &[usize], depth: usize) -> usize {
        let (mean, sse) = self.mean_sse(indices);

        // Reserve the slot first; children are appended during recursion.
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
            || sse <= f64::EPSILON
        {
            return index;
        }
        let Some(split) = self.best_split(indices, sse) else {
            return index;
        };

        self.importance[split.feature] += split.gain;
        let left = self.grow(&split.left, depth + 1);
        let right = self.grow(&split.right, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            value: mean,
            left,
            right,
        };
        index
    }

    fn mean_sse(&self, indices: &[usize]) -> (f64, f64) {
        let n = indices.len() as f64;
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let mean = sum / n;
        let sse: f64 = indices
            .iter()
            .map(|&i| {
                let d = self.targets[i] - mean;
                d * d
            })
            .sum();
        (mean, sse)
    }

    /// Exhaustive variance-reduction split search over every feature.
    fn best_split(&self, indices: &[usize], parent_sse: f64) -> Option<BestSplit> {
        let width = self.rows[indices[0]].len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<BestSplit> = None;

        for feature in 0..width {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                self.rows[a][feature]
                    .partial_cmp(&self.rows[b][feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            // Prefix sums over the sorted order for O(1) SSE at each cut.
            let n = order.len();
            let mut prefix_sum = vec![0.0; n + 1];
            let mut prefix_sq = vec![0.0; n + 1];
            for (i, &row) in order.iter().enumerate() {
                let y = self.targets[row];
                prefix_sum[i + 1] = prefix_sum[i] + y;
                prefix_sq[i + 1] = prefix_sq[i] + y * y;
            }

            for cut in min_leaf..=(n - min_leaf) {
                let lo = self.rows[order[cut - 1]][feature];
                let hi = self.rows[order[cut]][feature];
                if lo >= hi {
                    continue;
                }

                let n_l = cut as f64;
                let n_r = (n - cut) as f64;
                let sum_l = prefix_sum[cut];
                let sum_r = prefix_sum[n] - sum_l;
                let sse_l = prefix_sq[cut] - sum_l * sum_l / n_l;
                let sse_r = (prefix_sq[n] - prefix_sq[cut]) - sum_r * sum_r / n_r;

                let gain = parent_sse - (sse_l + sse_r);
                if gain <= 0.0 {
                    continue;
                }
                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (lo + hi) / 2.0,
                        gain,
                        left: order[..cut].to_vec(),
                        right: order[cut..].to_vec(),
                    });
                }
            }
        }
        best
    }
}
