//! Species-accumulation (rarefaction) estimation over dereplicated genomes.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RarefactionError {
    /// Sampling without replacement is undefined for depths outside 1..=N.
    #[error("invalid sampling depth {depth} for a population of {population} genomes")]
    InvalidDepth { depth: usize, population: usize },

    #[error("at least one repetition is required")]
    NoRepetitions,
}

/// Genome-to-cluster assignments, dense-encoded for cheap counting.
///
/// Cluster labels are interned in first-seen order; each genome maps to
/// exactly one cluster, so the clusters partition the genome set.
#[derive(Debug, Clone, Default)]
pub struct ClusterAssignments {
    genome_clusters: Vec<u32>,
    num_clusters: usize,
}

impl ClusterAssignments {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut cluster_ids: std::collections::HashMap<String, u32> =
            std::collections::HashMap::new();
        let mut genome_clusters = Vec::new();

        for (_genome, cluster) in pairs {
            let next_id = cluster_ids.len() as u32;
            let id = *cluster_ids.entry(cluster.to_string()).or_insert(next_id);
            genome_clusters.push(id);
        }

        let num_clusters = cluster_ids.len();
        ClusterAssignments {
            genome_clusters,
            num_clusters,
        }
    }

    pub fn num_genomes(&self) -> usize {
        self.genome_clusters.len()
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn is_empty(&self) -> bool {
        self.genome_clusters.is_empty()
    }
}

/// One point on the rarefaction curve: distinct-cluster statistics across
/// repetitions at a fixed sampling depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub depth: usize,
    pub mean_clusters: f64,
    pub std_dev: f64,
}

/// Draw `depth` genomes without replacement and count the distinct clusters
/// represented in the sample.
///
/// Uses a partial Fisher-Yates shuffle over an index array, so each draw
/// costs O(depth) rather than O(population).
pub fn sample_distinct_clusters<R: Rng>(
    assignments: &ClusterAssignments,
    depth: usize,
    rng: &mut R,
) -> Result<usize, RarefactionError> {
    let population = assignments.num_genomes();
    if depth == 0 || depth > population {
        return Err(RarefactionError::InvalidDepth { depth, population });
    }

    let mut indices: Vec<u32> = (0..population as u32).collect();
    let (sampled, _) = indices.partial_shuffle(rng, depth);

    let mut seen = vec![false; assignments.num_clusters];
    let mut distinct = 0;
    for &g in sampled.iter() {
        let cluster = assignments.genome_clusters[g as usize] as usize;
        if !seen[cluster] {
            seen[cluster] = true;
            distinct += 1;
        }
    }
    Ok(distinct)
}

/// Estimate expected distinct-cluster counts at sampling depths
/// {step, 2*step, ...} up to the population size N. When the step does not
/// evenly divide N a final partial step at depth N is emitted, so the last
/// point always covers the full population.
///
/// Each repetition shuffles the genome index array once and reads the
/// distinct-cluster count at every depth checkpoint from the growing prefix,
/// which keeps the total cost at O(N * repetitions). Repetitions run in
/// parallel; with a fixed `seed` the output is fully reproducible because
/// every repetition derives its own RNG from (seed, repetition index).
pub fn rarefaction_curve(
    assignments: &ClusterAssignments,
    repetitions: usize,
    step: usize,
    seed: Option<u64>,
) -> Result<Vec<CurvePoint>, RarefactionError> {
    let population = assignments.num_genomes();
    if population == 0 {
        return Ok(Vec::new());
    }
    if repetitions == 0 {
        return Err(RarefactionError::NoRepetitions);
    }
    if step == 0 {
        return Err(RarefactionError::InvalidDepth {
            depth: 0,
            population,
        });
    }

    let mut depths: Vec<usize> = (1..=population / step).map(|k| k * step).collect();
    if depths.last() != Some(&population) {
        depths.push(population);
    }

    let counts: Vec<Vec<usize>> = (0..repetitions)
        .into_par_iter()
        .map(|rep| {
            let mut rng = repetition_rng(seed, rep);
            let mut order: Vec<u32> = (0..population as u32).collect();
            order.shuffle(&mut rng);

            let mut seen = vec![false; assignments.num_clusters];
            let mut distinct = 0usize;
            let mut at_depth = Vec::with_capacity(depths.len());
            let mut next = 0usize;

            for (drawn, &g) in order.iter().enumerate() {
                let cluster = assignments.genome_clusters[g as usize] as usize;
                if !seen[cluster] {
                    seen[cluster] = true;
                    distinct += 1;
                }
                if next < depths.len() && drawn + 1 == depths[next] {
                    at_depth.push(distinct);
                    next += 1;
                }
            }
            at_depth
        })
        .collect();

    let points = depths
        .iter()
        .enumerate()
        .map(|(col, &depth)| {
            let samples: Vec<f64> = counts.iter().map(|row| row[col] as f64).collect();
            CurvePoint {
                depth,
                mean_clusters: Statistics::mean(&samples),
                std_dev: Statistics::population_std_dev(&samples),
            }
        })
        .collect();

    Ok(points)
}

fn repetition_rng(seed: Option<u64>, rep: usize) -> StdRng {
    match seed {
        Some(base) => {
            StdRng::seed_from_u64(base.wrapping_add((rep as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
        }
        None => StdRng::from_entropy(),
    }
}
