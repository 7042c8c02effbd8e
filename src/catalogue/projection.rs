//! 3D similarity coordinates for the catalogue map view.
//!
//! Documents are vectorized with TF-IDF and reduced to three principal
//! components, then min-max scaled into the unit cube the client renders.
//! The projection is decorative, not analytic: whenever the corpus is too
//! small or the numerics misbehave, documents fall back to uniform random
//! coordinates rather than failing the build.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use super::tfidf;

pub const PROJECTION_DIMS: usize = 3;
pub const MIN_CORPUS_SIZE: usize = 3;

const POWER_ITERATIONS: usize = 300;
const CONVERGENCE_EPS: f64 = 1e-10;
// Fixed seed so repeated runs over the same corpus agree.
const POWER_SEED: u64 = 1453;

fn random_coords(rng: &mut impl Rng) -> [f64; 3] {
    [
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    ]
}

/// Project `(id, search_text)` pairs to coordinates in `[-1, 1]^3`.
///
/// Documents with blank text are excluded from the fit and receive random
/// coordinates; if fewer than [`MIN_CORPUS_SIZE`] documents carry text, or
/// the decomposition degenerates, every document does.
pub fn project_documents(entries: &[(String, String)]) -> BTreeMap<String, [f64; 3]> {
    if entries.is_empty() {
        return BTreeMap::new();
    }
    let mut rng = rand::thread_rng();

    let corpus: Vec<(&str, &str)> = entries
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(id, text)| (id.as_str(), text.as_str()))
        .collect();

    if corpus.len() < MIN_CORPUS_SIZE {
        warn!(
            documents = entries.len(),
            with_text = corpus.len(),
            "not enough text for a similarity projection; using random coordinates"
        );
        return entries
            .iter()
            .map(|(id, _)| (id.clone(), random_coords(&mut rng)))
            .collect();
    }

    let texts: Vec<&str> = corpus.iter().map(|(_, text)| *text).collect();
    let fit = tfidf::fit_transform(&texts, tfidf::MAX_FEATURES);
    let components = PROJECTION_DIMS.min(corpus.len()).min(fit.matrix.ncols());

    let projected = if components == 0 {
        None
    } else {
        principal_components(&fit.matrix, components)
    };

    let Some(projected) = projected else {
        error!("similarity projection degenerated; using random coordinates");
        return entries
            .iter()
            .map(|(id, _)| (id.clone(), random_coords(&mut rng)))
            .collect();
    };

    let normalized = normalize_to_unit_cube(projected);
    debug!(
        documents = corpus.len(),
        terms = fit.vocabulary.len(),
        components,
        "projected corpus"
    );

    let mut result: BTreeMap<String, [f64; 3]> = BTreeMap::new();
    for (row, (id, _)) in corpus.iter().enumerate() {
        let mut point = [0.0f64; 3];
        for axis in 0..normalized.ncols().min(PROJECTION_DIMS) {
            point[axis] = normalized[[row, axis]];
        }
        result.insert((*id).to_string(), point);
    }
    for (id, _) in entries {
        result
            .entry(id.clone())
            .or_insert_with(|| random_coords(&mut rng));
    }
    result
}

fn norm(vector: &Array1<f64>) -> f64 {
    vector.dot(vector).sqrt()
}

fn orthogonalize(vector: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for base in basis {
        let projection = vector.dot(base);
        *vector -= &(base * projection);
    }
}

/// Dominant eigenvector of a symmetric positive semidefinite matrix by
/// power iteration, constrained orthogonal to `basis`. `None` when the
/// matrix has no energy left in that subspace.
fn dominant_eigenvector(
    gram: &Array2<f64>,
    rng: &mut StdRng,
    basis: &[Array1<f64>],
) -> Option<Array1<f64>> {
    let n = gram.nrows();
    let mut vector = Array1::from_shape_fn(n, |_| rng.gen_range(-1.0..1.0));
    orthogonalize(&mut vector, basis);
    let start_norm = norm(&vector);
    if start_norm < 1e-12 {
        return None;
    }
    vector.mapv_inplace(|v| v / start_norm);

    for _ in 0..POWER_ITERATIONS {
        let mut next = gram.dot(&vector);
        orthogonalize(&mut next, basis);
        let next_norm = norm(&next);
        if !next_norm.is_finite() || next_norm < 1e-12 {
            return None;
        }
        next.mapv_inplace(|v| v / next_norm);
        let delta = (&next - &vector).mapv(|v| v * v).sum().sqrt();
        vector = next;
        if delta < CONVERGENCE_EPS {
            break;
        }
    }
    Some(vector)
}

/// Principal-component scores of the (row-major) sample matrix.
///
/// Components whose variance has been exhausted are left as zero columns,
/// matching the near-zero scores a full decomposition would produce for a
/// rank-deficient corpus. Returns `None` only when the numerics produce
/// non-finite values.
fn principal_components(matrix: &Array2<f64>, components: usize) -> Option<Array2<f64>> {
    let mean = matrix.mean_axis(Axis(0))?;
    let centered = matrix - &mean;
    let mut deflated = centered.t().dot(&centered);

    let mut projection = Array2::<f64>::zeros((matrix.nrows(), components));
    let mut basis: Vec<Array1<f64>> = Vec::with_capacity(components);
    let mut rng = StdRng::seed_from_u64(POWER_SEED);

    for component in 0..components {
        let Some(vector) = dominant_eigenvector(&deflated, &mut rng, &basis) else {
            break;
        };
        let eigenvalue = vector.dot(&deflated.dot(&vector));
        let scores = centered.dot(&vector);
        projection.column_mut(component).assign(&scores);

        let outer = outer_product(&vector);
        deflated = &deflated - &(outer * eigenvalue);
        basis.push(vector);
    }

    projection
        .iter()
        .all(|value| value.is_finite())
        .then_some(projection)
}

fn outer_product(vector: &Array1<f64>) -> Array2<f64> {
    let n = vector.len();
    Array2::from_shape_fn((n, n), |(i, j)| vector[i] * vector[j])
}

/// Min-max scale each axis to `[-1, 1]`; a zero range maps the whole axis
/// to -1, the same place a constant axis lands after scaling.
fn normalize_to_unit_cube(mut coords: Array2<f64>) -> Array2<f64> {
    for mut column in coords.columns_mut() {
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if max - min == 0.0 { 1.0 } else { max - min };
        column.mapv_inplace(|v| 2.0 * (v - min) / range - 1.0);
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(id, text)| (id.to_string(), text.to_string()))
            .collect()
    }

    fn assert_in_unit_cube(coords: &BTreeMap<String, [f64; 3]>) {
        for (id, point) in coords {
            for axis in point {
                assert!(
                    (-1.0..=1.0).contains(axis),
                    "{id} axis {axis} outside [-1, 1]"
                );
            }
        }
    }

    #[test]
    fn tiny_corpus_gets_random_coordinates_for_everyone() {
        let input = entries(&[("a", "psalter"), ("b", "gradual"), ("c", "")]);
        let got = project_documents(&input);
        assert_eq!(got.len(), 3);
        assert_in_unit_cube(&got);
    }

    #[test]
    fn distinct_clusters_separate_on_the_first_axis() {
        let input = entries(&[
            ("a1", "latin psalter gothic script parchment liturgy"),
            ("a2", "latin psalter gothic script parchment liturgy"),
            ("b1", "greek herbal treatise botanical drawings paper"),
            ("b2", "greek herbal treatise botanical drawings paper"),
        ]);
        let got = project_documents(&input);
        assert_eq!(got.len(), 4);
        assert_in_unit_cube(&got);

        // Identical texts project identically; the clusters land apart.
        assert_eq!(got["a1"], got["a2"]);
        assert_eq!(got["b1"], got["b2"]);
        assert!((got["a1"][0] - got["b1"][0]).abs() > 1.0);
    }

    #[test]
    fn first_axis_spans_the_unit_interval() {
        let input = entries(&[
            ("a", "apocalypse commentary beatus illuminated"),
            ("b", "chronicle annals regnal lists"),
            ("c", "herbal medical recipes antidotarium"),
            ("d", "psalter canticles litany calendar"),
        ]);
        let got = project_documents(&input);
        let min = got.values().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        let max = got.values().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
        assert!((min + 1.0).abs() < 1e-9);
        assert!((max - 1.0).abs() < 1e-9);
    }

    #[test]
    fn textless_documents_still_receive_coordinates() {
        let input = entries(&[
            ("a", "missal roman use"),
            ("b", "breviary sarum use"),
            ("c", "antiphonal cistercian"),
            ("blank", "   "),
        ]);
        let got = project_documents(&input);
        assert_eq!(got.len(), 4);
        assert!(got.contains_key("blank"));
        assert_in_unit_cube(&got);
    }

    #[test]
    fn identical_corpus_collapses_without_panicking() {
        let input = entries(&[
            ("a", "identical text"),
            ("b", "identical text"),
            ("c", "identical text"),
            ("d", "identical text"),
        ]);
        let got = project_documents(&input);
        assert_eq!(got.len(), 4);
        assert_in_unit_cube(&got);
        assert_eq!(got["a"], got["b"]);
    }

    #[test]
    fn principal_components_recover_a_dominant_direction() {
        // Points along the x axis with a touch of y noise.
        let data = ndarray::arr2(&[
            [10.0, 0.1],
            [-10.0, -0.1],
            [20.0, 0.2],
            [-20.0, -0.2],
        ]);
        let got = principal_components(&data, 2).unwrap();
        // The first component carries far more variance than the second.
        let var0: f64 = got.column(0).iter().map(|v| v * v).sum();
        let var1: f64 = got.column(1).iter().map(|v| v * v).sum();
        assert!(var0 > var1 * 100.0);
    }
}
