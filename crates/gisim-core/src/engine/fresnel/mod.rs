//! Fresnel solvers: per-slice reflection/transmission coefficients for a
//! flat slice stack, with per-wavevector memoization.

pub mod magnetic;
pub mod scalar;

use super::element::SimulationElement;
use super::error::EngineError;
use super::slices::ProcessedSample;
use magnetic::{MatrixRtCoefficients, compute_matrix};
use nalgebra::Vector3;
use scalar::{ScalarRtCoefficients, compute_scalar};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Per-slice coefficient vector for one wavevector; scalar or spin-matrix
/// depending on the active solver variant.
#[derive(Debug, Clone, PartialEq)]
pub enum CoefficientSet {
    Scalar(Vec<ScalarRtCoefficients>),
    Matrix(Vec<MatrixRtCoefficients>),
}

impl CoefficientSet {
    pub fn as_scalar(&self) -> Option<&[ScalarRtCoefficients]> {
        match self {
            CoefficientSet::Scalar(v) => Some(v),
            CoefficientSet::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[MatrixRtCoefficients]> {
        match self {
            CoefficientSet::Matrix(v) => Some(v),
            CoefficientSet::Scalar(_) => None,
        }
    }
}

/// Exact-bit cache key: many detector elements share the same incident
/// direction, and tolerance-free equality keeps lookups write-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WavevectorKey([u64; 3]);

impl WavevectorKey {
    fn new(k: Vector3<f64>) -> Self {
        Self([k.x.to_bits(), k.y.to_bits(), k.z.to_bits()])
    }
}

/// Memoizing coefficient map over one processed sample. Owned by a single
/// worker: the cache is worker-private, so a cache miss during the parallel
/// phase never races another worker.
pub struct FresnelMap<'a> {
    sample: &'a ProcessedSample,
    cache_in: RefCell<HashMap<WavevectorKey, Rc<CoefficientSet>>>,
    cache_out: RefCell<HashMap<WavevectorKey, Rc<CoefficientSet>>>,
}

impl<'a> FresnelMap<'a> {
    pub fn new(sample: &'a ProcessedSample) -> Self {
        Self {
            sample,
            cache_in: RefCell::new(HashMap::new()),
            cache_out: RefCell::new(HashMap::new()),
        }
    }

    /// Coefficients for the incident direction of an element.
    pub fn coefficients_in(
        &self,
        element: &SimulationElement,
    ) -> Result<Rc<CoefficientSet>, EngineError> {
        self.lookup(element.k_i(), false)
    }

    /// Coefficients for the time-reversed outgoing direction of an element.
    pub fn coefficients_out(
        &self,
        element: &SimulationElement,
    ) -> Result<Rc<CoefficientSet>, EngineError> {
        self.lookup(-element.k_f(), true)
    }

    /// Coefficients for an arbitrary incident wavevector (specular scans).
    pub fn coefficients(&self, k: Vector3<f64>) -> Result<Rc<CoefficientSet>, EngineError> {
        self.lookup(k, false)
    }

    fn lookup(
        &self,
        k: Vector3<f64>,
        time_reversed: bool,
    ) -> Result<Rc<CoefficientSet>, EngineError> {
        let key = WavevectorKey::new(k);
        let cache = if time_reversed {
            &self.cache_out
        } else {
            &self.cache_in
        };
        if let Some(cached) = cache.borrow().get(&key) {
            return Ok(Rc::clone(cached));
        }
        let computed = Rc::new(self.compute(k, time_reversed)?);
        cache.borrow_mut().insert(key, Rc::clone(&computed));
        Ok(computed)
    }

    fn compute(
        &self,
        k: Vector3<f64>,
        time_reversed: bool,
    ) -> Result<CoefficientSet, EngineError> {
        if self.sample.polarized() {
            // Time reversal flips the induction seen by the wave.
            let coeffs = compute_matrix(
                self.sample.slices(),
                k,
                self.sample.external_field(),
                time_reversed,
            )?;
            Ok(CoefficientSet::Matrix(coeffs))
        } else {
            let coeffs = compute_scalar(self.sample.slices(), k)?;
            Ok(CoefficientSet::Scalar(coeffs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material::Material;
    use crate::core::sample::{Layer, MultiLayer};
    use crate::engine::config::SimulationOptions;

    fn processed_sample() -> ProcessedSample {
        let sample = MultiLayer::new()
            .add_layer(Layer::new(0.0, Material::vacuum()))
            .add_layer(Layer::new(120.0, Material::from_name("SiO2").unwrap()))
            .add_layer(Layer::new(0.0, Material::from_name("Si").unwrap()));
        ProcessedSample::build(&sample, &SimulationOptions::default()).unwrap()
    }

    #[test]
    fn repeated_lookup_returns_bit_identical_coefficients() {
        let processed = processed_sample();
        let map = FresnelMap::new(&processed);
        let k = Vector3::new(4.0, 0.0, -0.05);

        let first = map.coefficients(k).unwrap();
        let second = map.coefficients(k).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        let a = first.as_scalar().unwrap();
        let b = second.as_scalar().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.kz.re.to_bits(), y.kz.re.to_bits());
            assert_eq!(x.r.re.to_bits(), y.r.re.to_bits());
            assert_eq!(x.t.im.to_bits(), y.t.im.to_bits());
        }
    }

    #[test]
    fn in_and_out_directions_are_cached_separately() {
        let processed = processed_sample();
        let map = FresnelMap::new(&processed);
        let element =
            SimulationElement::new(1.54, 0.01, 0.0, 0.01, 0.0, 1.0);

        let incoming = map.coefficients_in(&element).unwrap();
        let outgoing = map.coefficients_out(&element).unwrap();
        assert!(!Rc::ptr_eq(&incoming, &outgoing));
        // Specular geometry: same |kz| in both directions.
        let kz_in = incoming.as_scalar().unwrap()[0].kz;
        let kz_out = outgoing.as_scalar().unwrap()[0].kz;
        assert!((kz_in - kz_out).norm() < 1e-12);
    }

    #[test]
    fn scalar_sample_produces_scalar_coefficients() {
        let processed = processed_sample();
        let map = FresnelMap::new(&processed);
        let set = map.coefficients(Vector3::new(4.0, 0.0, -0.04)).unwrap();
        assert!(set.as_scalar().is_some());
        assert!(set.as_matrix().is_none());
    }

    #[test]
    fn magnetic_sample_produces_matrix_coefficients() {
        let sample = MultiLayer::new()
            .add_layer(Layer::new(0.0, Material::vacuum()))
            .add_layer(Layer::new(
                80.0,
                Material::from_name("Fe")
                    .unwrap()
                    .with_magnetization(Vector3::new(0.0, 1.7e5, 0.0)),
            ))
            .add_layer(Layer::new(0.0, Material::from_name("Si").unwrap()));
        let processed = ProcessedSample::build(&sample, &SimulationOptions::default()).unwrap();
        let map = FresnelMap::new(&processed);
        let set = map.coefficients(Vector3::new(4.0, 0.0, -0.04)).unwrap();
        assert!(set.as_matrix().is_some());
    }
}
