use super::config::SimulationOptions;
use super::error::EngineError;
use crate::core::material::Material;
use crate::core::roughness::Roughness;
use crate::core::sample::{Layer, MultiLayer};
use nalgebra::Vector3;
use num_complex::Complex64;
use tracing::debug;

/// A horizontally homogeneous slice of the flattened sample. Ordered top
/// (ambient) to bottom (substrate); the two terminal slices are
/// zero-thickness half-spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub thickness: f64,
    pub material: Material,
    /// Roughness of this slice's top interface.
    pub top_roughness: Option<Roughness>,
}

impl Slice {
    /// Magnetic induction inside the slice: applied field plus the slice
    /// material's magnetization, scaled by the vacuum permeability.
    pub fn b_field(&self, external_field: Vector3<f64>) -> Vector3<f64> {
        const MU_0: f64 = 4e-7 * std::f64::consts::PI;
        let magnetization = self.material.magnetization.unwrap_or_else(Vector3::zeros);
        MU_0 * (external_field + magnetization)
    }
}

/// The flat slice stack plus the sample-level quantities every solver needs.
/// Built once per run; read-only afterwards.
#[derive(Debug, Clone)]
pub struct ProcessedSample {
    slices: Vec<Slice>,
    cross_correlation_length: f64,
    external_field: Vector3<f64>,
    /// Indices of the slice range each original layer maps onto.
    layer_slice_ranges: Vec<(usize, usize)>,
    polarized: bool,
}

impl ProcessedSample {
    pub fn build(
        sample: &MultiLayer,
        options: &SimulationOptions,
    ) -> Result<Self, EngineError> {
        options.validate()?;
        let n_layers = sample.n_layers();
        if n_layers == 0 {
            return Err(EngineError::EmptySample);
        }

        let mut slices = Vec::new();
        let mut layer_slice_ranges = Vec::with_capacity(n_layers);
        for (layer_index, layer) in sample.layers.iter().enumerate() {
            let begin = slices.len();
            let is_terminal = layer_index == 0 || layer_index == n_layers - 1;
            if is_terminal {
                // Half-spaces are always emitted as single zero-thickness
                // slices, whatever they contain.
                slices.push(Slice {
                    thickness: 0.0,
                    material: layer.material.clone(),
                    top_roughness: layer.top_roughness,
                });
            } else if layer.layouts.is_empty() || !options.use_average_materials {
                slices.push(Slice {
                    thickness: layer.thickness,
                    material: layer.material.clone(),
                    top_roughness: layer.top_roughness,
                });
            } else if options.n_subslices == 0 {
                return Err(EngineError::InvalidSubSliceCount {
                    layer_index,
                    n_subslices: options.n_subslices,
                });
            } else {
                add_averaged_subslices(&mut slices, layer, options.n_subslices);
            }
            layer_slice_ranges.push((begin, slices.len()));
        }

        debug!(
            n_layers,
            n_slices = slices.len(),
            "flattened sample into slice stack"
        );

        Ok(Self {
            slices,
            cross_correlation_length: sample.cross_correlation_length,
            external_field: sample.external_field,
            layer_slice_ranges,
            polarized: sample.requires_matrix_coefficients(),
        })
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn n_slices(&self) -> usize {
        self.slices.len()
    }

    pub fn cross_correlation_length(&self) -> f64 {
        self.cross_correlation_length
    }

    pub fn external_field(&self) -> Vector3<f64> {
        self.external_field
    }

    pub fn polarized(&self) -> bool {
        self.polarized
    }

    /// First slice index produced by the given layer.
    pub fn layer_slice_index(&self, layer_index: usize) -> usize {
        self.layer_slice_ranges[layer_index].0
    }
}

/// Emits n sub-slices for a particle-bearing layer, each carrying the
/// volume-weighted average permittivity of matrix and particles at the
/// sub-slice mid-height.
fn add_averaged_subslices(slices: &mut Vec<Slice>, layer: &Layer, n_subslices: usize) {
    let dz = layer.thickness / n_subslices as f64;
    for i in 0..n_subslices {
        // Height above the layer bottom; particles rest on the bottom.
        let z = (n_subslices - 1 - i) as f64 * dz + dz / 2.0;
        let mut epsilon = layer.material.permittivity();
        for layout in &layer.layouts {
            let total_abundance = layout.total_abundance();
            if total_abundance <= 0.0 {
                continue;
            }
            for particle in &layout.particles {
                let area_fraction =
                    layout.total_surface_density * particle.abundance / total_abundance
                        * particle.form_factor.cross_section(z);
                let fraction = area_fraction.min(1.0);
                epsilon += fraction
                    * (particle.material.permittivity() - layer.material.permittivity());
            }
        }
        let n_avg = complex_sqrt_upper(epsilon);
        slices.push(Slice {
            thickness: dz,
            material: Material {
                refractive_index: n_avg,
                magnetization: layer.material.magnetization,
            },
            // Only the topmost sub-slice inherits the layer's interface
            // roughness.
            top_roughness: if i == 0 { layer.top_roughness } else { None },
        });
    }
}

/// Principal square root with the physical branch: non-negative imaginary
/// part everywhere (decaying evanescent waves).
pub fn complex_sqrt_upper(z: Complex64) -> Complex64 {
    let root = z.sqrt();
    if root.im < 0.0 { -root } else { root }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formfactor::FormFactor;
    use crate::core::sample::{Particle, ParticleLayout};

    fn three_layer_sample() -> MultiLayer {
        MultiLayer::new()
            .add_layer(Layer::new(0.0, Material::vacuum()))
            .add_layer(Layer::new(100.0, Material::from_name("SiO2").unwrap()))
            .add_layer(Layer::new(0.0, Material::from_name("Si").unwrap()))
    }

    fn gold_sphere_layout() -> ParticleLayout {
        ParticleLayout::new(vec![Particle {
            form_factor: FormFactor::Sphere { radius: 20.0 },
            material: Material::from_name("Au").unwrap(),
            abundance: 1.0,
        }])
        .with_surface_density(1e-4)
    }

    #[test]
    fn terminal_slices_have_zero_thickness() {
        let processed =
            ProcessedSample::build(&three_layer_sample(), &SimulationOptions::default()).unwrap();
        let slices = processed.slices();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices.first().unwrap().thickness, 0.0);
        assert_eq!(slices.last().unwrap().thickness, 0.0);
        assert!(slices[1].thickness > 0.0);
    }

    #[test]
    fn slice_count_equals_layer_count_without_averaging() {
        let sample = three_layer_sample();
        let processed = ProcessedSample::build(&sample, &SimulationOptions::default()).unwrap();
        assert_eq!(processed.n_slices(), sample.n_layers());
    }

    #[test]
    fn empty_sample_is_a_configuration_error() {
        let result = ProcessedSample::build(&MultiLayer::new(), &SimulationOptions::default());
        assert!(matches!(result, Err(EngineError::EmptySample)));
    }

    #[test]
    fn averaging_splits_decorated_layer_into_subslices() {
        let sample = MultiLayer::new()
            .add_layer(Layer::new(0.0, Material::vacuum()))
            .add_layer(
                Layer::new(50.0, Material::from_name("SiO2").unwrap())
                    .with_layout(gold_sphere_layout()),
            )
            .add_layer(Layer::new(0.0, Material::from_name("Si").unwrap()));
        let options = SimulationOptions {
            use_average_materials: true,
            n_workers: 1,
            n_subslices: 5,
        };
        let processed = ProcessedSample::build(&sample, &options).unwrap();
        assert_eq!(processed.n_slices(), 2 + 5);
        for slice in &processed.slices()[1..6] {
            assert!((slice.thickness - 10.0).abs() < 1e-12);
        }
    }

    #[test]
    fn averaged_subslice_index_differs_from_matrix_index() {
        let matrix = Material::from_name("SiO2").unwrap();
        let sample = MultiLayer::new()
            .add_layer(Layer::new(0.0, Material::vacuum()))
            .add_layer(Layer::new(40.0, matrix.clone()).with_layout(gold_sphere_layout()))
            .add_layer(Layer::new(0.0, Material::from_name("Si").unwrap()));
        let options = SimulationOptions {
            use_average_materials: true,
            n_workers: 1,
            n_subslices: 4,
        };
        let processed = ProcessedSample::build(&sample, &options).unwrap();
        // The bottom sub-slice intersects the sphere near its equator, where
        // the gold fraction is largest.
        let bottom = &processed.slices()[4];
        assert!(bottom.material.refractive_index != matrix.refractive_index);
    }

    #[test]
    fn layer_slice_index_tracks_subslice_expansion() {
        let sample = MultiLayer::new()
            .add_layer(Layer::new(0.0, Material::vacuum()))
            .add_layer(
                Layer::new(50.0, Material::from_name("SiO2").unwrap())
                    .with_layout(gold_sphere_layout()),
            )
            .add_layer(Layer::new(0.0, Material::from_name("Si").unwrap()));
        let options = SimulationOptions {
            use_average_materials: true,
            n_workers: 1,
            n_subslices: 3,
        };
        let processed = ProcessedSample::build(&sample, &options).unwrap();
        assert_eq!(processed.layer_slice_index(0), 0);
        assert_eq!(processed.layer_slice_index(1), 1);
        assert_eq!(processed.layer_slice_index(2), 4);
    }

    #[test]
    fn zero_subslices_with_particles_is_rejected() {
        let sample = MultiLayer::new()
            .add_layer(Layer::new(0.0, Material::vacuum()))
            .add_layer(
                Layer::new(50.0, Material::from_name("SiO2").unwrap())
                    .with_layout(gold_sphere_layout()),
            )
            .add_layer(Layer::new(0.0, Material::from_name("Si").unwrap()));
        let options = SimulationOptions {
            use_average_materials: true,
            n_workers: 1,
            n_subslices: 0,
        };
        let result = ProcessedSample::build(&sample, &options);
        assert!(matches!(
            result,
            Err(EngineError::InvalidSubSliceCount { layer_index: 1, .. })
        ));
    }

    #[test]
    fn sqrt_branch_keeps_imaginary_part_non_negative() {
        let below_critical = Complex64::new(-1e-5, 0.0);
        let root = complex_sqrt_upper(below_critical);
        assert!(root.im >= 0.0);

        let absorbing = Complex64::new(1e-5, -1e-7);
        let root = complex_sqrt_upper(absorbing);
        assert!(root.im >= 0.0);
    }
}
