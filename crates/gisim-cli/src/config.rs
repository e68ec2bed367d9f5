use crate::error::{CliError, Result};
use gisim::core::formfactor::FormFactor;
use gisim::core::instrument::{Beam, SphericalDetector};
use gisim::core::interference::InterferenceFunction;
use gisim::core::material::Material;
use gisim::core::roughness::Roughness;
use gisim::core::sample::{
    Layer, MultiLayer, Particle, ParticleArrangement, ParticleLayout,
};
use gisim::engine::config::SimulationOptions;
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// A material reference in the scene file: either a tabulated name or
/// explicit optical constants, optionally magnetized.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MaterialSpec {
    pub name: Option<String>,
    pub delta: Option<f64>,
    pub beta: Option<f64>,
    /// Magnetization vector in A/m.
    pub magnetization: Option<[f64; 3]>,
}

impl MaterialSpec {
    pub fn build(&self) -> Result<Material> {
        let base = match (&self.name, self.delta, self.beta) {
            (Some(name), None, None) => Material::from_name(name).ok_or_else(|| {
                CliError::Config(format!("unknown material name '{name}'"))
            })?,
            (None, Some(delta), beta) => Material::from_delta_beta(delta, beta.unwrap_or(0.0)),
            _ => {
                return Err(CliError::Config(
                    "material must give either a name or delta/beta constants".into(),
                ));
            }
        };
        Ok(match self.magnetization {
            Some([x, y, z]) => base.with_magnetization(Vector3::new(x, y, z)),
            None => base,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RoughnessSpec {
    pub sigma: f64,
    #[serde(default = "default_hurst")]
    pub hurst: f64,
    #[serde(default)]
    pub lateral_corr_length: f64,
}

fn default_hurst() -> f64 {
    1.0
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "shape")]
pub enum FormFactorSpec {
    Sphere {
        radius: f64,
    },
    Box {
        length: f64,
        width: f64,
        height: f64,
    },
}

impl FormFactorSpec {
    fn build(&self) -> FormFactor {
        match *self {
            FormFactorSpec::Sphere { radius } => FormFactor::Sphere { radius },
            FormFactorSpec::Box {
                length,
                width,
                height,
            } => FormFactor::Box {
                length,
                width,
                height,
            },
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ParticleSpec {
    #[serde(flatten)]
    pub form_factor: FormFactorSpec,
    pub material: MaterialSpec,
    #[serde(default = "default_abundance")]
    pub abundance: f64,
}

fn default_abundance() -> f64 {
    1.0
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "model")]
pub enum InterferenceSpec {
    /// 1D paracrystal; distances in angstrom, angle-free.
    RadialParacrystal {
        peak_distance: f64,
        width: f64,
        #[serde(default)]
        damping_length: f64,
    },
    /// 2D lattice; the basis angle is given in degrees.
    Lattice2d {
        length_1: f64,
        length_2: f64,
        angle: f64,
        #[serde(default)]
        position_variance: f64,
    },
}

impl InterferenceSpec {
    fn build(&self) -> (InterferenceFunction, ParticleArrangement) {
        match *self {
            InterferenceSpec::RadialParacrystal {
                peak_distance,
                width,
                damping_length,
            } => (
                InterferenceFunction::RadialParacrystal {
                    peak_distance,
                    width,
                    damping_length,
                },
                ParticleArrangement::Rows,
            ),
            InterferenceSpec::Lattice2d {
                length_1,
                length_2,
                angle,
                position_variance,
            } => (
                InterferenceFunction::Lattice2d {
                    length_1,
                    length_2,
                    angle: angle.to_radians(),
                    position_variance,
                },
                ParticleArrangement::Mesh,
            ),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LayoutSpec {
    pub particles: Vec<ParticleSpec>,
    pub interference: Option<InterferenceSpec>,
    #[serde(default = "default_surface_density")]
    pub total_surface_density: f64,
    #[serde(default)]
    pub position_variance: f64,
}

fn default_surface_density() -> f64 {
    1e-4
}

impl LayoutSpec {
    fn build(&self) -> Result<ParticleLayout> {
        let particles = self
            .particles
            .iter()
            .map(|p| {
                Ok(Particle {
                    form_factor: p.form_factor.build(),
                    material: p.material.build()?,
                    abundance: p.abundance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut layout = ParticleLayout::new(particles)
            .with_surface_density(self.total_surface_density)
            .with_position_variance(self.position_variance);
        if let Some(interference) = &self.interference {
            let (function, arrangement) = interference.build();
            layout = layout.with_interference(function, arrangement);
        }
        Ok(layout)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LayerSpec {
    /// Thickness in angstrom; terminal layers may give 0.
    #[serde(default)]
    pub thickness: f64,
    pub material: MaterialSpec,
    pub roughness: Option<RoughnessSpec>,
    #[serde(default)]
    pub layouts: Vec<LayoutSpec>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SampleSpec {
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub cross_correlation_length: f64,
    /// Applied magnetic field in A/m.
    pub external_field: Option<[f64; 3]>,
}

impl SampleSpec {
    pub fn build(&self) -> Result<MultiLayer> {
        let mut sample = MultiLayer::new()
            .with_cross_correlation_length(self.cross_correlation_length);
        if let Some([x, y, z]) = self.external_field {
            sample = sample.with_external_field(Vector3::new(x, y, z));
        }
        for spec in &self.layers {
            let mut layer = Layer::new(spec.thickness, spec.material.build()?);
            if let Some(r) = &spec.roughness {
                layer = layer.with_roughness(Roughness::new(
                    r.sigma,
                    r.hurst,
                    r.lateral_corr_length,
                ));
            }
            for layout in &spec.layouts {
                layer = layer.with_layout(layout.build()?);
            }
            sample = sample.add_layer(layer);
        }
        Ok(sample)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BeamSpec {
    /// Wavelength in angstrom.
    pub wavelength: f64,
    /// Grazing incidence angle in degrees.
    pub alpha_i: f64,
    /// In-plane beam rotation in degrees.
    #[serde(default)]
    pub phi_i: f64,
    #[serde(default = "default_intensity")]
    pub intensity: f64,
    pub polarization: Option<[f64; 3]>,
}

fn default_intensity() -> f64 {
    1.0
}

impl BeamSpec {
    pub fn build(&self) -> Beam {
        let mut beam = Beam::new(self.wavelength, self.alpha_i.to_radians());
        beam.phi_i = self.phi_i.to_radians();
        beam.intensity = self.intensity;
        if let Some([x, y, z]) = self.polarization {
            beam = beam.with_polarization(Vector3::new(x, y, z));
        }
        beam
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DetectorSpec {
    pub n_phi: usize,
    /// Azimuthal detector range in degrees.
    pub phi_min: f64,
    pub phi_max: f64,
    pub n_alpha: usize,
    /// Exit-angle detector range in degrees.
    pub alpha_min: f64,
    pub alpha_max: f64,
}

impl DetectorSpec {
    pub fn build(&self) -> SphericalDetector {
        SphericalDetector::new(
            self.n_phi,
            self.phi_min.to_radians(),
            self.phi_max.to_radians(),
            self.n_alpha,
            self.alpha_min.to_radians(),
            self.alpha_max.to_radians(),
        )
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct OptionsSpec {
    pub workers: Option<usize>,
    pub subslices: Option<usize>,
    #[serde(default)]
    pub average_materials: bool,
}

impl OptionsSpec {
    pub fn build(&self) -> SimulationOptions {
        let defaults = SimulationOptions::default();
        SimulationOptions {
            use_average_materials: self.average_materials,
            n_workers: self.workers.unwrap_or(defaults.n_workers),
            n_subslices: self.subslices.unwrap_or(defaults.n_subslices),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SceneFile {
    pub sample: SampleSpec,
    pub beam: BeamSpec,
    pub detector: Option<DetectorSpec>,
    pub options: Option<OptionsSpec>,
}

impl SceneFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading scene file from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn options(&self) -> SimulationOptions {
        self.options
            .as_ref()
            .map(|o| o.build())
            .unwrap_or_default()
    }
}
