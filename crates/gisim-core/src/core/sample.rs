use super::formfactor::FormFactor;
use super::interference::InterferenceFunction;
use super::material::Material;
use super::roughness::Roughness;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One particle species inside a layout: shape, material, and its relative
/// abundance among the layout's species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub form_factor: FormFactor,
    pub material: Material,
    pub abundance: f64,
}

/// How the particles of a layout are arranged in the plane. The arrangement
/// fixes the dimensionality an interference function must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleArrangement {
    /// No positional order.
    Dilute,
    /// Particles correlated along chains (1D order).
    Rows,
    /// Particles on a 2D mesh.
    Mesh,
}

impl ParticleArrangement {
    pub fn dimension(&self) -> u8 {
        match self {
            ParticleArrangement::Dilute => 0,
            ParticleArrangement::Rows => 1,
            ParticleArrangement::Mesh => 2,
        }
    }
}

/// A population of particles embedded in one layer, together with their
/// structural correlations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleLayout {
    pub particles: Vec<Particle>,
    pub interference: InterferenceFunction,
    pub arrangement: ParticleArrangement,
    /// Particles per unit area.
    pub total_surface_density: f64,
    /// Variance of the vertical particle position, for Debye-Waller damping
    /// of the incoherent sum.
    pub position_variance: f64,
}

impl ParticleLayout {
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            interference: InterferenceFunction::None,
            arrangement: ParticleArrangement::Dilute,
            total_surface_density: 1e-4,
            position_variance: 0.0,
        }
    }

    pub fn with_interference(
        mut self,
        interference: InterferenceFunction,
        arrangement: ParticleArrangement,
    ) -> Self {
        self.interference = interference;
        self.arrangement = arrangement;
        self
    }

    pub fn with_surface_density(mut self, density: f64) -> Self {
        self.total_surface_density = density;
        self
    }

    pub fn with_position_variance(mut self, variance: f64) -> Self {
        self.position_variance = variance;
        self
    }

    pub fn total_abundance(&self) -> f64 {
        self.particles.iter().map(|p| p.abundance).sum()
    }
}

/// One layer of the sample: thickness, bulk material, roughness of its top
/// interface, and any embedded particle layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub thickness: f64,
    pub material: Material,
    pub top_roughness: Option<Roughness>,
    pub layouts: Vec<ParticleLayout>,
}

impl Layer {
    pub fn new(thickness: f64, material: Material) -> Self {
        Self {
            thickness,
            material,
            top_roughness: None,
            layouts: Vec::new(),
        }
    }

    pub fn with_roughness(mut self, roughness: Roughness) -> Self {
        self.top_roughness = Some(roughness);
        self
    }

    pub fn with_layout(mut self, layout: ParticleLayout) -> Self {
        self.layouts.push(layout);
        self
    }
}

/// The full sample description, ordered top (ambient) to bottom (substrate).
/// Consumed read-only by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLayer {
    pub layers: Vec<Layer>,
    /// Vertical correlation length coupling the roughness of different
    /// interfaces.
    pub cross_correlation_length: f64,
    /// Externally applied magnetic field (A/m).
    pub external_field: Vector3<f64>,
}

impl MultiLayer {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            cross_correlation_length: 0.0,
            external_field: Vector3::zeros(),
        }
    }

    pub fn add_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_cross_correlation_length(mut self, length: f64) -> Self {
        self.cross_correlation_length = length;
        self
    }

    pub fn with_external_field(mut self, field: Vector3<f64>) -> Self {
        self.external_field = field;
        self
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// True if any layer material carries a magnetization or an external
    /// field is applied; selects the matrix Fresnel solver.
    pub fn requires_matrix_coefficients(&self) -> bool {
        self.external_field.norm() > 0.0
            || self.layers.iter().any(|l| l.material.is_magnetic())
    }
}

impl Default for MultiLayer {
    fn default() -> Self {
        Self::new()
    }
}
