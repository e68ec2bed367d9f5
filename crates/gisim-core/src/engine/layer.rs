use super::element::SimulationElement;
use super::error::EngineError;
use super::fresnel::FresnelMap;
use super::slices::ProcessedSample;
use super::strategy::CoherenceStrategy;
use crate::core::sample::MultiLayer;

/// Computes the scattering contribution of one particle layout in one layer
/// and adds it into every element of the range it is run over. One instance
/// is driven per worker partition; contributions are additive across layers
/// and layouts.
pub struct DecoratedLayerComputation<'a> {
    strategy: CoherenceStrategy<'a>,
    surface_density: f64,
}

impl<'a> DecoratedLayerComputation<'a> {
    pub fn new(
        sample: &'a MultiLayer,
        processed: &ProcessedSample,
        layer_index: usize,
        layout_index: usize,
    ) -> Result<Self, EngineError> {
        let layout = &sample.layers[layer_index].layouts[layout_index];
        let slice_index = processed.layer_slice_index(layer_index);
        let strategy =
            CoherenceStrategy::new(layout, layer_index, layout_index, slice_index)?;
        Ok(Self {
            strategy,
            surface_density: layout.total_surface_density,
        })
    }

    /// Evaluates the owned range; any failure aborts this range only.
    pub fn run(
        &self,
        fresnel: &FresnelMap,
        elements: &mut [SimulationElement],
    ) -> Result<(), EngineError> {
        for element in elements.iter_mut() {
            let coeffs_in = fresnel.coefficients_in(element)?;
            let coeffs_out = fresnel.coefficients_out(element)?;
            let contribution = self.strategy.evaluate(element, &coeffs_in, &coeffs_out)?;
            element.add_intensity(element.weight * self.surface_density * contribution);
        }
        Ok(())
    }
}

/// Builds the orchestrators for every (layer, layout) pair, validating all
/// strategies up front so configuration faults surface before any element is
/// evaluated.
pub fn build_layer_computations<'a>(
    sample: &'a MultiLayer,
    processed: &ProcessedSample,
) -> Result<Vec<DecoratedLayerComputation<'a>>, EngineError> {
    let mut computations = Vec::new();
    for (layer_index, layer) in sample.layers.iter().enumerate() {
        for layout_index in 0..layer.layouts.len() {
            computations.push(DecoratedLayerComputation::new(
                sample,
                processed,
                layer_index,
                layout_index,
            )?);
        }
    }
    Ok(computations)
}
