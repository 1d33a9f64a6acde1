//! Fixed-capacity modulation matrix routing LFO sources to rack parameters.
//!
//! Sources are simple LFOs ticked once per sample; routes accumulate into a
//! destination parameter id via [`ModulationMatrix::sum_for`]. A route may
//! also target another source's frequency (FM), which is applied once all
//! sources have ticked so the effect lands on the *next* sample rather than
//! the one that just produced it.
//!
//! No heap allocation: sources and routes live in const-generic arrays sized
//! at construction, mirroring [`crate::registry::ParameterRegistry`].

use crate::lfo::{Lfo, LfoWaveform};

/// How a route's bipolar source value is mapped onto `[min_value, max_value]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapCurve {
    /// `lerp(min, max, u)`
    #[default]
    Linear,
    /// `min * (max / min).powf(u)`, falling back to linear if `min <= 0`.
    Exponential,
}

/// Where a route's modulation is summed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModDestination {
    /// A parameter id in a [`crate::registry::ParameterRegistry`].
    Param(u16),
    /// The frequency (Hz, as an additive offset from its configured base) of
    /// another source in the same matrix, identified by source id.
    SourceFreq(u16),
}

/// One modulation source: an LFO with a stable external id.
#[derive(Debug, Clone)]
struct ModSource {
    id: u16,
    lfo: Lfo,
    base_freq_hz: f32,
    last_output: f32,
    active: bool,
}

impl ModSource {
    fn silent() -> Self {
        Self {
            id: 0,
            lfo: Lfo::default(),
            base_freq_hz: 0.0,
            last_output: 0.0,
            active: false,
        }
    }
}

/// One modulation route: source, destination, and how to map between them.
#[derive(Debug, Clone, Copy)]
pub struct ModRoute {
    /// Id of the source this route reads from.
    pub source_id: u16,
    /// Where the modulation value is summed.
    pub dest: ModDestination,
    /// Scales the bipolar source value when not using ranged mapping.
    pub depth: f32,
    /// Constant additive offset when not using ranged mapping.
    pub offset: f32,
    /// Curve used for ranged mapping.
    pub map: MapCurve,
    /// Ranged mapping bounds. Active only when `min_value < max_value`.
    pub min_value: f32,
    /// See [`ModRoute::min_value`].
    pub max_value: f32,
    active: bool,
}

impl ModRoute {
    /// A plain depth/offset route (no ranged mapping).
    pub fn new(source_id: u16, dest: ModDestination, depth: f32, offset: f32) -> Self {
        Self {
            source_id,
            dest,
            depth,
            offset,
            map: MapCurve::Linear,
            min_value: 0.0,
            max_value: 0.0,
            active: true,
        }
    }

    /// A ranged route: the source's bipolar value is mapped onto `[min, max]`.
    pub fn ranged(source_id: u16, dest: ModDestination, min: f32, max: f32, map: MapCurve) -> Self {
        Self {
            source_id,
            dest,
            depth: 0.0,
            offset: 0.0,
            map,
            min_value: min,
            max_value: max,
            active: true,
        }
    }

    #[inline]
    fn is_ranged(&self) -> bool {
        self.min_value < self.max_value
    }

    fn evaluate(&self, source_value: f32) -> f32 {
        if self.is_ranged() {
            let u = (source_value + 1.0) * 0.5;
            match self.map {
                MapCurve::Linear => self.min_value + (self.max_value - self.min_value) * u,
                MapCurve::Exponential => {
                    if self.min_value > 0.0 {
                        let ratio = self.max_value / self.min_value;
                        self.min_value * libm::powf(ratio, u)
                    } else {
                        self.min_value + (self.max_value - self.min_value) * u
                    }
                }
            }
        } else {
            self.offset + self.depth * source_value
        }
    }
}

/// A fixed-capacity set of LFO sources routed to parameter destinations.
///
/// `SOURCES` and `ROUTES` bound the maximum number of live sources and
/// routes; both arrays are allocated inline, so the matrix never allocates
/// once constructed.
#[derive(Debug)]
pub struct ModulationMatrix<const SOURCES: usize, const ROUTES: usize> {
    sources: [ModSource; SOURCES],
    source_count: usize,
    routes: [Option<ModRoute>; ROUTES],
    route_count: usize,
    sample_rate: f32,
}

impl<const SOURCES: usize, const ROUTES: usize> ModulationMatrix<SOURCES, ROUTES> {
    /// Create an empty matrix at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sources: core::array::from_fn(|_| ModSource::silent()),
            source_count: 0,
            routes: [None; ROUTES],
            route_count: 0,
            sample_rate,
        }
    }

    /// Update the sample rate for every source's LFO.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for source in &mut self.sources[..self.source_count] {
            source.lfo.set_sample_rate(sample_rate);
        }
    }

    /// Add (or reconfigure, if `id` already exists) an LFO source.
    ///
    /// Returns `false` if the matrix is full and `id` is new.
    pub fn add_lfo(
        &mut self,
        id: u16,
        wave: LfoWaveform,
        freq_hz: f32,
        phase01: f32,
    ) -> bool {
        if let Some(idx) = self.find_source_index(id) {
            let source = &mut self.sources[idx];
            source.lfo.set_waveform(wave);
            source.lfo.set_frequency(freq_hz);
            source.lfo.set_phase(phase01);
            source.base_freq_hz = freq_hz;
            source.active = true;
            return true;
        }
        if self.source_count >= SOURCES {
            return false;
        }
        let mut lfo = Lfo::new(self.sample_rate, freq_hz);
        lfo.set_waveform(wave);
        lfo.set_phase(phase01);
        self.sources[self.source_count] = ModSource {
            id,
            lfo,
            base_freq_hz: freq_hz,
            last_output: 0.0,
            active: true,
        };
        self.source_count += 1;
        true
    }

    /// Add a route. Returns `false` if the matrix is full.
    pub fn add_route(&mut self, route: ModRoute) -> bool {
        if self.route_count >= ROUTES {
            return false;
        }
        self.routes[self.route_count] = Some(route);
        self.route_count += 1;
        true
    }

    /// Remove all sources and routes.
    pub fn clear(&mut self) {
        self.source_count = 0;
        self.route_count = 0;
        for route in &mut self.routes {
            *route = None;
        }
    }

    /// Advance every active source by one sample, then apply any FM routes
    /// targeting a source's frequency so the effect lands on the next tick.
    pub fn tick(&mut self) {
        for source in &mut self.sources[..self.source_count] {
            if source.active {
                source.last_output = source.lfo.next();
            }
        }
        for route in self.routes[..self.route_count].iter().flatten() {
            let ModDestination::SourceFreq(target_id) = route.dest else {
                continue;
            };
            let Some(src_idx) = self.find_source_index(route.source_id) else {
                continue;
            };
            let source_value = self.sources[src_idx].last_output;
            let modulation = route.evaluate(source_value);
            if let Some(target_idx) = self.find_source_index(target_id) {
                let target = &mut self.sources[target_idx];
                let freq = (target.base_freq_hz + modulation).max(0.0);
                target.lfo.set_frequency(freq);
            }
        }
    }

    /// Sum every active route's contribution to `param_id`.
    pub fn sum_for(&self, param_id: u16) -> f32 {
        let mut acc = 0.0;
        for route in self.routes[..self.route_count].iter().flatten() {
            if route.dest != ModDestination::Param(param_id) {
                continue;
            }
            let Some(src_idx) = self.find_source_index(route.source_id) else {
                continue;
            };
            acc += route.evaluate(self.sources[src_idx].last_output);
        }
        acc
    }

    /// Number of configured sources.
    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// Number of configured routes.
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    fn find_source_index(&self, id: u16) -> Option<usize> {
        self.sources[..self.source_count]
            .iter()
            .position(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_for_combines_depth_offset_routes() {
        let mut matrix: ModulationMatrix<4, 8> = ModulationMatrix::new(48000.0);
        matrix.add_lfo(1, LfoWaveform::Square, 1.0, 0.0);
        matrix.add_route(ModRoute::new(1, ModDestination::Param(10), 0.5, 0.1));

        matrix.tick();
        // Square wave starts high (+1.0) at phase 0.
        let value = matrix.sum_for(10);
        assert!((value - 0.6).abs() < 1e-6, "got {value}");
    }

    #[test]
    fn ranged_route_maps_bipolar_into_bounds() {
        let mut matrix: ModulationMatrix<4, 8> = ModulationMatrix::new(48000.0);
        matrix.add_lfo(1, LfoWaveform::Square, 1.0, 0.0);
        matrix.add_route(ModRoute::ranged(
            1,
            ModDestination::Param(20),
            100.0,
            1100.0,
            MapCurve::Linear,
        ));

        matrix.tick();
        // Square wave is +1.0 at phase 0 -> u = 1.0 -> max_value.
        let value = matrix.sum_for(20);
        assert!((value - 1100.0).abs() < 1e-3, "got {value}");
    }

    #[test]
    fn fm_route_retunes_target_on_next_tick_only() {
        let mut matrix: ModulationMatrix<4, 8> = ModulationMatrix::new(48000.0);
        matrix.add_lfo(1, LfoWaveform::Square, 1.0, 0.0);
        matrix.add_lfo(2, LfoWaveform::Sine, 5.0, 0.0);
        matrix.add_route(ModRoute::new(1, ModDestination::SourceFreq(2), 2.0, 0.0));

        matrix.tick();
        // Source 1 is +1.0 on the first tick, so source 2's frequency should
        // now be retuned to base (5.0) + depth(2.0)*1.0 = 7.0, but only takes
        // effect starting with the next call to tick().
        assert!((matrix.sources[1].lfo.frequency() - 7.0).abs() < 1e-3);
    }

    #[test]
    fn full_matrix_rejects_new_source() {
        let mut matrix: ModulationMatrix<1, 1> = ModulationMatrix::new(48000.0);
        assert!(matrix.add_lfo(1, LfoWaveform::Sine, 1.0, 0.0));
        assert!(!matrix.add_lfo(2, LfoWaveform::Sine, 1.0, 0.0));
    }
}
