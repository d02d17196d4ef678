//! Editable fit model and its results.
//!
//! [`FittingSession`] owns an ordered list of Gaussian components, the
//! continuum settings and the last fit result. It is a plain single-owner
//! store: setters mutate, derived values are recomputed on each call.
//!
//! Every change to the model invalidates the current result and advances a
//! generation counter. Fits are prepared as [`FitJob`] snapshots stamped with
//! that generation, so a job that finishes after the model moved on is
//! discarded instead of being written back onto the wrong components.

mod component;
mod job;

pub use component::ProfileComponent;
pub use job::{FitHandle, FitJob, FitOutcome};

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SpecFitError};
use crate::fitting::{ContinuumLocks, FitRequest, FittedValue, LockMask, PeakLocks};
use crate::lm::{CancelToken, LmConfig};
use crate::models::{Continuum, ContinuumOrder, GaussianPeak, ProfileModel};

/// Overlay rectangle marking an unfitted component guess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Whether this is the selected component.
    pub selected: bool,
}

/// What a cursor pick on the plot feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorTarget {
    /// A dragged box seeds the selected component.
    Component,
    /// A picked point sets the continuum intercept.
    Intercept,
    /// Two picked points set the continuum slope.
    Slope,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ContinuumResult {
    intercept: FittedValue,
    slope: FittedValue,
}

#[derive(Debug, Clone)]
pub struct FittingSession {
    components: Vec<ProfileComponent>,
    selected: usize,
    continuum: Continuum,
    continuum_locks: ContinuumLocks,
    continuum_result: Option<ContinuumResult>,
    has_result: bool,
    log: String,
    cursor: Option<CursorTarget>,
    generation: u64,
    config: LmConfig,
}

impl Default for FittingSession {
    fn default() -> Self {
        Self::with_config(LmConfig::default())
    }
}

impl FittingSession {
    /// A session with one fresh component and no continuum.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self {
            components: vec![ProfileComponent::new()],
            selected: 0,
            continuum: Continuum::none(),
            continuum_locks: ContinuumLocks::default(),
            continuum_result: None,
            has_result: false,
            log: String::new(),
            cursor: None,
            generation: 0,
            config,
        }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Replace the optimizer settings. An invalid config is rejected and the
    /// current one kept.
    pub fn set_config(&mut self, config: LmConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn components(&self) -> &[ProfileComponent] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&ProfileComponent> {
        self.components.get(index)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_component(&self) -> Option<&ProfileComponent> {
        self.components.get(self.selected)
    }

    pub fn continuum(&self) -> Continuum {
        self.continuum
    }

    pub fn continuum_locks(&self) -> ContinuumLocks {
        self.continuum_locks
    }

    pub fn has_result(&self) -> bool {
        self.has_result
    }

    pub fn result_log(&self) -> &str {
        &self.log
    }

    /// Counter advanced by every model change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether any cursor mode is active.
    pub fn is_cursor_selecting(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn cursor_target(&self) -> Option<CursorTarget> {
        self.cursor
    }

    /// Drop results and advance the generation.
    fn invalidate(&mut self) {
        self.generation += 1;
        for component in &mut self.components {
            component.set_result(None);
        }
        self.continuum_result = None;
        self.has_result = false;
        self.log.clear();
    }

    fn edit(&mut self, index: usize, f: impl FnOnce(&mut ProfileComponent)) -> Result<()> {
        let len = self.components.len();
        let component = self.components.get_mut(index).ok_or_else(|| {
            SpecFitError::InvalidInput(format!("component {index} out of range ({len} components)"))
        })?;
        f(component);
        self.invalidate();
        Ok(())
    }

    // Component list

    /// Resize the component list and select its last entry.
    ///
    /// With `reset`, every component is rebuilt fresh. Otherwise existing
    /// components keep their positions; growing appends fresh components and
    /// shrinking truncates from the end.
    pub fn set_component_count(&mut self, n: usize, reset: bool) {
        if reset {
            self.components = vec![ProfileComponent::new(); n];
        } else {
            self.components.resize_with(n, ProfileComponent::new);
        }
        self.selected = n.saturating_sub(1);
        self.invalidate();
    }

    pub fn set_selected_index(&mut self, index: usize) -> Result<()> {
        if index >= self.components.len() {
            return Err(SpecFitError::InvalidInput(format!(
                "component {index} out of range ({} components)",
                self.components.len()
            )));
        }
        self.selected = index;
        // Selection leaves results alone but outdates any job in flight.
        self.generation += 1;
        Ok(())
    }

    /// Remove the selected component. The last remaining component is
    /// replaced with a fresh one instead.
    pub fn delete_selected_component(&mut self) {
        if self.selected < self.components.len() {
            self.components.remove(self.selected);
        }
        if self.components.is_empty() {
            self.components.push(ProfileComponent::new());
        }
        self.selected = self.selected.min(self.components.len() - 1);
        self.invalidate();
    }

    pub fn set_component(&mut self, index: usize, guess: GaussianPeak) -> Result<()> {
        self.edit(index, |c| *c.guess_mut() = guess)
    }

    pub fn set_center(&mut self, index: usize, center: f64) -> Result<()> {
        self.edit(index, |c| c.guess_mut().center = center)
    }

    pub fn set_amplitude(&mut self, index: usize, amplitude: f64) -> Result<()> {
        self.edit(index, |c| c.guess_mut().amplitude = amplitude)
    }

    pub fn set_fwhm(&mut self, index: usize, fwhm: f64) -> Result<()> {
        self.edit(index, |c| c.guess_mut().fwhm = fwhm)
    }

    pub fn set_locks(&mut self, index: usize, locks: PeakLocks) -> Result<()> {
        self.edit(index, |c| *c.locks_mut() = locks)
    }

    pub fn set_locked_center(&mut self, index: usize, locked: bool) -> Result<()> {
        self.edit(index, |c| c.locks_mut().center = locked)
    }

    pub fn set_locked_amplitude(&mut self, index: usize, locked: bool) -> Result<()> {
        self.edit(index, |c| c.locks_mut().amplitude = locked)
    }

    pub fn set_locked_fwhm(&mut self, index: usize, locked: bool) -> Result<()> {
        self.edit(index, |c| c.locks_mut().fwhm = locked)
    }

    // Cursor selection

    /// Enter cursor mode for `target`, replacing any mode already active.
    pub fn start_cursor_selection(&mut self, target: CursorTarget) {
        self.cursor = Some(target);
    }

    pub fn cancel_cursor_selection(&mut self) {
        self.cursor = None;
    }

    /// Seed the selected component from a dragged rectangle and leave
    /// cursor mode.
    ///
    /// The width is taken unsigned so the drag direction does not matter.
    /// The amplitude keeps the sign of `y_max - y_min`.
    pub fn set_component_from_box(
        &mut self,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Result<()> {
        self.cursor = None;
        let guess = GaussianPeak::new(y_max - y_min, (x_min + x_max) / 2.0, (x_max - x_min).abs());
        self.set_component(self.selected, guess)
    }

    /// Take the intercept guess from a picked point and leave cursor mode.
    pub fn set_intercept_from_cursor(&mut self, y: f64) {
        self.cursor = None;
        self.set_intercept(y);
    }

    /// Take the slope guess from two picked points and leave cursor mode.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the points share an abscissa or the slope is not finite.
    /// Cursor mode stays on in that case.
    pub fn set_slope_from_cursor(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        let slope = (y1 - y0) / (x1 - x0);
        if !slope.is_finite() {
            return Err(SpecFitError::InvalidInput(format!(
                "cannot take a slope through ({x0}, {y0}) and ({x1}, {y1})"
            )));
        }
        self.cursor = None;
        self.set_slope(slope);
        Ok(())
    }

    // Continuum

    /// Change the continuum order. A different order zeroes both coefficient guesses.
    pub fn set_continuum(&mut self, order: ContinuumOrder) {
        if order != self.continuum.order {
            self.continuum = Continuum {
                order,
                intercept: 0.0,
                slope: 0.0,
            };
        }
        self.invalidate();
    }

    pub fn set_intercept(&mut self, intercept: f64) {
        self.continuum.intercept = intercept;
        self.invalidate();
    }

    pub fn set_slope(&mut self, slope: f64) {
        self.continuum.slope = slope;
        self.invalidate();
    }

    pub fn set_locked_intercept(&mut self, locked: bool) {
        self.continuum_locks.intercept = locked;
        self.invalidate();
    }

    pub fn set_locked_slope(&mut self, locked: bool) {
        self.continuum_locks.slope = locked;
        self.invalidate();
    }

    pub fn result_intercept(&self) -> Option<f64> {
        self.continuum_result.map(|r| r.intercept.value)
    }

    pub fn result_slope(&self) -> Option<f64> {
        self.continuum_result.map(|r| r.slope.value)
    }

    /// Fresh single-component model with no continuum and no result.
    pub fn reset(&mut self) {
        self.components = vec![ProfileComponent::new()];
        self.selected = 0;
        self.continuum = Continuum::none();
        self.continuum_locks = ContinuumLocks::default();
        self.cursor = None;
        self.invalidate();
    }

    // Fitting

    /// Every component is fit-ready and at least one component parameter is free.
    pub fn ready_to_fit(&self) -> bool {
        if self.components.is_empty()
            || !self.components.iter().all(ProfileComponent::is_fit_ready)
        {
            return false;
        }
        let locked: usize = self.components.iter().map(|c| c.locks().count()).sum();
        locked != self.components.len() * 3
    }

    fn request(&self) -> FitRequest {
        FitRequest::new(
            self.components.iter().map(ProfileComponent::guess).collect(),
            self.continuum,
        )
        .with_locks(LockMask {
            peaks: self.components.iter().map(ProfileComponent::locks).collect(),
            continuum: self.continuum_locks,
        })
    }

    /// Snapshot the model and samples into a job. Nothing in the session changes.
    ///
    /// # Errors
    ///
    /// `NotReady` or `ZeroDegreesOfFreedom` when [`ready_to_fit`](Self::ready_to_fit)
    /// is false, `DimensionMismatch` for unequal sample arrays.
    pub fn prepare_fit<X, Y>(&self, x: &[X], y: &[Y]) -> Result<FitJob>
    where
        X: Copy + Into<f64>,
        Y: Copy + Into<f64>,
    {
        if let Some(index) = self.components.iter().position(|c| !c.is_fit_ready()) {
            return Err(SpecFitError::NotReady { index });
        }
        if !self.ready_to_fit() {
            return Err(SpecFitError::ZeroDegreesOfFreedom);
        }
        if x.len() != y.len() {
            return Err(SpecFitError::DimensionMismatch(format!(
                "x has {} samples, y has {}",
                x.len(),
                y.len()
            )));
        }

        Ok(FitJob {
            generation: self.generation,
            x: x.iter().map(|&v| v.into()).collect(),
            y: y.iter().map(|&v| v.into()).collect(),
            request: self.request(),
            config: self.config.clone(),
            cancel: CancelToken::new(),
        })
    }

    /// Write a job outcome back.
    ///
    /// Outcomes from an older generation are discarded with `StaleResult`.
    /// A failed fit lowers `has_result` and keeps the error text as the log,
    /// leaving component values untouched. A cancelled one changes nothing.
    pub fn apply_outcome(&mut self, outcome: FitOutcome) -> Result<()> {
        if outcome.generation != self.generation {
            warn!(
                job = outcome.generation,
                current = self.generation,
                "discarding stale fit result"
            );
            return Err(SpecFitError::StaleResult {
                generation: outcome.generation,
            });
        }

        let fit = match outcome.result {
            Ok(fit) => fit,
            Err(e @ SpecFitError::Cancelled { .. }) => return Err(e),
            Err(e) => {
                // Earlier results stay in place; only the flag and log change.
                self.has_result = false;
                self.log = e.to_string();
                return Err(e);
            }
        };

        if fit.components.len() != self.components.len() {
            return Err(SpecFitError::DimensionMismatch(format!(
                "fit has {} components, model has {}",
                fit.components.len(),
                self.components.len()
            )));
        }
        for (component, fitted) in self.components.iter_mut().zip(&fit.components) {
            component.set_result(Some(*fitted));
        }
        self.continuum_result = Some(ContinuumResult {
            intercept: fit.intercept,
            slope: fit.slope,
        });
        self.has_result = true;
        self.log = fit.log;
        debug!(generation = self.generation, "fit result applied");
        Ok(())
    }

    /// Fit on the calling thread and write the result back.
    pub fn fit<X, Y>(&mut self, x: &[X], y: &[Y]) -> Result<()>
    where
        X: Copy + Into<f64>,
        Y: Copy + Into<f64>,
    {
        let job = self.prepare_fit(x, y)?;
        self.apply_outcome(job.run())
    }

    // Derived values

    /// Boxes for fit-ready components that have no finite result yet,
    /// centred on the guess and spanning one FWHM from zero to the amplitude.
    pub fn component_plotting_boxes(&self) -> Vec<PlotBox> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_fit_ready() && !c.has_finite_result())
            .map(|(i, c)| PlotBox {
                x_min: c.center() - 0.5 * c.fwhm(),
                x_max: c.center() + 0.5 * c.fwhm(),
                y_min: 0.0,
                y_max: c.amplitude(),
                selected: i == self.selected,
            })
            .collect()
    }

    /// Fitted values as text, empty without a result.
    pub fn result_summary(&self) -> String {
        let mut summary = String::new();
        if !self.has_result {
            return summary;
        }
        for (i, component) in self.components.iter().enumerate() {
            if let Some(r) = component.result() {
                let _ = write!(
                    summary,
                    "Component #{}\nCenter = {}\nAmplitude = {}\nFWHM = {}\n",
                    i + 1,
                    r.center.value,
                    r.amplitude.value,
                    r.fwhm.value
                );
            }
        }
        if let Some(r) = self.continuum_result {
            if self.continuum.order.uses_intercept() {
                let _ = writeln!(summary, "Y Intercept = {}", r.intercept.value);
            }
            if self.continuum.order.uses_slope() {
                let _ = writeln!(summary, "Slope = {}", r.slope.value);
            }
        }
        summary
    }

    /// The continuum guess at each `xs`, empty when the continuum is off.
    pub fn initial_continuum_samples(&self, xs: &[f64]) -> Vec<(f64, f64)> {
        if self.continuum.order == ContinuumOrder::None {
            return Vec::new();
        }
        xs.iter().map(|&x| (x, self.continuum.value_at(x))).collect()
    }

    /// The fitted model at each `xs`, empty without a result.
    pub fn fitted_curve_samples(&self, xs: &[f64]) -> Vec<(f64, f64)> {
        match self.fitted_model() {
            Some(model) => xs.iter().map(|&x| (x, model.value_at(x))).collect(),
            None => Vec::new(),
        }
    }

    /// Continuum plus every fitted peak, when a result is present.
    pub fn fitted_model(&self) -> Option<ProfileModel> {
        if !self.has_result {
            return None;
        }
        let continuum = self.continuum_result.map(|r| Continuum {
            order: self.continuum.order,
            intercept: r.intercept.value,
            slope: r.slope.value,
        })?;
        let peaks = self
            .components
            .iter()
            .map(|c| c.result().map(|r| r.peak()))
            .collect::<Option<Vec<_>>>()?;
        Some(ProfileModel::new(continuum, peaks))
    }
}
