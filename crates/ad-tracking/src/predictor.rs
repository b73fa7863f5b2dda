//! Latency-compensating stick-tip predictors
//!
//! Camera frames arrive tens of milliseconds late. Both predictors push the
//! measured tip ahead along its current motion so the zone under the stick
//! at impact time is the one that gets reported.

use ad_core::Point2;
use serde::{Deserialize, Serialize};

use crate::{TrackingError, TrackingResult};

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════

fn default_strength() -> f32 {
    5.0
}

fn default_alpha() -> f32 {
    0.6
}

fn default_beta() -> f32 {
    0.2
}

fn default_horizon() -> f32 {
    4.0
}

/// Which predictor each limb runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictorConfig {
    /// Horizontal warp proportional to wrist displacement since the last update
    Linear {
        #[serde(default = "default_strength")]
        strength: f32,
    },
    /// Constant-velocity alpha-beta filter, projected `horizon` updates ahead
    AlphaBeta {
        #[serde(default = "default_alpha")]
        alpha: f32,
        #[serde(default = "default_beta")]
        beta: f32,
        #[serde(default = "default_horizon")]
        horizon: f32,
    },
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig::AlphaBeta {
            alpha: default_alpha(),
            beta: default_beta(),
            horizon: default_horizon(),
        }
    }
}

impl PredictorConfig {
    pub fn linear() -> Self {
        PredictorConfig::Linear {
            strength: default_strength(),
        }
    }

    pub fn validate(&self) -> TrackingResult<()> {
        match *self {
            PredictorConfig::Linear { strength } => {
                if !strength.is_finite() {
                    return Err(TrackingError::InvalidConfig(format!(
                        "predictor.strength must be finite, got {}",
                        strength
                    )));
                }
            }
            PredictorConfig::AlphaBeta {
                alpha,
                beta,
                horizon,
            } => {
                if !(alpha > 0.0 && alpha <= 1.0) {
                    return Err(TrackingError::InvalidConfig(format!(
                        "predictor.alpha must be within (0, 1], got {}",
                        alpha
                    )));
                }
                if !(0.0..=1.0).contains(&beta) {
                    return Err(TrackingError::InvalidConfig(format!(
                        "predictor.beta must be within [0, 1], got {}",
                        beta
                    )));
                }
                if !(horizon >= 0.0 && horizon.is_finite()) {
                    return Err(TrackingError::InvalidConfig(format!(
                        "predictor.horizon must be a non-negative number of updates, got {}",
                        horizon
                    )));
                }
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ALPHA-BETA FILTER
// ═══════════════════════════════════════════════════════════════════════════

/// Filtered position and per-update velocity, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub position: Point2,
    pub velocity: Point2,
}

#[derive(Debug, Clone)]
pub struct AlphaBetaFilter {
    alpha: f32,
    beta: f32,
    horizon: f32,
    state: Option<FilterState>,
}

impl AlphaBetaFilter {
    pub fn new(alpha: f32, beta: f32, horizon: f32) -> Self {
        Self {
            alpha,
            beta,
            horizon,
            state: None,
        }
    }

    /// Feed one measurement, return the projected position.
    ///
    /// The first measurement initializes the state with zero velocity, so the
    /// first projection equals the measurement.
    pub fn update(&mut self, measured: Point2) -> Point2 {
        let next = match self.state {
            None => FilterState {
                position: measured,
                velocity: Point2::ZERO,
            },
            Some(FilterState { position, velocity }) => {
                let predicted = position + velocity;
                let residual = measured - predicted;
                FilterState {
                    position: predicted + residual * self.alpha,
                    velocity: velocity + residual * self.beta,
                }
            }
        };
        self.state = Some(next);
        next.position + next.velocity * self.horizon
    }

    pub fn state(&self) -> Option<FilterState> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LINEAR EXTRAPOLATOR
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct LinearExtrapolator {
    strength: f32,
    previous_wrist_x: Option<f32>,
}

impl LinearExtrapolator {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            previous_wrist_x: None,
        }
    }

    /// Shift `tip` horizontally by `(wrist_x - previous) * width * strength`.
    ///
    /// `wrist_x` is normalized. Without a previous sample there is no offset.
    pub fn update(&mut self, tip: Point2, wrist_x: f32, frame_width: f32) -> Point2 {
        let offset = self
            .previous_wrist_x
            .map(|previous| (wrist_x - previous) * frame_width * self.strength)
            .unwrap_or(0.0);
        self.previous_wrist_x = Some(wrist_x);
        Point2::new(tip.x + offset, tip.y)
    }

    pub fn reset(&mut self) {
        self.previous_wrist_x = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PREDICTOR
// ═══════════════════════════════════════════════════════════════════════════

/// Per-limb predictor state
#[derive(Debug, Clone)]
pub enum Predictor {
    Linear(LinearExtrapolator),
    AlphaBeta(AlphaBetaFilter),
}

impl Predictor {
    pub fn from_config(config: &PredictorConfig) -> Self {
        match *config {
            PredictorConfig::Linear { strength } => {
                Predictor::Linear(LinearExtrapolator::new(strength))
            }
            PredictorConfig::AlphaBeta {
                alpha,
                beta,
                horizon,
            } => Predictor::AlphaBeta(AlphaBetaFilter::new(alpha, beta, horizon)),
        }
    }

    /// Project a raw tip (pixels). `wrist_x` is the normalized wrist abscissa.
    pub fn predict(&mut self, raw_tip: Point2, wrist_x: f32, frame_width: f32) -> Point2 {
        match self {
            Predictor::Linear(linear) => linear.update(raw_tip, wrist_x, frame_width),
            Predictor::AlphaBeta(filter) => filter.update(raw_tip),
        }
    }

    /// Filter state, alpha-beta only
    pub fn estimate(&self) -> Option<FilterState> {
        match self {
            Predictor::Linear(_) => None,
            Predictor::AlphaBeta(filter) => filter.state(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Predictor::Linear(linear) => linear.reset(),
            Predictor::AlphaBeta(filter) => filter.reset(),
        }
    }
}
