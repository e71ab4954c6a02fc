/*!
Hit-detection defaults and tolerances.

These constants centralize the parameters shared by both detection strategies.
`HitDetectionSettings::default()` is built from them, so tuning here changes the
behavior of every detector that does not override its settings from data.

Notes
- Distances are in world units (centimeters for the shipped data), time in seconds.
- Speeds are world units per second.
*/

/// Capsule radius given to every socket group until an attack overrides it.
pub const DEFAULT_TRACE_RADIUS: f32 = 10.0;

/// Minimum time between two accepted hits on the same target in multi-hit mode (seconds).
/// Also the cooldown of the CCD hit-record list.
pub const DEFAULT_HIT_COOLDOWN: f32 = 0.1;

/// Delta-times below this are treated as zero when estimating swing speed.
pub const MIN_DELTA_TIME: f32 = 1.0e-4;

/// Default CCD capsule radius.
pub const DEFAULT_CCD_RADIUS: f32 = 10.0;

/// Default CCD capsule half-height, used when the first socket group cannot be fitted.
pub const DEFAULT_CCD_HALF_HEIGHT: f32 = 50.0;

/// Number of interpolated ghost capsules drawn between two CCD poses.
pub const CCD_DEBUG_GHOSTS: usize = 5;

/// Lifetime of debug shapes (seconds).
pub const DEFAULT_DEBUG_DURATION: f32 = 4.0;

/// Default light/heavy hit-reaction poise thresholds.
pub const LIGHT_REACTION_POISE: f32 = 20.0;
pub const HEAVY_REACTION_POISE: f32 = 50.0;

/// Per-motion CCD capsule scaling, applied only when enabled in settings.
pub const SLASH_HALF_HEIGHT_SCALE: f32 = 1.2;
pub const PIERCE_RADIUS_SCALE: f32 = 0.6;
pub const PIERCE_HALF_HEIGHT_SCALE: f32 = 0.8;
pub const STRIKE_RADIUS_SCALE: f32 = 1.5;

/// Default adaptive sweep table as `(cadence_seconds, interpolation_steps, speed_threshold)`,
/// ordered by ascending threshold.
pub const DEFAULT_ADAPTIVE_TABLE: [(f32, u32, f32); 8] = [
    (0.05, 1, 0.0),
    (0.04, 2, 500.0),
    (0.033, 2, 1500.0),
    (0.025, 3, 2500.0),
    (0.020, 3, 3000.0),
    (0.016, 3, 5000.0),
    (0.016, 4, 6000.0),
    (0.016, 5, 10000.0),
];
