use crate::track::LatLon;

/// Tick length the easing fraction is expressed against.
const REFERENCE_TICK_S: f64 = 1. / 60.;

/// Below this many degrees the marker is considered arrived.
const SETTLE_DEG: f64 = 1e-9;

/// Moves `current` toward `target` by `easing` of the remaining distance per
/// 60 Hz tick, scaled to `dt_s` so slower or faster repaints converge alike.
pub fn ease_toward(current: LatLon, target: LatLon, easing: f64, dt_s: f64) -> LatLon {
    if !dt_s.is_finite() || dt_s <= 0. {
        return current;
    }
    let easing = easing.clamp(0., 1.);
    let alpha = 1. - (1. - easing).powf(dt_s / REFERENCE_TICK_S);
    LatLon::new(
        current.lat + (target.lat - current.lat) * alpha,
        current.lon + (target.lon - current.lon) * alpha,
    )
}

/// Display-only marker position. Reads playback targets, never feeds back
/// into playback state.
#[derive(Clone, Debug)]
pub struct MarkerAnimator {
    easing: f64,
    displayed: Option<LatLon>,
    target: Option<LatLon>,
}

impl MarkerAnimator {
    pub fn new(easing: f64) -> Self {
        Self {
            easing,
            displayed: None,
            target: None,
        }
    }

    pub fn set_easing(&mut self, easing: f64) {
        self.easing = easing;
    }

    pub fn set_target(&mut self, target: LatLon, snap: bool) {
        self.target = Some(target);
        if snap || self.displayed.is_none() {
            self.displayed = Some(target);
        }
    }

    pub fn snap(&mut self) {
        self.displayed = self.target;
    }

    pub fn clear(&mut self) {
        self.displayed = None;
        self.target = None;
    }

    pub fn displayed(&self) -> Option<LatLon> {
        self.displayed
    }

    pub fn target(&self) -> Option<LatLon> {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.displayed == self.target
    }

    /// Advances the displayed position by one repaint of `dt_s` seconds.
    pub fn tick(&mut self, dt_s: f64) -> Option<LatLon> {
        let (Some(current), Some(target)) = (self.displayed, self.target) else {
            return self.displayed;
        };
        let next = ease_toward(current, target, self.easing, dt_s);
        let settled = (next.lat - target.lat).abs() < SETTLE_DEG
            && (next.lon - target.lon).abs() < SETTLE_DEG;
        self.displayed = Some(if settled { target } else { next });
        self.displayed
    }
}
