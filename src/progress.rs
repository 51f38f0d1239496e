//! Progress reporting for [`build_into`](crate::builder::TngDatasetBuilder::build_into).
//!
//! Enabled with the `progress` feature. One bar is shown per split, sized to the split
//! quota, with the time spent per example smoothed by an exponential moving average
//! (`ema ← α·dt + (1–α)·ema`, first sample taken as is).
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::split::Split;

pub struct IterTimer {
    last: Instant,
    ema_ns: f64,
    alpha: f64,
    count: u64,
}

impl IterTimer {
    /// `alpha` in `(0, 1]`; `1.0` disables smoothing.
    pub fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            ema_ns: 0.0,
            alpha,
            count: 0,
        }
    }

    /// Close the current iteration and return its duration.
    #[inline]
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.count += 1;

        let dt_ns = dt.as_nanos() as f64;
        self.ema_ns = if self.count == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };

        dt
    }

    #[inline]
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.ema_ns as u64)
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// `"253µs"`, `"42ms"` or `"3.14s"` depending on the scale.
#[inline]
pub fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else {
        let ms = d.as_millis();
        if ms < 1_000 {
            format!("{ms}ms")
        } else {
            format!("{:.2}s", d.as_secs_f32())
        }
    }
}

/// Bar for one split, its length being the quota target rounded up.
pub fn split_progress_bar(split: Split, target: f64) -> ProgressBar {
    let pb = ProgressBar::new((target.ceil() as u64).max(1));
    if let Ok(style) = ProgressStyle::with_template(
        "{prefix:>10} {bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}",
    ) {
        pb.set_style(style);
    }
    pb.set_prefix(split.to_string());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}
