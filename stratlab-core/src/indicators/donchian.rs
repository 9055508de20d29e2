//! Donchian Channel.
//!
//! Upper = rolling max(high), lower = rolling min(low), middle = their
//! mean, plus a normalized price position within the channel (0.5 when the
//! channel has zero width).

use super::{rolling_max, rolling_min, Indicator};
use crate::domain::Bar;

/// Which band of the channel this instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
    Middle,
    /// `(close - lower) / (upper - lower)`, 0.5 on zero width.
    PricePosition,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn new(period: usize, band: DonchianBand) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        let name = match band {
            DonchianBand::Upper => format!("donchian_upper_{period}"),
            DonchianBand::Lower => format!("donchian_lower_{period}"),
            DonchianBand::Middle => format!("donchian_middle_{period}"),
            DonchianBand::PricePosition => format!("donchian_pos_{period}"),
        };
        Self { period, band, name }
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let upper = rolling_max(&highs, self.period);
        let lower = rolling_min(&lows, self.period);

        match self.band {
            DonchianBand::Upper => upper,
            DonchianBand::Lower => lower,
            DonchianBand::Middle => upper
                .iter()
                .zip(&lower)
                .map(|(u, l)| (u + l) / 2.0)
                .collect(),
            DonchianBand::PricePosition => bars
                .iter()
                .zip(upper.iter().zip(&lower))
                .map(|(bar, (u, l))| {
                    if u.is_nan() || l.is_nan() {
                        f64::NAN
                    } else if u - l > 0.0 {
                        (bar.close - l) / (u - l)
                    } else {
                        0.5
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn donchian_bands_bracket_prices() {
        let closes = [100.0, 104.0, 98.0, 102.0, 101.0];
        let bars = make_bars(&closes);
        let upper = Donchian::new(3, DonchianBand::Upper).compute(&bars);
        let lower = Donchian::new(3, DonchianBand::Lower).compute(&bars);
        for i in 2..bars.len() {
            assert!(upper[i] >= bars[i].high);
            assert!(lower[i] <= bars[i].low);
        }
    }

    #[test]
    fn donchian_middle_is_band_mean() {
        let bars = make_bars(&[100.0, 104.0, 98.0, 102.0]);
        let upper = Donchian::new(3, DonchianBand::Upper).compute(&bars);
        let lower = Donchian::new(3, DonchianBand::Lower).compute(&bars);
        let middle = Donchian::new(3, DonchianBand::Middle).compute(&bars);
        assert_approx(middle[3], (upper[3] + lower[3]) / 2.0, 1e-12);
    }

    #[test]
    fn price_position_neutral_on_zero_width() {
        // Identical bars with high == low produce a zero-width channel.
        let mut bars = make_bars(&[100.0; 6]);
        for bar in &mut bars {
            bar.high = 100.0;
            bar.low = 100.0;
            bar.open = 100.0;
        }
        let pos = Donchian::new(3, DonchianBand::PricePosition).compute(&bars);
        assert_approx(pos[5], 0.5, 1e-12);
    }

    #[test]
    fn price_position_at_channel_top_is_one() {
        // Monotone rise: close sits just below the current high.
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + 2.0 * i as f64).collect();
        let bars = make_bars(&closes);
        let pos = Donchian::new(5, DonchianBand::PricePosition).compute(&bars);
        assert!(pos[9] > 0.8);
    }
}
