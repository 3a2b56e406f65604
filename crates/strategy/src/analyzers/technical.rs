use ta::Next;
use ta::indicators::{MovingAverageConvergenceDivergence, RelativeStrengthIndex, SimpleMovingAverage};

use common::models::{Bar, Macd, Technicals};

pub const SMA_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

fn closes(bars: &[Bar]) -> impl Iterator<Item = f64> + '_ {
    bars.iter().map(|b| b.close)
}

/// Latest simple moving average of closes, `None` if there are fewer than `period` bars.
pub fn latest_sma(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let mut sma = SimpleMovingAverage::new(period).ok()?;
    closes(bars).map(|c| sma.next(c)).last()
}

/// Latest RSI of closes. Needs one bar more than `period` to have `period` changes.
pub fn latest_rsi(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() <= period {
        return None;
    }
    let mut rsi = RelativeStrengthIndex::new(period).ok()?;
    closes(bars).map(|c| rsi.next(c)).last()
}

pub fn latest_macd(bars: &[Bar], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if bars.len() < slow + signal {
        return None;
    }
    let mut macd = MovingAverageConvergenceDivergence::new(fast, slow, signal).ok()?;
    closes(bars)
        .map(|c| macd.next(c))
        .last()
        .map(|out| Macd {
            line: out.macd,
            signal: out.signal,
            histogram: out.histogram,
        })
}

/// SMA(50), RSI(14) and MACD(12, 26, 9) over the series.
pub fn compute_technicals(bars: &[Bar]) -> Technicals {
    Technicals {
        sma: latest_sma(bars, SMA_PERIOD),
        rsi: latest_rsi(bars, RSI_PERIOD),
        macd: latest_macd(bars, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000 + i as u64,
            })
            .collect()
    }

    #[test]
    fn test_sma_latest_value() {
        let bars = series(&[10.0, 12.0, 15.0, 14.0, 16.0, 18.0, 20.0]);
        let sma = latest_sma(&bars, 5).unwrap();
        assert!((sma - 16.6).abs() < 1e-9);
    }

    #[test]
    fn test_sma_needs_full_period() {
        assert_eq!(latest_sma(&series(&[10.0, 12.0, 15.0]), 5), None);
        assert_eq!(latest_sma(&[], 5), None);
    }

    #[test]
    fn test_rsi_bounds() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let rsi = latest_rsi(&series(&rising), 14).unwrap();
        assert!(rsi > 70.0 && rsi <= 100.0);
        assert_eq!(latest_rsi(&series(&rising[..14]), 14), None);
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let macd = latest_macd(&series(&rising), 12, 26, 9).unwrap();
        assert!(macd.line > 0.0);
        assert!((macd.histogram - (macd.line - macd.signal)).abs() < 1e-9);
        assert_eq!(latest_macd(&series(&rising[..30]), 12, 26, 9), None);
    }

    #[test]
    fn test_compute_technicals_short_series() {
        let flat = vec![50.0; 40];
        let technicals = compute_technicals(&series(&flat));
        assert_eq!(technicals.sma, None);
        assert!(technicals.rsi.is_some());
        assert!(technicals.macd.is_some());
    }
}
