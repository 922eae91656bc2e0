//! Synthetic training data with agronomically plausible yield responses.
//!
//! Each crop has a sampling profile (where its fields typically sit) and a
//! set of optima the yield formula measures against. Yield is the crop's base
//! yield scaled by one multiplicative effect per factor, with nutrients
//! following Liebig's law of the minimum, plus Gaussian noise.

use cropcast_core::{CropType, FeatureVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma, Normal};

use crate::error::{ModelError, ModelResult};
use crate::sample::TrainingSample;

pub const DEFAULT_SEED: u64 = 42;

/// Where a crop's generated fields are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropProfile {
    pub ph: (f64, f64),
    pub organic_matter: (f64, f64),
    pub nitrogen: (f64, f64),
    pub phosphorus: (f64, f64),
    pub potassium: (f64, f64),
    pub temperature: (f64, f64),
    pub rainfall: (f64, f64),
    pub humidity: (f64, f64),
    /// Yield under ideal conditions, t/ha.
    pub base_yield: f64,
    pub yield_variance: f64,
}

/// Conditions at which each yield effect peaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldOptima {
    pub ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
}

pub fn profile(crop: CropType) -> CropProfile {
    match crop {
        CropType::Wheat => CropProfile {
            ph: (5.8, 7.2),
            organic_matter: (1.5, 6.0),
            nitrogen: (15.0, 60.0),
            phosphorus: (10.0, 45.0),
            potassium: (80.0, 250.0),
            temperature: (12.0, 28.0),
            rainfall: (400.0, 1200.0),
            humidity: (45.0, 75.0),
            base_yield: 4.5,
            yield_variance: 2.0,
        },
        CropType::Corn => CropProfile {
            ph: (5.5, 7.0),
            organic_matter: (2.0, 6.5),
            nitrogen: (25.0, 80.0),
            phosphorus: (15.0, 50.0),
            potassium: (100.0, 300.0),
            temperature: (18.0, 32.0),
            rainfall: (600.0, 1500.0),
            humidity: (55.0, 85.0),
            base_yield: 7.5,
            yield_variance: 3.0,
        },
        CropType::Rice => CropProfile {
            ph: (5.0, 6.8),
            organic_matter: (2.5, 7.0),
            nitrogen: (20.0, 50.0),
            phosphorus: (8.0, 35.0),
            potassium: (90.0, 220.0),
            temperature: (22.0, 38.0),
            rainfall: (800.0, 2500.0),
            humidity: (65.0, 95.0),
            base_yield: 5.8,
            yield_variance: 2.5,
        },
        CropType::Soybean => CropProfile {
            ph: (5.8, 7.2),
            organic_matter: (2.0, 5.5),
            nitrogen: (10.0, 35.0),
            phosphorus: (12.0, 40.0),
            potassium: (90.0, 280.0),
            temperature: (16.0, 30.0),
            rainfall: (500.0, 1300.0),
            humidity: (50.0, 80.0),
            base_yield: 3.2,
            yield_variance: 1.5,
        },
    }
}

pub fn optima(crop: CropType) -> YieldOptima {
    let (ph, (nitrogen, phosphorus, potassium), temperature, rainfall, humidity) = match crop {
        CropType::Wheat => (6.5, (35.0, 25.0, 150.0), 20.0, 600.0, 60.0),
        CropType::Corn => (6.2, (50.0, 30.0, 180.0), 25.0, 900.0, 70.0),
        CropType::Rice => (5.8, (30.0, 20.0, 130.0), 30.0, 1500.0, 80.0),
        CropType::Soybean => (6.8, (20.0, 25.0, 160.0), 23.0, 750.0, 65.0),
    };
    YieldOptima {
        ph,
        nitrogen,
        phosphorus,
        potassium,
        temperature,
        rainfall,
        humidity,
    }
}

/// Noise-free yield (t/ha) for `crop` under conditions `v`.
pub fn expected_yield(crop: CropType, v: &FeatureVector) -> f64 {
    let opt = optima(crop);
    let base = profile(crop).base_yield;

    let ph = (1.0 - (v.ph - opt.ph).abs() * 0.15).max(0.3);
    let om = (0.8 + v.organic_matter / 10.0).min(1.3);

    let n = (v.nitrogen / opt.nitrogen).min(1.0);
    let p = (v.phosphorus / opt.phosphorus).min(1.0);
    let k = (v.potassium / opt.potassium).min(1.0);
    let nutrient = n.min(p).min(k).max(0.2);

    let temp = (1.0 - (v.temperature - opt.temperature).abs() * 0.03).max(0.4);

    let rain = if v.rainfall < opt.rainfall {
        v.rainfall / opt.rainfall
    } else {
        1.0 - (v.rainfall - opt.rainfall) / opt.rainfall * 0.3
    }
    .clamp(0.3, 1.2);

    let humidity = (1.0 - (v.humidity - opt.humidity).abs() * 0.01).max(0.7);

    let mut y = base * ph * om * nutrient * temp * rain * humidity;

    // heat stress when hot and dry
    if v.temperature > opt.temperature + 5.0 && v.humidity < opt.humidity - 10.0 {
        y *= 0.85;
    }
    if ph > 0.9 && nutrient > 0.8 && temp > 0.9 && rain > 0.9 {
        y *= 1.1;
    }
    y
}

/// Seeded generator of labeled samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticDataGenerator {
    seed: u64,
}

impl Default for SyntheticDataGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl SyntheticDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `n` samples for `crop`. The same seed always yields the same samples.
    pub fn generate(&self, n: usize, crop: CropType) -> ModelResult<Vec<TrainingSample>> {
        let mut rng = StdRng::seed_from_u64(self.seed ^ ((crop as u64 + 1) << 32));
        let prof = profile(crop);

        let mut rows = Vec::with_capacity(n);
        for _ in 0..n {
            rows.push(draw(&mut rng, &prof)?);
        }
        correlate(&mut rng, &mut rows);

        let noise = Normal::new(0.0, prof.yield_variance * 0.2).map_err(|e| ModelError::training(e.to_string()))?;
        rows.into_iter()
            .map(|raw| -> ModelResult<TrainingSample> {
                let v = round_features(clip_global(raw));
                let y = (expected_yield(crop, &v) + noise.sample(&mut rng)).clamp(0.5, 15.0);
                Ok(TrainingSample::new(v, crop, round_to(y, 2))?)
            })
            .collect()
    }

    /// `n_per_crop` samples for every crop, concatenated in [`CropType::ALL`] order.
    pub fn generate_all(&self, n_per_crop: usize) -> ModelResult<Vec<TrainingSample>> {
        let mut out = Vec::with_capacity(n_per_crop * CropType::ALL.len());
        for crop in CropType::ALL {
            out.extend(self.generate(n_per_crop, crop)?);
        }
        Ok(out)
    }
}

fn gamma(shape: f64, scale: f64) -> ModelResult<Gamma<f64>> {
    Gamma::new(shape, scale).map_err(|e| ModelError::training(e.to_string()))
}

fn centered_normal((lo, hi): (f64, f64)) -> ModelResult<Normal<f64>> {
    Normal::new((lo + hi) / 2.0, (hi - lo) / 6.0).map_err(|e| ModelError::training(e.to_string()))
}

fn clip(x: f64, (lo, hi): (f64, f64)) -> f64 {
    x.clamp(lo, hi)
}

fn draw(rng: &mut StdRng, p: &CropProfile) -> ModelResult<FeatureVector> {
    Ok(FeatureVector {
        ph: rng.gen_range(p.ph.0..=p.ph.1),
        organic_matter: (gamma(2.0, 1.5)?.sample(rng) + p.organic_matter.0).min(p.organic_matter.1),
        nitrogen: clip(gamma(3.0, p.nitrogen.1 / 6.0)?.sample(rng), p.nitrogen),
        phosphorus: clip(gamma(2.5, p.phosphorus.1 / 5.0)?.sample(rng), p.phosphorus),
        potassium: clip(gamma(4.0, p.potassium.1 / 8.0)?.sample(rng), p.potassium),
        temperature: clip(centered_normal(p.temperature)?.sample(rng), p.temperature),
        rainfall: clip(gamma(2.0, p.rainfall.1 / 4.0)?.sample(rng), p.rainfall),
        humidity: clip(centered_normal(p.humidity)?.sample(rng), p.humidity),
    })
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Couple features the way real fields do, relative to the batch medians.
fn correlate(rng: &mut StdRng, rows: &mut [FeatureVector]) {
    let om_median = median(rows.iter().map(|r| r.organic_matter).collect());
    let temp_median = median(rows.iter().map(|r| r.temperature).collect());
    let rain_median = median(rows.iter().map(|r| r.rainfall).collect());

    for r in rows.iter_mut() {
        if r.organic_matter > om_median {
            r.nitrogen *= rng.gen_range(1.05..1.2);
        }
        if r.temperature > temp_median {
            r.humidity *= rng.gen_range(0.85..0.95);
        }
        if r.rainfall > rain_median {
            r.potassium *= rng.gen_range(0.9..1.1);
        }
    }
}

fn clip_global(v: FeatureVector) -> FeatureVector {
    FeatureVector {
        ph: v.ph.clamp(4.0, 9.0),
        organic_matter: v.organic_matter.clamp(0.5, 10.0),
        nitrogen: v.nitrogen.clamp(5.0, 100.0),
        phosphorus: v.phosphorus.clamp(5.0, 100.0),
        potassium: v.potassium.clamp(50.0, 500.0),
        temperature: v.temperature.clamp(5.0, 45.0),
        rainfall: v.rainfall.clamp(200.0, 3000.0),
        humidity: v.humidity.clamp(20.0, 100.0),
    }
}

fn round_features(v: FeatureVector) -> FeatureVector {
    FeatureVector {
        ph: round_to(v.ph, 2),
        organic_matter: round_to(v.organic_matter, 2),
        nitrogen: round_to(v.nitrogen, 1),
        phosphorus: round_to(v.phosphorus, 1),
        potassium: round_to(v.potassium, 1),
        temperature: round_to(v.temperature, 1),
        rainfall: v.rainfall.round(),
        humidity: round_to(v.humidity, 1),
    }
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_samples() {
        let a = SyntheticDataGenerator::new(7).generate(50, CropType::Wheat).unwrap();
        let b = SyntheticDataGenerator::new(7).generate(50, CropType::Wheat).unwrap();
        assert_eq!(a, b);

        let c = SyntheticDataGenerator::new(8).generate(50, CropType::Wheat).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn samples_respect_global_clip_bounds() {
        let samples = SyntheticDataGenerator::default().generate_all(200).unwrap();
        assert_eq!(samples.len(), 800);
        for s in &samples {
            let v = s.features();
            assert!((4.0..=9.0).contains(&v.ph));
            assert!((0.5..=10.0).contains(&v.organic_matter));
            assert!((5.0..=100.0).contains(&v.nitrogen));
            assert!((5.0..=100.0).contains(&v.phosphorus));
            assert!((50.0..=500.0).contains(&v.potassium));
            assert!((5.0..=45.0).contains(&v.temperature));
            assert!((200.0..=3000.0).contains(&v.rainfall));
            assert!((20.0..=100.0).contains(&v.humidity));
            assert!((0.5..=15.0).contains(&s.yield_t_ha()));
        }
    }

    #[test]
    fn zero_samples_is_empty_not_an_error() {
        assert!(SyntheticDataGenerator::default().generate(0, CropType::Rice).unwrap().is_empty());
    }

    #[test]
    fn crops_are_labeled_and_base_yields_show_through() {
        let generator = SyntheticDataGenerator::default();
        let mean = |crop| {
            let s = generator.generate(300, crop).unwrap();
            assert!(s.iter().all(|x| x.crop() == crop));
            s.iter().map(|x| x.yield_t_ha()).sum::<f64>() / s.len() as f64
        };
        assert!(mean(CropType::Corn) > mean(CropType::Soybean));
    }

    #[test]
    fn ideal_conditions_beat_poor_ones() {
        let opt = optima(CropType::Wheat);
        let ideal = FeatureVector {
            ph: opt.ph,
            organic_matter: 5.0,
            nitrogen: opt.nitrogen,
            phosphorus: opt.phosphorus,
            potassium: opt.potassium,
            temperature: opt.temperature,
            rainfall: opt.rainfall,
            humidity: opt.humidity,
        };
        let poor = FeatureVector {
            ph: 4.5,
            nitrogen: 5.0,
            temperature: 40.0,
            humidity: 30.0,
            ..ideal
        };
        let best = expected_yield(CropType::Wheat, &ideal);
        // base 4.5 × OM 1.3 × synergy 1.1
        assert!((best - 4.5 * 1.3 * 1.1).abs() < 1e-9);
        assert!(expected_yield(CropType::Wheat, &poor) < best * 0.3);
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), 2.5);
    }
}
