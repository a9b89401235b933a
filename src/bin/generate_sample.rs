//! Writes a synthetic processed dataset to `data/processed/dataset_limpio.csv`
//! so the dashboard can be tried without the real datos.gob.ar export.
//! Deterministic: the same seed always produces the same file.

use std::fs;
use std::path::Path;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Pick an index with probability proportional to its weight.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut roll = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                return i;
            }
            roll -= w;
        }
        weights.len() - 1
    }
}

/// (name, relative victim weight, capital latitude, capital longitude)
const PROVINCES: &[(&str, f64, f64, f64)] = &[
    ("Buenos Aires", 35.0, -34.92, -57.95),
    ("Córdoba", 10.0, -31.42, -64.18),
    ("Santa Fe", 9.0, -31.63, -60.70),
    ("Mendoza", 5.0, -32.89, -68.84),
    ("Tucumán", 4.0, -26.82, -65.22),
    ("Entre Ríos", 3.5, -31.73, -60.53),
    ("Salta", 3.5, -24.78, -65.41),
    ("Chaco", 3.0, -27.45, -58.99),
    ("Misiones", 3.0, -27.37, -55.90),
    ("Corrientes", 2.5, -27.47, -58.83),
    ("Santiago del Estero", 2.5, -27.78, -64.26),
    ("San Juan", 2.0, -31.54, -68.54),
    ("Jujuy", 2.0, -24.19, -65.30),
    ("Río Negro", 2.0, -41.13, -71.30),
    ("Neuquén", 1.8, -38.95, -68.06),
    ("Formosa", 1.5, -26.18, -58.18),
    ("Chubut", 1.3, -43.30, -65.10),
    ("San Luis", 1.2, -33.30, -66.34),
    ("Catamarca", 1.0, -28.47, -65.78),
    ("La Rioja", 1.0, -29.41, -66.85),
    ("La Pampa", 1.0, -36.62, -64.29),
    ("Santa Cruz", 0.8, -51.62, -69.22),
    ("Tierra del Fuego", 0.4, -54.80, -68.30),
];

const VEHICLES: &[(&str, f64)] = &[
    ("moto", 32.0),
    ("auto", 28.0),
    ("peatón", 14.0),
    ("bicicleta", 7.0),
    ("camioneta", 7.0),
    ("camión", 5.0),
    ("transporte público", 3.0),
    ("utilitario", 2.0),
    ("tractor", 1.0),
    ("ferroviario", 0.5),
    ("otro", 0.5),
];

const AGE_BRACKETS: &[(&str, f64)] = &[
    ("0-14", 5.0),
    ("15-24", 22.0),
    ("25-34", 24.0),
    ("35-44", 16.0),
    ("45-54", 12.0),
    ("55-64", 10.0),
    ("65 y más", 11.0),
];

/// Rough monthly seasonality (January/December travel peaks, winter dip).
const MONTH_FACTOR: [f64; 12] = [
    1.15, 1.0, 0.95, 0.9, 0.9, 0.85, 0.9, 0.95, 0.95, 1.0, 1.05, 1.2,
];

fn main() {
    let mut rng = SimpleRng::new(42);

    let out_dir = Path::new("data/processed");
    fs::create_dir_all(out_dir).expect("creating data/processed");
    let out_path = out_dir.join("dataset_limpio.csv");

    let mut writer = csv::Writer::from_path(&out_path).expect("creating output CSV");
    writer
        .write_record([
            "anio",
            "mes_num",
            "provincia_nombre",
            "id_hecho",
            "latitud",
            "longitud",
            "victima_tr_edad",
            "victima_vehiculo_ampliado",
        ])
        .expect("writing header");

    let province_weights: Vec<f64> = PROVINCES.iter().map(|p| p.1).collect();
    let vehicle_weights: Vec<f64> = VEHICLES.iter().map(|v| v.1).collect();
    let age_weights: Vec<f64> = AGE_BRACKETS.iter().map(|a| a.1).collect();

    let mut incident_seq = 0u32;
    let mut victim_rows = 0usize;

    for year in 2017..=2023 {
        // Mobility collapsed in 2020, with a gradual recovery in 2021.
        let year_factor = match year {
            2020 => 0.62,
            2021 => 0.85,
            _ => 1.0,
        };

        for month in 1..=12u32 {
            let year_cell = year.to_string();
            let month_cell = month.to_string();
            let base = 320.0 * year_factor * MONTH_FACTOR[(month - 1) as usize];
            let incidents = (base * (0.9 + 0.2 * rng.next_f64())).round() as usize;

            for _ in 0..incidents {
                incident_seq += 1;
                let incident_id = format!("ARG-{year}-{incident_seq:06}");

                let province_idx = rng.weighted(&province_weights);
                let (province, _, cap_lat, cap_lon) = PROVINCES[province_idx];

                // Most crashes kill one person; a few kill several.
                let victims = match rng.next_f64() {
                    r if r < 0.90 => 1,
                    r if r < 0.98 => 2,
                    _ => 3,
                };

                for _ in 0..victims {
                    victim_rows += 1;

                    // ~3% of rows lost their province during cleaning.
                    let province_cell = if rng.next_f64() < 0.03 { "" } else { province };

                    // ~15% have no coordinates; a handful carry junk ones.
                    let (lat_cell, lon_cell) = if rng.next_f64() < 0.15 {
                        (String::new(), String::new())
                    } else if rng.next_f64() < 0.005 {
                        ("0.0".to_string(), "0.0".to_string())
                    } else {
                        let lat = cap_lat + (rng.next_f64() - 0.5) * 1.6;
                        let lon = cap_lon + (rng.next_f64() - 0.5) * 1.6;
                        (format!("{lat:.5}"), format!("{lon:.5}"))
                    };

                    let age = AGE_BRACKETS[rng.weighted(&age_weights)].0;
                    let vehicle = VEHICLES[rng.weighted(&vehicle_weights)].0;

                    writer
                        .write_record([
                            year_cell.as_str(),
                            month_cell.as_str(),
                            province_cell,
                            incident_id.as_str(),
                            lat_cell.as_str(),
                            lon_cell.as_str(),
                            age,
                            vehicle,
                        ])
                        .expect("writing row");
                }
            }
        }
    }

    writer.flush().expect("flushing CSV");
    println!(
        "Wrote {victim_rows} victim rows ({incident_seq} incidents) to {}",
        out_path.display()
    );
}
