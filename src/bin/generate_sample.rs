use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const HEADER: [&str; 8] = [
    "Age",
    "Primary streaming service",
    "Hours per day",
    "Fav genre",
    "Anxiety",
    "Depression",
    "Insomnia",
    "OCD",
];

const GENRES: [(&str, f64); 8] = [
    ("Rock", 1.0),
    ("Pop", 0.0),
    ("Metal", 1.5),
    ("Classical", -1.0),
    ("Jazz", -0.5),
    ("Hip hop", 0.5),
    ("EDM", 0.5),
    ("Folk", -0.5),
];

const SERVICES: [&str; 4] = ["Spotify", "YouTube Music", "Apple Music", "I do not use a streaming service."];

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A 0–10 score cell; roughly 3% come out unusable the way real exports do.
fn score(rng: &mut SimpleRng, mean: f64) -> String {
    let roll = rng.next_f64();
    if roll < 0.015 {
        return String::new();
    }
    if roll < 0.03 {
        return "N/A".to_string();
    }
    rng.gauss(mean, 2.5).round().clamp(0.0, 10.0).to_string()
}

fn generate(n: usize, rng: &mut SimpleRng) -> Vec<[String; 8]> {
    (0..n)
        .map(|_| {
            let age = rng.gauss(25.0, 11.0).round().clamp(10.0, 89.0);
            let hours = (rng.gauss(3.5, 2.8).max(0.0) * 2.0).round() / 2.0;
            let (genre, lift) = GENRES[rng.below(GENRES.len())];
            let service = SERVICES[rng.below(SERVICES.len())];
            // younger, heavier listeners score a little higher
            let base = 4.0 + lift + (hours - 3.5) * 0.3 - (age - 25.0) * 0.03;

            let age_cell = if rng.next_f64() < 0.01 { String::new() } else { age.to_string() };
            [
                age_cell,
                service.to_string(),
                hours.to_string(),
                genre.to_string(),
                score(rng, base + 1.5),
                score(rng, base),
                score(rng, base - 0.5),
                score(rng, base - 2.0),
            ]
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[[String; 8]]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// All columns as Utf8 so blanks and `N/A` survive as they are in the CSV.
fn write_parquet(path: &Path, rows: &[[String; 8]]) -> Result<()> {
    let schema = Arc::new(Schema::new(
        HEADER
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let columns: Vec<ArrayRef> = (0..HEADER.len())
        .map(|col| {
            let values: StringArray = rows.iter().map(|r| Some(r[col].as_str())).collect();
            Arc::new(values) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_survey.csv".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate(736, &mut rng);

    if path.extension().and_then(|e| e.to_str()) == Some("parquet") {
        write_parquet(path, &rows)?;
    } else {
        write_csv(path, &rows)?;
    }

    println!("Wrote {} respondents to {output}", rows.len());
    Ok(())
}
