use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Value as JsonValue};

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (method, base error, growth per sweep step, failure rate at the top of the sweep)
const METHODS: [(&str, f64, f64, f64); 6] = [
    ("centralized", 0.05, 0.000, 0.0),
    ("independent", 0.40, 0.060, 0.5),
    ("ddfsam2", 0.20, 0.030, 0.3),
    ("imesa", 0.08, 0.004, 0.0),
    ("raido", 0.07, 0.002, 0.1),
    ("raido_kn", 0.06, 0.002, 0.0),
];

const NOISE_LEVELS: usize = 8;
const REPEAT: usize = 3;
const ROBOT_COUNTS: usize = 7;

/// One long-format row: scenario, method, metric, value.
type Row = (String, String, String, f64);

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut nested: BTreeMap<String, BTreeMap<String, JsonValue>> = BTreeMap::new();
    let mut rows: Vec<Row> = Vec::new();

    // Noise sweep: REPEAT runs per level, failed runs leave no iATE entry.
    let scenario = "2d_5r_noised_prior";
    for &(method, base, growth, fail_rate) in &METHODS {
        let mut iate = Vec::new();
        let mut statuses = Vec::new();
        for level in 0..NOISE_LEVELS {
            let p_fail = fail_rate * level as f64 / (NOISE_LEVELS - 1) as f64;
            for _ in 0..REPEAT {
                let ok = rng.next_f64() >= p_fail;
                statuses.push(ok);
                if ok {
                    let err = base + growth * level as f64 + rng.gauss(0.0, 0.01);
                    iate.push(err.abs());
                }
            }
        }

        for &v in &iate {
            rows.push((scenario.into(), method.into(), "iate_trans".into(), v));
        }
        for &ok in &statuses {
            rows.push((scenario.into(), method.into(), "statuses".into(), f64::from(u8::from(ok))));
        }
        nested
            .entry(scenario.to_string())
            .or_default()
            .insert(method.to_string(), json!({ "iate_trans": iate, "statuses": statuses }));
    }

    // Robot-count sweep: one already averaged value per count.
    let scenario = "2d_nr_noised";
    for &(method, base, growth, _) in &METHODS {
        let iate: Vec<f64> = (0..ROBOT_COUNTS)
            .map(|n| (base + 0.5 * growth * n as f64 + rng.gauss(0.0, 0.005)).abs())
            .collect();
        for &v in &iate {
            rows.push((scenario.into(), method.into(), "iate_trans".into(), v));
        }
        nested
            .entry(scenario.to_string())
            .or_default()
            .insert(method.to_string(), json!({ "iate_trans": iate }));
    }

    // Write JSON
    let json_path = "sample_results.json";
    let text = serde_json::to_string_pretty(&nested).context("serializing JSON")?;
    std::fs::write(json_path, text).with_context(|| format!("writing {json_path}"))?;

    // Write CSV (long layout)
    let csv_path = "sample_results.csv";
    let mut csv_writer =
        csv::Writer::from_path(csv_path).with_context(|| format!("creating {csv_path}"))?;
    csv_writer
        .write_record(["scenario", "method", "metric", "value"])
        .context("writing CSV header")?;
    for (scenario, method, metric, value) in &rows {
        let value = value.to_string();
        csv_writer
            .write_record([scenario.as_str(), method.as_str(), metric.as_str(), value.as_str()])
            .context("writing CSV row")?;
    }
    csv_writer.flush().context("flushing CSV")?;

    // Write Parquet (long layout)
    let schema = Arc::new(Schema::new(vec![
        Field::new("scenario", DataType::Utf8, false),
        Field::new("method", DataType::Utf8, false),
        Field::new("metric", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
    ]));

    let scenario_array = StringArray::from(rows.iter().map(|r| r.0.as_str()).collect::<Vec<_>>());
    let method_array = StringArray::from(rows.iter().map(|r| r.1.as_str()).collect::<Vec<_>>());
    let metric_array = StringArray::from(rows.iter().map(|r| r.2.as_str()).collect::<Vec<_>>());
    let value_array = Float64Array::from(rows.iter().map(|r| r.3).collect::<Vec<_>>());

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(scenario_array),
            Arc::new(method_array),
            Arc::new(metric_array),
            Arc::new(value_array),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "sample_results.parquet";
    let file = std::fs::File::create(parquet_path)
        .with_context(|| format!("creating {parquet_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    println!(
        "Wrote {} rows ({} methods) to {json_path}, {csv_path} and {parquet_path}",
        rows.len(),
        METHODS.len()
    );
    Ok(())
}
