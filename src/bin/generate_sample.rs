//! Writes a synthetic stroke dataset as `stroke_data.csv` and
//! `stroke_data.parquet` for trying the dashboard without the Kaggle file.

use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const ROWS: usize = 2000;

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
        let result = self.state[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(1e-15);
        let u2 = self.uniform();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick from `(value, weight)` pairs.
    fn weighted<'a>(&mut self, choices: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = choices.iter().map(|(_, w)| w).sum();
        let mut roll = self.uniform() * total;
        for &(value, weight) in choices {
            if roll < weight {
                return value;
            }
            roll -= weight;
        }
        choices.last().map(|(v, _)| *v).unwrap_or_default()
    }
}

struct Patient {
    id: i64,
    gender: &'static str,
    age: f64,
    hypertension: i64,
    heart_disease: i64,
    ever_married: &'static str,
    work_type: &'static str,
    residence_type: &'static str,
    avg_glucose_level: f64,
    bmi: Option<f64>,
    smoking_status: &'static str,
    stroke: i64,
}

fn patient(rng: &mut SimpleRng, id: i64) -> Patient {
    let age = if rng.chance(0.05) {
        // A few infants with fractional ages, as in the real data.
        (rng.uniform() * 2.0 * 100.0).round() / 100.0 + 0.08
    } else {
        (rng.uniform() * 80.0 + 2.0).round()
    };
    let elderly = age >= 60.0;
    let hypertension = rng.chance(if elderly { 0.25 } else { 0.05 });
    let heart_disease = rng.chance(if elderly { 0.15 } else { 0.02 });

    let work_type = if age < 16.0 {
        rng.weighted(&[("children", 0.9), ("Never_worked", 0.1)])
    } else {
        rng.weighted(&[("Private", 0.57), ("Self-employed", 0.16), ("Govt_job", 0.13), ("Never_worked", 0.01)])
    };
    let smoking_status = if age < 16.0 {
        "Unknown"
    } else {
        rng.weighted(&[("never smoked", 0.37), ("formerly smoked", 0.17), ("smokes", 0.15), ("Unknown", 0.3)])
    };

    let diabetic = rng.chance(if elderly { 0.2 } else { 0.08 });
    let avg_glucose_level = if diabetic {
        rng.gauss(210.0, 30.0)
    } else {
        rng.gauss(92.0, 18.0)
    }
    .clamp(55.0, 272.0);
    let bmi = (!rng.chance(0.04)).then(|| rng.gauss(21.0 + age.min(50.0) * 0.17, 6.0).clamp(10.0, 92.0));

    let mut risk = 0.002 + (age / 82.0).powi(3) * 0.12;
    if hypertension {
        risk += 0.04;
    }
    if heart_disease {
        risk += 0.05;
    }
    if avg_glucose_level > 180.0 {
        risk += 0.03;
    }
    let stroke = rng.chance(risk);

    Patient {
        id,
        gender: rng.weighted(&[("Female", 0.586), ("Male", 0.414), ("Other", 0.0004)]),
        age,
        hypertension: hypertension.into(),
        heart_disease: heart_disease.into(),
        ever_married: if age > 20.0 && rng.chance(0.8) { "Yes" } else { "No" },
        work_type,
        residence_type: rng.weighted(&[("Urban", 0.5), ("Rural", 0.5)]),
        avg_glucose_level: (avg_glucose_level * 100.0).round() / 100.0,
        bmi: bmi.map(|b| (b * 10.0).round() / 10.0),
        smoking_status,
        stroke: stroke.into(),
    }
}

const HEADER: [&str; 12] = [
    "id",
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "ever_married",
    "work_type",
    "Residence_type",
    "avg_glucose_level",
    "bmi",
    "smoking_status",
    "stroke",
];

fn write_csv(path: &str, patients: &[Patient]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADER)?;
    for p in patients {
        writer.write_record([
            p.id.to_string(),
            p.gender.to_string(),
            p.age.to_string(),
            p.hypertension.to_string(),
            p.heart_disease.to_string(),
            p.ever_married.to_string(),
            p.work_type.to_string(),
            p.residence_type.to_string(),
            p.avg_glucose_level.to_string(),
            p.bmi.map(|b| b.to_string()).unwrap_or_else(|| "N/A".to_string()),
            p.smoking_status.to_string(),
            p.stroke.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, patients: &[Patient]) -> Result<()> {
    let mut ids = Int64Builder::new();
    let mut ages = Float64Builder::new();
    let mut glucose = Float64Builder::new();
    let mut bmi = Float64Builder::new();
    let mut hypertension = Int64Builder::new();
    let mut heart_disease = Int64Builder::new();
    let mut stroke = Int64Builder::new();
    let mut text: Vec<StringBuilder> = (0..5).map(|_| StringBuilder::new()).collect();

    for p in patients {
        ids.append_value(p.id);
        ages.append_value(p.age);
        glucose.append_value(p.avg_glucose_level);
        bmi.append_option(p.bmi);
        hypertension.append_value(p.hypertension);
        heart_disease.append_value(p.heart_disease);
        stroke.append_value(p.stroke);
        let values = [
            p.gender,
            p.ever_married,
            p.work_type,
            p.residence_type,
            p.smoking_status,
        ];
        for (builder, value) in text.iter_mut().zip(values) {
            builder.append_value(value);
        }
    }

    let mut text_columns = text.into_iter().map(|mut b| Arc::new(b.finish()) as ArrayRef);
    let mut next_text = || text_columns.next().context("missing text column");
    let columns: Vec<(&str, DataType, bool, ArrayRef)> = vec![
        ("id", DataType::Int64, false, Arc::new(ids.finish()) as ArrayRef),
        ("gender", DataType::Utf8, false, next_text()?),
        ("age", DataType::Float64, false, Arc::new(ages.finish()) as ArrayRef),
        ("hypertension", DataType::Int64, false, Arc::new(hypertension.finish()) as ArrayRef),
        ("heart_disease", DataType::Int64, false, Arc::new(heart_disease.finish()) as ArrayRef),
        ("ever_married", DataType::Utf8, false, next_text()?),
        ("work_type", DataType::Utf8, false, next_text()?),
        ("Residence_type", DataType::Utf8, false, next_text()?),
        ("avg_glucose_level", DataType::Float64, false, Arc::new(glucose.finish()) as ArrayRef),
        ("bmi", DataType::Float64, true, Arc::new(bmi.finish()) as ArrayRef),
        ("smoking_status", DataType::Utf8, false, next_text()?),
        ("stroke", DataType::Int64, false, Arc::new(stroke.finish()) as ArrayRef),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, ty, nullable, _)| Field::new(*name, ty.clone(), *nullable))
            .collect::<Vec<_>>(),
    ));
    let arrays = columns.into_iter().map(|(_, _, _, array)| array).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let patients: Vec<Patient> = (0..ROWS).map(|i| patient(&mut rng, 9000 + i as i64)).collect();
    let strokes = patients.iter().filter(|p| p.stroke == 1).count();

    write_csv("stroke_data.csv", &patients)?;
    write_parquet("stroke_data.parquet", &patients)?;

    println!("Wrote {ROWS} patients ({strokes} with stroke) to stroke_data.csv and stroke_data.parquet");
    Ok(())
}
