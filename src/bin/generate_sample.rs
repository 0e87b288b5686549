//! Writes a synthetic credit-card default dataset with the canonical column
//! layout, as CSV or Parquet depending on the output extension.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

use credit_dash::data::Record;
use credit_dash::data::model::MONTHS;
use credit_dash::data::schema::canonical_headers;
use credit_dash::scoring::sigmoid;

#[derive(Parser, Debug)]
#[command(name = "generate-sample", about = "Write a synthetic credit default dataset")]
struct Args {
    /// Output file (.csv or .parquet)
    #[arg(short, long, default_value = "sample_credit.csv")]
    output: PathBuf,

    #[arg(short, long, default_value_t = 2000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Category codes drawn with fixed weights.
struct Categorical {
    codes: &'static [i64],
    index: WeightedIndex<f64>,
}

impl Categorical {
    fn new(codes: &'static [i64], weights: &[f64]) -> Result<Self> {
        Ok(Self {
            codes,
            index: WeightedIndex::new(weights)?,
        })
    }

    fn sample(&self, rng: &mut StdRng) -> i64 {
        self.codes[self.index.sample(rng)]
    }
}

struct Generator {
    rng: StdRng,
    sex: Categorical,
    education: Categorical,
    marriage: Categorical,
}

impl Generator {
    fn new(seed: u64) -> Result<Self> {
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            sex: Categorical::new(&[1, 2], &[0.4, 0.6])?,
            education: Categorical::new(
                &[1, 2, 3, 4, 5, 6, 0],
                &[0.35, 0.47, 0.16, 0.005, 0.01, 0.003, 0.002],
            )?,
            marriage: Categorical::new(&[1, 2, 3, 0], &[0.45, 0.53, 0.015, 0.005])?,
        })
    }

    /// Delinquency drives both the repayment history and the outcome, so the
    /// label is learnable from the history columns.
    fn record(&mut self) -> Record {
        let rng = &mut self.rng;
        let credit_limit = f64::from(rng.gen_range(1..=80u32)) * 10_000.0;
        let age = rng.gen_range(21..=75);
        let delinquency: f64 = rng.gen();

        let mut pay_status = [0i64; MONTHS];
        let mut bill_amount = [0.0; MONTHS];
        let mut pay_amount = [0.0; MONTHS];
        let utilization: f64 = rng.gen_range(0.0..0.9);
        for m in 0..MONTHS {
            pay_status[m] = if rng.gen::<f64>() < delinquency * 0.6 {
                rng.gen_range(1..=4)
            } else {
                rng.gen_range(-2..=0)
            };
            let bill = (credit_limit * utilization * rng.gen_range(0.8..1.2)).round();
            bill_amount[m] = bill;
            pay_amount[m] = if pay_status[m] > 0 {
                (bill * rng.gen_range(0.0..0.05)).round()
            } else {
                (bill * rng.gen_range(0.05..1.0)).round()
            };
        }

        let late_months = pay_status.iter().filter(|&&s| s > 0).count() as f64;
        let z = -2.4 + 0.9 * pay_status[0].max(0) as f64 + 0.25 * late_months
            - credit_limit / 400_000.0;
        let defaulted = rng.gen::<f64>() < sigmoid(z);

        Record {
            credit_limit,
            age,
            education: self.education.sample(&mut self.rng),
            sex: self.sex.sample(&mut self.rng),
            marriage: self.marriage.sample(&mut self.rng),
            pay_status,
            bill_amount,
            pay_amount,
            defaulted,
        }
    }
}

fn write_csv(path: &Path, records: &[Record]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(canonical_headers())?;
    for r in records {
        writer.write_record(r.canonical_cells())?;
    }
    writer.flush()?;
    Ok(())
}

fn int_column(records: &[Record], f: impl Fn(&Record) -> i64) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(records.iter().map(f)))
}

fn float_column(records: &[Record], f: impl Fn(&Record) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(records.iter().map(f)))
}

fn write_parquet(path: &Path, records: &[Record]) -> Result<()> {
    let mut columns: Vec<ArrayRef> = vec![
        float_column(records, |r| r.credit_limit),
        int_column(records, |r| r.sex),
        int_column(records, |r| r.education),
        int_column(records, |r| r.marriage),
        int_column(records, |r| i64::from(r.age)),
    ];
    columns.extend((0..MONTHS).map(|m| int_column(records, |r| r.pay_status[m])));
    columns.extend((0..MONTHS).map(|m| float_column(records, |r| r.bill_amount[m])));
    columns.extend((0..MONTHS).map(|m| float_column(records, |r| r.pay_amount[m])));
    columns.push(int_column(records, |r| i64::from(r.defaulted)));

    let schema = Arc::new(Schema::new(
        canonical_headers()
            .into_iter()
            .zip(&columns)
            .map(|(name, col)| Field::new(name, col.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut generator = Generator::new(args.seed)?;
    let records: Vec<Record> = (0..args.rows).map(|_| generator.record()).collect();
    let defaults = records.iter().filter(|r| r.defaulted).count();

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => write_csv(&args.output, &records),
        Some("parquet") | Some("pq") => write_parquet(&args.output, &records),
        _ => bail!("unsupported output extension: {}", args.output.display()),
    }
    .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {} records ({} defaults) to {}",
        records.len(),
        defaults,
        args.output.display()
    );
    Ok(())
}
