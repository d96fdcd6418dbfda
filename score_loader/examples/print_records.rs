use std::path::PathBuf;

use clap::Parser;
use score_schema::Metric;

#[derive(Debug, Parser)]
struct Args {
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let records = score_loader::load_records_json_from_path(args.path)?;
    println!("records={}", records.len());
    for record in &records {
        let scores: Vec<String> = Metric::ALL
            .iter()
            .map(|m| format!("{}={}", m.label().to_lowercase(), record.score(*m)))
            .collect();
        println!("{} {}", record.id, scores.join(" "));
    }
    Ok(())
}
