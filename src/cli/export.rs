//! Export subcommand: write an owner's tasks as a JSON snapshot.

use crate::db::export::Snapshot;
use anyhow::Result;
use clap::Args;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::PathBuf;

/// Arguments for the export subcommand
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Force gzip compression (auto-detected from .gz extension otherwise)
    #[arg(long)]
    pub gzip: bool,
}

impl ExportArgs {
    /// Determine if output should be compressed based on args and filename
    pub fn should_compress(&self) -> bool {
        if self.gzip {
            return true;
        }

        self.output
            .as_ref()
            .is_some_and(|path| path.extension().is_some_and(|ext| ext == "gz"))
    }
}

/// Serialize the snapshot to `writer`, gzipped when `compress` is set.
pub fn write_snapshot<W: Write>(snapshot: &Snapshot, writer: W, compress: bool) -> Result<()> {
    let json = snapshot.to_json_pretty()?;

    if compress {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        encoder.write_all(json.as_bytes())?;
        encoder.finish()?;
    } else {
        let mut writer = writer;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    Ok(())
}

/// Run the export to the file or stdout named by `args`.
pub fn run(snapshot: &Snapshot, args: &ExportArgs) -> Result<()> {
    let compress = args.should_compress();

    match args.output {
        Some(ref path) => {
            let file = std::fs::File::create(path)?;
            write_snapshot(snapshot, file, compress)?;
            eprintln!(
                "Exported {} tasks to {}{}",
                snapshot.tasks.len(),
                path.display(),
                if compress { " (gzipped)" } else { "" }
            );
        }
        None => {
            let stdout = std::io::stdout();
            write_snapshot(snapshot, stdout.lock(), compress)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_should_compress() {
        let args = ExportArgs {
            output: None,
            gzip: true,
        };
        assert!(args.should_compress());

        let args = ExportArgs {
            output: Some(PathBuf::from("snapshot.json.gz")),
            gzip: false,
        };
        assert!(args.should_compress());

        let args = ExportArgs {
            output: Some(PathBuf::from("snapshot.json")),
            gzip: false,
        };
        assert!(!args.should_compress());
    }

    #[test]
    fn gzip_output_decodes_to_snapshot() {
        let snapshot = Snapshot::new("local", vec![]);
        let mut buf = Vec::new();
        write_snapshot(&snapshot, &mut buf, true).unwrap();

        let mut json = String::new();
        GzDecoder::new(&buf[..]).read_to_string(&mut json).unwrap();
        let back = Snapshot::from_json(&json).unwrap();
        assert_eq!(back.owner_id, "local");
        assert!(back.tasks.is_empty());
    }

    #[test]
    fn run_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let args = ExportArgs {
            output: Some(path.clone()),
            gzip: false,
        };
        run(&Snapshot::new("bob", vec![]), &args).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"owner_id\": \"bob\""));
    }
}
