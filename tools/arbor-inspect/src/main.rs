use anyhow::Context;
use clap::{Parser, ValueEnum};
use rkyv::ser::{serializers::AllocSerializer, Serializer};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arbor_graph::{project, Classifier, Direction, Projection, ProjectionOptions, Sentence, Unvalidated};
use arbor_protocol::{IndexFormat, SentenceSnapshot};
use arbor_validate::{Diagnostic, UdValidator};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Conllu,
    Cg3,
    Internal,
}

impl From<Format> for IndexFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Conllu => IndexFormat::Conllu,
            Format::Cg3 => IndexFormat::Cg3,
            Format::Internal => IndexFormat::Internal,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Projects a JSON sentence snapshot into renderable graph elements")]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Numbering scheme used for element ids and labels
    #[arg(short, long, value_enum, default_value = "conllu")]
    format: Format,

    /// Lay the sentence out right to left
    #[arg(long)]
    rtl: bool,

    /// Draw secondary (enhanced) dependencies
    #[arg(long)]
    enhanced: bool,

    /// Mark annotation problems and list them
    #[arg(long)]
    validate: bool,

    /// Also write the checked snapshot as an rkyv archive
    #[arg(long, value_name = "FILE")]
    archive: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Report {
    /// Share of annotation slots filled, from 0 to 1.
    completion: f64,
    projection: Projection,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<Vec<Diagnostic>>,
}

fn init_logging() {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(console_layer)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let input_data = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let mut snapshot: SentenceSnapshot = serde_json::from_str(&input_data)?;
    snapshot.enhanced |= cli.enhanced;

    let sentence = Sentence::from_snapshot(&snapshot)
        .map_err(|e| anyhow::anyhow!("{} ({})", e, e.code()))?;
    tracing::info!(tokens = sentence.len(), "loaded {}", cli.input.display());

    let options = ProjectionOptions {
        format: cli.format.into(),
        direction: if cli.rtl { Direction::Rtl } else { Direction::Ltr },
    };

    let validator = cli.validate.then(|| UdValidator::new(&sentence, options.format));
    let classifier: &dyn Classifier = match &validator {
        Some(validator) => validator,
        None => &Unvalidated,
    };
    let projection = project(&sentence, &options, classifier);
    let report = Report {
        completion: projection.progress.ratio(),
        projection,
        diagnostics: validator.as_ref().map(|validator| validator.diagnose(&sentence)),
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    if let Some(path) = &cli.archive {
        let mut serializer = AllocSerializer::<256>::default();
        serializer
            .serialize_value(&sentence.to_snapshot())
            .map_err(|e| anyhow::anyhow!("archiving snapshot: {:?}", e))?;
        let bytes = serializer.into_serializer().into_inner();
        fs::write(path, bytes)?;
        tracing::info!("archive written to {}", path.display());
    }

    Ok(())
}
