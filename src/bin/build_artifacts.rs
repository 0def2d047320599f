use std::collections::BTreeMap;
use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use uuid::Uuid;

use intent_gate::azure::embeddings::AzureEmbeddingClient;
use intent_gate::classifier::knn::FlatIndex;
use intent_gate::classifier::labels::LabelCodec;
use intent_gate::classifier::linear::LinearClassifier;
use intent_gate::config::{ArtifactPaths, EmbeddingSettings};
use intent_gate::manager::{write_artifact, ModelSet};
use intent_gate::pipeline::Embedder;

/// Weight export of the offline-trained classifier: one row per class, in
/// class-name order matching `classes`. Fitting itself happens elsewhere;
/// this tool only repackages the result next to a freshly built index.
#[derive(Deserialize)]
struct ClassifierExport {
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
    classes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let intents_path = args
        .next()
        .unwrap_or_else(|| "data/input/intents.json".to_string());
    let export_path = args
        .next()
        .unwrap_or_else(|| "model/artifacts/classifier_export.json".to_string());

    let raw = fs::read_to_string(&intents_path)
        .with_context(|| format!("failed to read {intents_path}"))?;
    let intents: BTreeMap<String, Vec<String>> =
        serde_json::from_str(&raw).with_context(|| format!("invalid intents in {intents_path}"))?;

    let raw = fs::read_to_string(&export_path)
        .with_context(|| format!("failed to read {export_path}"))?;
    let export: ClassifierExport = serde_json::from_str(&raw)
        .with_context(|| format!("invalid classifier export in {export_path}"))?;

    let mut all_texts = Vec::new();
    let mut all_labels = Vec::new();
    for (label, texts) in &intents {
        for text in texts {
            all_texts.push(text.clone());
            all_labels.push(label.clone());
        }
    }
    if all_texts.is_empty() {
        bail!("{intents_path} contains no labeled examples");
    }

    let labels = LabelCodec::fit(all_labels);
    if labels.len() != export.classes.len() {
        bail!(
            "classifier export has {} classes but the example set has {}",
            export.classes.len(),
            labels.len()
        );
    }
    let class_ids = export
        .classes
        .iter()
        .map(|class| labels.encode(class))
        .collect::<Result<Vec<_>, _>>()
        .context("classifier export names a class absent from the example set")?;

    println!("📐 Embedding {} examples...", all_texts.len());

    let settings = EmbeddingSettings::from_env()?;
    let dim = settings.dimensions;
    let embedder = AzureEmbeddingClient::new(&settings);
    let vectors = embedder.embed_batch(&all_texts).await?;

    let flat: Vec<f32> = vectors.into_iter().flatten().collect();
    let matrix = Array2::from_shape_vec((all_texts.len(), dim), flat)
        .context("embedding batch did not fill an examples x dim matrix")?;

    let coef_rows = export.coef.len();
    let coef_flat: Vec<f32> = export.coef.into_iter().flatten().collect();
    let coef = Array2::from_shape_vec((coef_rows, dim), coef_flat)
        .context("classifier export coef rows do not match the embedding dimension")?;
    let intercept = Array1::from(export.intercept);

    // One id stamped across classifier and index ties both artifacts to this
    // run's corpus; the loader refuses mixed generations.
    let corpus_id = Uuid::new_v4().to_string();

    let set = ModelSet {
        classifier: LinearClassifier::new(coef, intercept, class_ids, corpus_id.clone()),
        labels,
        index: FlatIndex::new(matrix, corpus_id.clone()),
    };
    set.validate().context("built artifacts are inconsistent")?;

    let paths = ArtifactPaths::from_env();
    write_artifact(&paths.classifier, &set.classifier)
        .with_context(|| format!("failed to write {}", paths.classifier.display()))?;
    write_artifact(&paths.labels, &set.labels)
        .with_context(|| format!("failed to write {}", paths.labels.display()))?;
    write_artifact(&paths.index, &set.index)
        .with_context(|| format!("failed to write {}", paths.index.display()))?;

    println!(
        "✅ Artifacts written: {} classes, {} examples, corpus {corpus_id}",
        set.labels.len(),
        set.index.len()
    );

    Ok(())
}
