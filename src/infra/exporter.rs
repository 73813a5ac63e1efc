// ============================================================
// Layer 6 — Prediction Exporter
// ============================================================
// Writes test-set predictions (and, for case studies, the true
// labels) as header-less CSV files, one utterance per row, in
// partition order:
//
//   pred_<tag>_sen.txt     -0.8312
//   pred_<tag>_pol.txt     0.2291,Negative
//   pred_<tag>_int.txt     0.1102,0.6120,0.2210,0.0568,Weak
//
//   test_labels_sen.txt    -1.4
//   test_labels_pol.txt    0,Negative
//   test_labels_int.txt    0,1,0,0,Weak

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::sentiment::{Intensity, Polarity, SentimentLabels};
use crate::ml::predictor::Predictions;

pub struct PredictionExporter {
    dir: PathBuf,
    tag: String,
}

/// Paths of the three files written by one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub valence:   PathBuf,
    pub polarity:  PathBuf,
    pub intensity: PathBuf,
}

impl PredictionExporter {
    pub fn new(dir: impl Into<PathBuf>, tag: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output dir '{}'", dir.display()))?;
        Ok(Self { dir, tag: tag.into() })
    }

    pub fn write_predictions(&self, predictions: &Predictions) -> Result<ExportedFiles> {
        let files = ExportedFiles {
            valence:   self.dir.join(format!("pred_{}_sen.txt", self.tag)),
            polarity:  self.dir.join(format!("pred_{}_pol.txt", self.tag)),
            intensity: self.dir.join(format!("pred_{}_int.txt", self.tag)),
        };

        write_rows(&files.valence, predictions.valence.iter().map(|v| vec![v.to_string()]))?;

        write_rows(
            &files.polarity,
            predictions.polarity.iter().map(|&p| {
                vec![p.to_string(), Polarity::from_probability(p).name().to_string()]
            }),
        )?;

        write_rows(
            &files.intensity,
            predictions.intensity.iter().map(|probs| {
                let mut row: Vec<String> = probs.iter().map(f32::to_string).collect();
                row.push(Intensity::from_distribution(probs).name().to_string());
                row
            }),
        )?;

        tracing::info!(
            "Wrote {} predictions to '{}'",
            predictions.len(),
            self.dir.display()
        );
        Ok(files)
    }

    /// Ground-truth exports for case studies.
    pub fn write_ground_truth(&self, labels: &[SentimentLabels]) -> Result<ExportedFiles> {
        if labels.is_empty() {
            bail!("no labels to export");
        }
        let files = ExportedFiles {
            valence:   self.dir.join("test_labels_sen.txt"),
            polarity:  self.dir.join("test_labels_pol.txt"),
            intensity: self.dir.join("test_labels_int.txt"),
        };

        write_rows(&files.valence, labels.iter().map(|l| vec![l.valence.to_string()]))?;

        write_rows(
            &files.polarity,
            labels.iter().map(|l| {
                vec![l.polarity.label().to_string(), l.polarity.name().to_string()]
            }),
        )?;

        write_rows(
            &files.intensity,
            labels.iter().map(|l| {
                let mut row: Vec<String> = l
                    .intensity
                    .one_hot()
                    .iter()
                    .map(|&b| (b as u8).to_string())
                    .collect();
                row.push(l.intensity.name().to_string());
                row
            }),
        )?;

        tracing::info!("Wrote {} ground-truth labels to '{}'", labels.len(), self.dir.display());
        Ok(files)
    }
}

fn write_rows(path: &Path, rows: impl Iterator<Item = Vec<String>>) -> Result<()> {
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    for row in rows {
        w.write_record(&row)?;
    }
    w.flush()
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> Vec<String> {
        fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_prediction_files() {
        let tmp = tempfile::tempdir().unwrap();
        let exp = PredictionExporter::new(tmp.path(), "FL_tri").unwrap();
        let preds = Predictions {
            valence:   vec![-0.5, 1.25],
            polarity:  vec![0.25, 0.75],
            intensity: vec![[0.5, 0.25, 0.125, 0.125], [0.0, 0.0, 0.25, 0.75]],
        };
        let files = exp.write_predictions(&preds).unwrap();

        assert!(files.valence.ends_with("pred_FL_tri_sen.txt"));
        assert_eq!(read(&files.valence), vec!["-0.5", "1.25"]);
        assert_eq!(read(&files.polarity), vec!["0.25,Negative", "0.75,Positive"]);
        assert_eq!(
            read(&files.intensity),
            vec!["0.5,0.25,0.125,0.125,Neutral", "0,0,0.25,0.75,Strong"]
        );
    }

    #[test]
    fn test_ground_truth_files() {
        let tmp = tempfile::tempdir().unwrap();
        let exp = PredictionExporter::new(tmp.path(), "x").unwrap();
        let labels: Vec<SentimentLabels> =
            [-1.5, 0.0].iter().map(|&s| SentimentLabels::from_score(s)).collect();
        let files = exp.write_ground_truth(&labels).unwrap();

        assert_eq!(read(&files.valence), vec!["-1.5", "0"]);
        assert_eq!(read(&files.polarity), vec!["0,Negative", "1,Positive"]);
        assert_eq!(read(&files.intensity), vec!["0,0,1,0,Medium", "1,0,0,0,Neutral"]);
    }

    #[test]
    fn test_empty_ground_truth_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let exp = PredictionExporter::new(tmp.path(), "x").unwrap();
        assert!(exp.write_ground_truth(&[]).is_err());
    }
}
