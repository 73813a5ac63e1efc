// ============================================================
// Layer 2 — Corpus Preparation
// ============================================================
// Shared by `train` and `predict`. Runs the data pipeline in
// order:
//
//   Step 1: Load the selected modalities       (Layer 4 - loader)
//   Step 2: Align them onto the reference      (Layer 4 - aligner)
//           (words by default, fused or not)
//   Step 3: Select utterances per partition    (Layer 4 - partition)
//   Step 4: Pad / truncate to max_len          (Layer 4 - padding)
//   Step 5: Fit (train) or reuse (predict)
//           max-abs normalisers, then scale    (Layer 4 - normalizer)
//   Step 6: Early fusion + label derivation    (Layer 4 - fusion)

use anyhow::{bail, Context, Result};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    aligner::align_streams,
    dataset::{SentimentDataset, SentimentSample},
    fusion::early_fuse,
    normalizer::{MaxAbsNormalizer, ModalityNormalizers},
    padding::{pad, PaddedSequence},
    partition::{lookup, select_utterances, AlignedCorpus, SelectedUtterance},
};
use crate::domain::{
    sentiment::SentimentLabels,
    traits::FeatureSource,
    utterance::{Modality, Partition},
};

/// Model-ready train / validation / test sets.
pub struct PreparedCorpus {
    pub train:       SentimentDataset,
    pub valid:       SentimentDataset,
    pub test:        SentimentDataset,
    pub normalizers: ModalityNormalizers,
}

impl PreparedCorpus {
    pub fn partition(&self, partition: Partition) -> &SentimentDataset {
        match partition {
            Partition::Train => &self.train,
            Partition::Valid => &self.valid,
            Partition::Test  => &self.test,
        }
    }
}

/// Padded sequences of one partition, one Vec per modality
/// (in fusion order), each parallel to `utterances`.
struct PartitionFeatures {
    utterances: Vec<SelectedUtterance>,
    sequences:  Vec<Vec<PaddedSequence>>,
}

/// Build the three datasets. With `fitted = None` the normalisers are
/// learned from the training partition; otherwise they are reused.
pub fn prepare_corpus(
    source: &dyn FeatureSource,
    cfg:    &TrainConfig,
    fitted: Option<&ModalityNormalizers>,
) -> Result<PreparedCorpus> {
    let modalities = Modality::in_fusion_order(&cfg.modalities);
    if modalities.is_empty() {
        bail!("at least one modality must be selected");
    }
    // The reference gates selection and sets the timeline even when
    // it is not one of the fused modalities.
    let reference = cfg.align_to;

    // ── Step 1 + 2: load and align ────────────────────────────────────────────
    let reference_streams = source.load_streams(reference)?;
    let mut corpus = AlignedCorpus::new();
    for &m in &modalities {
        if m == reference {
            continue;
        }
        let raw = source.load_streams(m)?;
        corpus.insert(m, align_streams(&reference_streams, &raw));
        tracing::debug!("Aligned {} onto {}", m, reference);
    }
    corpus.insert(reference, reference_streams);

    let sentiments = source.load_sentiments()?;
    let splits     = source.load_splits()?;

    // ── Step 3 + 4: select and pad ────────────────────────────────────────────
    let mut parts = Vec::with_capacity(Partition::ALL.len());
    for partition in Partition::ALL {
        let utterances = select_utterances(partition, &splits, &corpus, reference, &sentiments)?;
        if utterances.is_empty() {
            bail!("{partition} partition is empty after selection");
        }

        let mut sequences = Vec::with_capacity(modalities.len());
        for m in &modalities {
            let streams = &corpus[m];
            let padded = utterances
                .iter()
                .map(|u| {
                    pad(lookup(streams, &u.id.video, &u.id.segment), cfg.max_len)
                        .with_context(|| format!("{m} features of {}", u.id))
                })
                .collect::<Result<Vec<_>>>()?;
            sequences.push(padded);
        }
        parts.push(PartitionFeatures { utterances, sequences });
    }

    // ── Step 5: normalise ─────────────────────────────────────────────────────
    let normalizers = match fitted {
        Some(n) => n.clone(),
        None    => fit_normalizers(&modalities, &parts[0])?,
    };
    for (i, m) in modalities.iter().enumerate() {
        if !m.is_normalized() {
            continue;
        }
        let norm = normalizers
            .get(*m)
            .with_context(|| format!("no fitted normaliser for {m}"))?;
        for part in parts.iter_mut() {
            norm.transform_all(&mut part.sequences[i])
                .with_context(|| format!("normalising {m}"))?;
        }
    }

    // ── Step 6: fuse and label ────────────────────────────────────────────────
    let mut datasets = parts.into_iter().map(build_dataset).collect::<Result<Vec<_>>>()?;
    let test  = datasets.pop().context("missing test partition")?;
    let valid = datasets.pop().context("missing validation partition")?;
    let train = datasets.pop().context("missing train partition")?;

    tracing::info!(
        "Prepared {} train / {} valid / {} test samples, {} steps x {} features",
        train.samples().len(),
        valid.samples().len(),
        test.samples().len(),
        train.steps(),
        train.feature_dim()
    );
    Ok(PreparedCorpus { train, valid, test, normalizers })
}

fn fit_normalizers(modalities: &[Modality], train: &PartitionFeatures) -> Result<ModalityNormalizers> {
    let mut set = ModalityNormalizers::new();
    for (i, m) in modalities.iter().enumerate() {
        if m.is_normalized() {
            let norm = MaxAbsNormalizer::fit(&train.sequences[i])
                .with_context(|| format!("fitting {m} normaliser"))?;
            tracing::debug!("{} divisors: {:?}", m, norm.divisors());
            set.insert(*m, norm);
        }
    }
    Ok(set)
}

fn build_dataset(part: PartitionFeatures) -> Result<SentimentDataset> {
    let samples = part
        .utterances
        .into_iter()
        .enumerate()
        .map(|(n, u)| {
            let views: Vec<&PaddedSequence> = part.sequences.iter().map(|s| &s[n]).collect();
            let fused = early_fuse(&views).with_context(|| format!("fusing {}", u.id))?;
            Ok(SentimentSample::new(u.id, fused, SentimentLabels::from_score(u.score)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SentimentDataset::new(samples))
}
