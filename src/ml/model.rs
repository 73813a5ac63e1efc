use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::{activation, backend::AutodiffBackend},
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::SentimentBatch;
use crate::domain::sentiment::Intensity;

/// Shared trunk in front of the three task heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// dropout → LSTM (last hidden state) → dense stack
    Lstm,
    /// dropout → dense stack applied per step → flatten
    Dense,
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct MultitaskConfig {
    pub architecture: Architecture,
    /// Width of the fused per-step feature vector
    pub input_dim:    usize,
    /// Number of steps every sequence is padded to
    pub steps:        usize,
    #[config(default = 0.2)]
    pub input_dropout: f64,
    #[config(default = 128)]
    pub lstm_hidden:   usize,
    #[config(default = 32)]
    pub dense_hidden:  usize,
    #[config(default = 3)]
    pub dense_layers:  usize,
    /// tanh output is multiplied by this to span the valence range
    #[config(default = 3.0)]
    pub valence_scale: f64,
}

impl MultitaskConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MultitaskModel<B> {
        let lstm = match self.architecture {
            Architecture::Lstm => {
                Some(LstmConfig::new(self.input_dim, self.lstm_hidden, true).init(device))
            }
            Architecture::Dense => None,
        };

        let mut width = match self.architecture {
            Architecture::Lstm  => self.lstm_hidden,
            Architecture::Dense => self.input_dim,
        };
        let mut dense = Vec::with_capacity(self.dense_layers);
        for _ in 0..self.dense_layers {
            dense.push(LinearConfig::new(width, self.dense_hidden).init(device));
            width = self.dense_hidden;
        }

        let trunk_dim = self.trunk_dim();
        MultitaskModel {
            input_dropout:  DropoutConfig::new(self.input_dropout).init(),
            lstm,
            dense,
            valence_head:   LinearConfig::new(trunk_dim, 1).init(device),
            polarity_head:  LinearConfig::new(trunk_dim, 1).init(device),
            intensity_head: LinearConfig::new(trunk_dim, Intensity::COUNT).init(device),
            valence_scale:  self.valence_scale,
        }
    }

    /// Width of the representation the heads see.
    pub fn trunk_dim(&self) -> usize {
        let per_step = if self.dense_layers > 0 {
            self.dense_hidden
        } else {
            match self.architecture {
                Architecture::Lstm  => self.lstm_hidden,
                Architecture::Dense => self.input_dim,
            }
        };
        match self.architecture {
            Architecture::Lstm  => per_step,
            Architecture::Dense => per_step * self.steps,
        }
    }
}

#[derive(Module, Debug)]
pub struct MultitaskModel<B: Backend> {
    pub input_dropout:  Dropout,
    pub lstm:           Option<Lstm<B>>,
    pub dense:          Vec<Linear<B>>,
    pub valence_head:   Linear<B>,
    pub polarity_head:  Linear<B>,
    pub intensity_head: Linear<B>,
    pub valence_scale:  f64,
}

pub struct MultitaskOutput<B: Backend> {
    /// [batch, 1] scaled tanh regression
    pub valence:          Tensor<B, 2>,
    /// [batch, 1] raw logit of "positive"
    pub polarity_logits:  Tensor<B, 2>,
    /// [batch, 4] raw class logits
    pub intensity_logits: Tensor<B, 2>,
}

impl<B: Backend> MultitaskOutput<B> {
    pub fn polarity_probs(&self) -> Tensor<B, 2> {
        activation::sigmoid(self.polarity_logits.clone())
    }

    pub fn intensity_probs(&self) -> Tensor<B, 2> {
        activation::softmax(self.intensity_logits.clone(), 1)
    }
}

/// Per-task weights of the joint objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossWeights {
    pub valence:    f64,
    pub polarity:   f64,
    pub intensity:  f64,
    /// L2 penalty on the valence head's weight matrix
    pub valence_l2: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self { valence: 1.0, polarity: 0.5, intensity: 0.5, valence_l2: 0.01 }
    }
}

pub struct MultitaskLoss<B: Backend> {
    pub total:     Tensor<B, 1>,
    pub valence:   Tensor<B, 1>,
    pub polarity:  Tensor<B, 1>,
    pub intensity: Tensor<B, 1>,
}

impl<B: Backend> MultitaskModel<B> {
    /// features: [batch, steps, dim]
    pub fn forward(&self, features: Tensor<B, 3>) -> MultitaskOutput<B> {
        let x = self.input_dropout.forward(features);

        let trunk: Tensor<B, 2> = match &self.lstm {
            Some(lstm) => {
                let (_, state) = lstm.forward(x, None);
                let mut h = state.hidden; // [batch, lstm_hidden]
                for layer in &self.dense {
                    h = activation::relu(layer.forward(h));
                }
                h
            }
            None => {
                let mut h = x;
                for layer in &self.dense {
                    h = activation::relu(layer.forward(h));
                }
                h.flatten::<2>(1, 2)
            }
        };

        let valence = self
            .valence_head
            .forward(trunk.clone())
            .tanh()
            .mul_scalar(self.valence_scale);
        let polarity_logits  = self.polarity_head.forward(trunk.clone());
        let intensity_logits = self.intensity_head.forward(trunk);

        MultitaskOutput { valence, polarity_logits, intensity_logits }
    }

    /// Weighted sum of MAE, binary cross-entropy and categorical
    /// cross-entropy, plus the valence-head L2 term.
    pub fn loss(
        &self,
        output:  &MultitaskOutput<B>,
        batch:   &SentimentBatch<B>,
        weights: &LossWeights,
    ) -> MultitaskLoss<B> {
        let valence = (output.valence.clone() - batch.valence.clone()).abs().mean();

        let polarity = binary_cross_entropy_with_logits(
            output.polarity_logits.clone(),
            batch.polarity.clone(),
        );

        let ce = CrossEntropyLossConfig::new().init(&output.intensity_logits.device());
        let intensity = ce.forward(output.intensity_logits.clone(), batch.intensity.clone());

        let l2 = self.valence_head.weight.val().powf_scalar(2.0).sum();

        let total = valence.clone().mul_scalar(weights.valence)
            + polarity.clone().mul_scalar(weights.polarity)
            + intensity.clone().mul_scalar(weights.intensity)
            + l2.mul_scalar(weights.valence_l2);

        MultitaskLoss { total, valence, polarity, intensity }
    }

    pub fn forward_loss(
        &self,
        batch:   &SentimentBatch<B>,
        weights: &LossWeights,
    ) -> (MultitaskLoss<B>, MultitaskOutput<B>)
    where
        B: AutodiffBackend,
    {
        let output = self.forward(batch.features.clone());
        let loss   = self.loss(&output, batch, weights);
        (loss, output)
    }
}

/// Mean of `-(y·log σ(x) + (1-y)·log σ(-x))`, stable for large |x|.
fn binary_cross_entropy_with_logits<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let log_p     = activation::log_sigmoid(logits.clone());
    let log_not_p = activation::log_sigmoid(logits.neg());
    let not_y     = targets.clone().neg().add_scalar(1.0);
    (targets * log_p + not_y * log_not_p).mean().neg()
}
