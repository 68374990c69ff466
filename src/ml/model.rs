use burn::{
    nn::{
        loss::{MseLoss, Reduction},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SequenceRegressorConfig {
    pub input_dim:  usize,
    pub hidden_dim: usize,
    pub num_layers: usize,
    #[config(default = 0.5)]
    pub dropout:    f64,
}

impl SequenceRegressorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceRegressor<B> {
        let mut layers = Vec::with_capacity(self.num_layers);

        // First layer consumes the feature columns
        layers.push(LstmConfig::new(self.input_dim, self.hidden_dim, true).init(device));

        // Subsequent layers consume the previous layer's hidden sequence
        for _ in 1..self.num_layers {
            layers.push(LstmConfig::new(self.hidden_dim, self.hidden_dim, true).init(device));
        }

        SequenceRegressor {
            layers,
            dropout:    DropoutConfig::new(self.dropout).init(),
            head:       LinearConfig::new(self.hidden_dim, 1).init(device),
            hidden_dim: self.hidden_dim,
        }
    }
}

/// Stacked-LSTM scalar regressor: a window of sensor cycles in,
/// one RUL estimate out. Dropout sits between recurrent layers
/// (not after the last), matching the usual stacked-LSTM recipe.
#[derive(Module, Debug)]
pub struct SequenceRegressor<B: Backend> {
    pub layers:     Vec<Lstm<B>>,
    pub dropout:    Dropout,
    pub head:       Linear<B>,
    pub hidden_dim: usize,
}

impl<B: Backend> SequenceRegressor<B> {
    /// sequences: [batch, seq_len, features] → predictions: [batch]
    pub fn forward(&self, sequences: Tensor<B, 3>) -> Tensor<B, 1> {
        let [batch_size, seq_len, _] = sequences.dims();

        let mut x = sequences;
        let last = self.layers.len() - 1;
        for (i, lstm) in self.layers.iter().enumerate() {
            // Hidden/cell states start at zero for every window
            let (out, _state) = lstm.forward(x, None);
            x = if i < last { self.dropout.forward(out) } else { out };
        }

        // Regress from the hidden state of the final time step only
        let final_step = x
            .slice([0..batch_size, seq_len - 1..seq_len, 0..self.hidden_dim])
            .reshape([batch_size, self.hidden_dim]);

        self.head.forward(final_step).reshape([batch_size])
    }

    /// Forward pass plus MSE loss against the RUL targets.
    /// Returns (loss, predictions) so the caller can reuse the
    /// predictions for metric accumulation.
    pub fn forward_loss(
        &self,
        sequences: Tensor<B, 3>,
        targets:   Tensor<B, 1>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let predictions = self.forward(sequences);
        let loss = MseLoss::new().forward(predictions.clone(), targets, Reduction::Mean);
        (loss, predictions)
    }
}
