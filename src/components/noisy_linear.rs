use {
    candle_core::{
        Module,
        Result,
        Tensor,
    },
    candle_nn::{
        Init,
        VarBuilder,
    },
};


/// Uniform initializer bounded by `1 / sqrt(fan_in)`.
pub fn fan_in_uniform(fan_in: usize) -> Init {
    let bound = 1.0 / (fan_in as f64).sqrt();
    Init::Uniform {
        lo: -bound,
        up: bound,
    }
}

/// A linear layer whose weights and bias are perturbed by learned-magnitude
/// gaussian noise.
///
/// The effective transform is
///
/// ```text
/// y = (W + σ_W ⊙ ε_W) x + (b + σ_b ⊙ ε_b)
/// ```
///
/// where `W`, `b`, `σ_W` and `σ_b` are trainable and `ε_W`, `ε_b` are drawn
/// from a standard normal distribution anew on every call to
/// [`Module::forward`]. The noise tensors are not variables, so no gradient
/// flows into them.
#[derive(Clone, Debug)]
pub struct NoisyLinear {
    weight: Tensor,
    bias: Tensor,
    sigma_weight: Tensor,
    sigma_bias: Tensor,
}

impl NoisyLinear {
    /// Create the layer's variables under `vb`.
    ///
    /// The bias is drawn from `U(-sqrt(3 / in), sqrt(3 / in))`, the noise
    /// scales start at `sigma_init` and the weights use `weight_init`.
    pub fn new(
        in_features: usize,
        out_features: usize,
        sigma_init: f64,
        weight_init: Init,
        vb: VarBuilder,
    ) -> Result<Self> {
        let bias_bound = (3.0 / in_features as f64).sqrt();

        let weight = vb.get_with_hints((out_features, in_features), "weight", weight_init)?;
        let bias = vb.get_with_hints(
            out_features,
            "bias",
            Init::Uniform {
                lo: -bias_bound,
                up: bias_bound,
            },
        )?;
        let sigma_weight = vb.get_with_hints(
            (out_features, in_features),
            "sigma_weight",
            Init::Const(sigma_init),
        )?;
        let sigma_bias = vb.get_with_hints(out_features, "sigma_bias", Init::Const(sigma_init))?;

        Ok(Self {
            weight,
            bias,
            sigma_weight,
            sigma_bias,
        })
    }

    pub fn in_features(&self) -> usize {
        self.weight.dims()[1]
    }

    pub fn out_features(&self) -> usize {
        self.weight.dims()[0]
    }

    /// Draw a fresh `(ε_W, ε_b)` pair shaped like the weight and bias.
    pub fn sample_noise(&self) -> Result<(Tensor, Tensor)> {
        Ok((
            self.weight.randn_like(0.0, 1.0)?,
            self.bias.randn_like(0.0, 1.0)?,
        ))
    }

    /// The layer with a given noise sample, for a `(batch, in)` input.
    pub fn forward_with_noise(
        &self,
        xs: &Tensor,
        epsilon_weight: &Tensor,
        epsilon_bias: &Tensor,
    ) -> Result<Tensor> {
        let weight = (&self.weight + (&self.sigma_weight * epsilon_weight)?)?;
        let bias = (&self.bias + (&self.sigma_bias * epsilon_bias)?)?;
        xs.matmul(&weight.t()?)?.broadcast_add(&bias)
    }
}

impl Module for NoisyLinear {
    fn forward(
        &self,
        xs: &Tensor,
    ) -> Result<Tensor> {
        let (epsilon_weight, epsilon_bias) = self.sample_noise()?;
        self.forward_with_noise(xs, &epsilon_weight, &epsilon_bias)
    }
}
