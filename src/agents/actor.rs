use {
    crate::{
        components::{
            fan_in_uniform,
            NoisyLinear,
        },
        configs::DdpgConfig,
    },
    candle_core::{
        DType,
        Device,
        Error,
        Module,
        Result,
        Tensor,
        Var,
    },
    candle_nn::{
        ops::sigmoid,
        Init,
        VarBuilder,
        VarMap,
    },
};


/// The policy network.
///
/// `state -> noisy(hidden) -> relu -> noisy(hidden) -> relu -> noisy(2)`,
/// followed by `sigmoid * v_max` on the linear velocity and `tanh * w_max`
/// on the angular velocity.
pub struct Actor {
    varmap: VarMap,
    fc0: NoisyLinear,
    fc1: NoisyLinear,
    fc2: NoisyLinear,
    size_state: usize,
    max_linear_velocity: f64,
    max_angular_velocity: f64,
}

impl Actor {
    pub fn new(
        config: &DdpgConfig,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, device);
        let hidden = config.actor_hidden_size;

        let fc0 = NoisyLinear::new(
            config.observation_size,
            hidden,
            config.sigma_init,
            fan_in_uniform(config.observation_size),
            vb.pp("fc0"),
        )?;
        let fc1 = NoisyLinear::new(
            hidden,
            hidden,
            config.sigma_init,
            fan_in_uniform(hidden),
            vb.pp("fc1"),
        )?;
        let fc2 = NoisyLinear::new(
            hidden,
            config.action_size,
            config.sigma_init,
            Init::Uniform {
                lo: -config.output_init,
                up: config.output_init,
            },
            vb.pp("fc2"),
        )?;

        Ok(Self {
            varmap,
            fc0,
            fc1,
            fc2,
            size_state: config.observation_size,
            max_linear_velocity: config.max_linear_velocity,
            max_angular_velocity: config.max_angular_velocity,
        })
    }

    /// Bounded actions for a single `(D,)` state or a `(B, D)` batch.
    ///
    /// The output has shape `(2,)` or `(B, 2)` respectively.
    pub fn forward(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        if state.dims().last() != Some(&self.size_state) {
            return Err(Error::Msg(format!(
                "actor expects states of size {}, got shape {:?}",
                self.size_state,
                state.dims(),
            )));
        }
        match state.rank() {
            // Candle assumes a batch dimension, so when we don't have one we need
            // to pretend we do by un- and resqueezing the state tensor.
            1 => self.forward_batch(&state.unsqueeze(0)?)?.squeeze(0),
            2 => self.forward_batch(state),
            _ => Err(Error::Msg(format!("actor expects rank 1 or 2 states, got {:?}", state.dims()))),
        }
    }

    fn forward_batch(
        &self,
        xs: &Tensor,
    ) -> Result<Tensor> {
        let xs = self.fc0.forward(xs)?.relu()?;
        let xs = self.fc1.forward(&xs)?.relu()?;
        let raw = self.fc2.forward(&xs)?;

        let linear = (sigmoid(&raw.narrow(1, 0, 1)?)? * self.max_linear_velocity)?;
        let angular = (raw.narrow(1, 1, 1)?.tanh()? * self.max_angular_velocity)?;
        Tensor::cat(&[linear, angular], 1)
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn varmap_mut(&mut self) -> &mut VarMap {
        &mut self.varmap
    }

    /// Every weight, bias and noise scale of the three layers.
    pub fn trainable_vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }
}
