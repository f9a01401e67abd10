use {
    crate::{
        components::fan_in_uniform,
        configs::DdpgConfig,
    },
    candle_core::{
        DType,
        Device,
        Module,
        Result,
        Tensor,
        Var,
    },
    candle_nn::{
        Init,
        Linear,
        VarBuilder,
        VarMap,
    },
};


fn linear(
    in_dim: usize,
    out_dim: usize,
    weight_init: Init,
    vb: VarBuilder,
) -> Result<Linear> {
    let weight = vb.get_with_hints((out_dim, in_dim), "weight", weight_init)?;
    let bias = vb.get_with_hints(out_dim, "bias", fan_in_uniform(in_dim))?;
    Ok(Linear::new(weight, Some(bias)))
}

/// The value network.
///
/// State and action go through separate `linear -> relu` towers whose
/// outputs are concatenated and fed through `linear -> relu -> linear(1)`.
pub struct Critic {
    varmap: VarMap,
    fc_state: Linear,
    fc_action: Linear,
    fc_joint: Linear,
    fc_out: Linear,
}

impl Critic {
    pub fn new(
        config: &DdpgConfig,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, device);
        let tower = config.critic_hidden_size;
        let joint = 2 * tower;

        let fc_state = linear(
            config.observation_size,
            tower,
            fan_in_uniform(config.observation_size),
            vb.pp("fc_state"),
        )?;
        let fc_action = linear(
            config.action_size,
            tower,
            fan_in_uniform(config.action_size),
            vb.pp("fc_action"),
        )?;
        let fc_joint = linear(joint, joint, fan_in_uniform(joint), vb.pp("fc_joint"))?;
        let fc_out = linear(
            joint,
            1,
            Init::Uniform {
                lo: -config.output_init,
                up: config.output_init,
            },
            vb.pp("fc_out"),
        )?;

        Ok(Self {
            varmap,
            fc_state,
            fc_action,
            fc_joint,
            fc_out,
        })
    }

    /// Q-values of shape `(B, 1)` for `(B, D)` states and `(B, A)` actions.
    pub fn forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<Tensor> {
        let xs = self.fc_state.forward(state)?.relu()?;
        let xa = self.fc_action.forward(action)?.relu()?;
        let xs = Tensor::cat(&[xs, xa], 1)?;
        let xs = self.fc_joint.forward(&xs)?.relu()?;
        self.fc_out.forward(&xs)
    }

    /// Q-value of shape `(1,)` for a single state and action.
    pub fn forward_item(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<Tensor> {
        self.forward(
            &state.detach().unsqueeze(0)?,
            &action.detach().unsqueeze(0)?,
        )?.squeeze(0)
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn varmap_mut(&mut self) -> &mut VarMap {
        &mut self.varmap
    }

    pub fn trainable_vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DdpgConfig {
        DdpgConfig {
            critic_hidden_size: 16,
            ..DdpgConfig::with_sizes(4, 2)
        }
    }

    #[test]
    fn one_value_per_batch_row() {
        let critic = Critic::new(&config(), &Device::Cpu).unwrap();
        let states = Tensor::randn(0.0f64, 1.0, (7, 4), &Device::Cpu).unwrap();
        let actions = Tensor::randn(0.0f64, 1.0, (7, 2), &Device::Cpu).unwrap();

        let q = critic.forward(&states, &actions).unwrap();
        assert_eq!(q.dims(), &[7, 1]);
        assert_eq!(q.squeeze(1).unwrap().dims(), &[7]);
    }

    #[test]
    fn single_item_is_a_single_value() {
        let critic = Critic::new(&config(), &Device::Cpu).unwrap();
        let state = Tensor::zeros(4, DType::F64, &Device::Cpu).unwrap();
        let action = Tensor::zeros(2, DType::F64, &Device::Cpu).unwrap();
        assert_eq!(critic.forward_item(&state, &action).unwrap().dims(), &[1]);
    }

    #[test]
    fn critic_is_deterministic() {
        let critic = Critic::new(&config(), &Device::Cpu).unwrap();
        let states = Tensor::randn(0.0f64, 1.0, (3, 4), &Device::Cpu).unwrap();
        let actions = Tensor::randn(0.0f64, 1.0, (3, 2), &Device::Cpu).unwrap();

        let first = critic.forward(&states, &actions).unwrap().to_vec2::<f64>().unwrap();
        let second = critic.forward(&states, &actions).unwrap().to_vec2::<f64>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn output_layer_starts_small() {
        let config = config();
        let critic = Critic::new(&config, &Device::Cpu).unwrap();
        let w = critic.fc_out.weight().flatten_all().unwrap().to_vec1::<f64>().unwrap();
        assert!(w.iter().all(|v| v.abs() <= config.output_init));
        assert_eq!(critic.trainable_vars().len(), 8);
    }
}
