use {
    super::{
        loss::smooth_l1_loss,
        Actor,
        Critic,
    },
    crate::{
        components::{
            hard_update,
            soft_update,
            Batch,
            ReplayBuffer,
        },
        configs::DdpgConfig,
        engines::{
            CheckpointStore,
            MetricSink,
        },
        error::{
            DdpgError,
            Result,
        },
    },
    candle_core::{
        Device,
        Tensor,
    },
    candle_nn::{
        AdamW,
        Optimizer,
        ParamsAdamW,
    },
    rand::Rng,
    tracing::{
        debug,
        warn,
    },
};


/// What one optimizer step measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepStats {
    pub critic_loss: f64,
    pub actor_loss: f64,
    pub max_q: f64,
    pub mean_target: f64,
}

fn adam(
    vars: Vec<candle_core::Var>,
    lr: f64,
) -> candle_core::Result<AdamW> {
    // AdamW without weight decay is plain Adam
    AdamW::new(
        vars,
        ParamsAdamW {
            lr,
            weight_decay: 0.0,
            ..Default::default()
        },
    )
}

/// The trainer: live and target actor/critic pairs plus their optimizers.
///
/// Target networks are only ever written by [`hard_update`] and
/// [`soft_update`], never by an optimizer.
#[allow(clippy::upper_case_acronyms)]
pub struct DDPG<M: MetricSink> {
    actor: Actor,
    target_actor: Actor,
    actor_optim: AdamW,
    critic: Critic,
    target_critic: Critic,
    critic_optim: AdamW,
    config: DdpgConfig,
    device: Device,
    metrics: M,
    train_steps: usize,
}

impl<M: MetricSink> DDPG<M> {
    pub fn new(
        config: DdpgConfig,
        metrics: M,
        device: &Device,
    ) -> Result<Self> {
        config.validate()?;

        let actor = Actor::new(&config, device)?;
        let target_actor = Actor::new(&config, device)?;
        let critic = Critic::new(&config, device)?;
        let target_critic = Critic::new(&config, device)?;

        hard_update(target_actor.varmap(), actor.varmap())?;
        hard_update(target_critic.varmap(), critic.varmap())?;

        let actor_optim = adam(actor.trainable_vars(), config.actor_learning_rate)?;
        let critic_optim = adam(critic.trainable_vars(), config.critic_learning_rate)?;

        warn!(
            "DDPG with {} state dims, {} action dims, v_max {} m/s, w_max {} rad/s",
            config.observation_size,
            config.action_size,
            config.max_linear_velocity,
            config.max_angular_velocity,
        );

        Ok(Self {
            actor,
            target_actor,
            actor_optim,
            critic,
            target_critic,
            critic_optim,
            config,
            device: device.clone(),
            metrics,
            train_steps: 0,
        })
    }

    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn critic(&self) -> &Critic {
        &self.critic
    }

    pub fn target_actor(&self) -> &Actor {
        &self.target_actor
    }

    pub fn target_critic(&self) -> &Critic {
        &self.target_critic
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut M {
        &mut self.metrics
    }

    pub fn into_metrics(self) -> M {
        self.metrics
    }

    /// Number of optimizer steps taken so far.
    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    /// The live actor's (noisy) action for one state, detached from the graph.
    pub fn action(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        Ok(self.actor.forward(&state.detach())?.detach())
    }

    /// One gradient step on the critic and the actor from a sampled batch,
    /// followed by soft updates of both target networks.
    ///
    /// The buffer must hold at least one full batch.
    pub fn optimize<R: Rng + ?Sized>(
        &mut self,
        buffer: &ReplayBuffer,
        rng: &mut R,
    ) -> Result<StepStats> {
        let batch_size = self.config.training_batch_size;
        let underflow = || DdpgError::Underflow {
            needed: batch_size,
            available: buffer.len(),
        };
        if buffer.len() < batch_size {
            return Err(underflow());
        }
        let batch = buffer.sample(batch_size, rng)?.ok_or_else(underflow)?;

        let (critic_loss, max_q, mean_target) = self.update_critic(&batch)?;
        let actor_loss = self.update_actor(&batch)?;

        soft_update(self.target_actor.varmap(), self.actor.varmap(), self.config.tau)?;
        soft_update(self.target_critic.varmap(), self.critic.varmap(), self.config.tau)?;

        let stats = StepStats {
            critic_loss,
            actor_loss,
            max_q,
            mean_target,
        };
        debug!(step = self.train_steps, ?stats, "optimizer step");

        let step = self.train_steps;
        self.metrics.add_scalar("max_q", stats.max_q, step);
        self.metrics.add_scalar("loss_critic", stats.critic_loss, step);
        self.metrics.add_scalar("critic_ref", stats.mean_target, step);
        self.metrics.add_scalar("loss_actor", stats.actor_loss, step);
        self.train_steps += 1;

        Ok(stats)
    }

    /// One critic step towards `y = r + gamma * Q'(s', mu'(s'))`.
    ///
    /// Returns the loss, the largest predicted Q and the mean target.
    fn update_critic(
        &mut self,
        batch: &Batch,
    ) -> Result<(f64, f64, f64)> {
        let next_actions = self.target_actor.forward(&batch.next_states)?.detach();
        let next_q = self
            .target_critic
            .forward(&batch.next_states, &next_actions)?
            .detach()
            .squeeze(1)?;
        let y_expected = (&batch.rewards + (self.config.gamma * next_q)?)?;
        let y_predicted = self.critic.forward(&batch.states, &batch.actions)?.squeeze(1)?;

        let max_q = y_predicted.max(0)?.to_scalar::<f64>()?;
        let mean_target = y_expected.mean_all()?.to_scalar::<f64>()?;

        let critic_loss = smooth_l1_loss(&y_predicted, &y_expected)?;
        self.critic_optim.backward_step(&critic_loss)?;
        Ok((critic_loss.to_scalar::<f64>()?, max_q, mean_target))
    }

    /// One actor step on `-sum Q(s, mu(s))`.
    ///
    /// Gradients flow through the critic, but only actor variables are stepped.
    fn update_actor(
        &mut self,
        batch: &Batch,
    ) -> Result<f64> {
        let predicted_actions = self.actor.forward(&batch.states)?;
        let actor_loss = self
            .critic
            .forward(&batch.states, &predicted_actions)?
            .sum_all()?
            .neg()?;
        self.actor_optim.backward_step(&actor_loss)?;
        Ok(actor_loss.to_scalar::<f64>()?)
    }

    /// Persist the target networks under `(world, episode)`.
    pub fn save_models<S: CheckpointStore + ?Sized>(
        &self,
        store: &S,
        world: &str,
        episode: usize,
    ) -> Result<()> {
        store.save(
            world,
            episode,
            self.target_actor.varmap(),
            self.target_critic.varmap(),
        )
    }

    /// Load the live networks from `(world, episode)` and hard-sync the targets.
    pub fn load_models<S: CheckpointStore + ?Sized>(
        &mut self,
        store: &S,
        world: &str,
        episode: usize,
    ) -> Result<()> {
        store.load(
            world,
            episode,
            self.actor.varmap_mut(),
            self.critic.varmap_mut(),
        )?;
        hard_update(self.target_actor.varmap(), self.actor.varmap())?;
        hard_update(self.target_critic.varmap(), self.critic.varmap())?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            components::named_vars,
            engines::RecordingSink,
        },
        rand::{
            rngs::StdRng,
            SeedableRng,
        },
    };

    fn small_config() -> DdpgConfig {
        DdpgConfig {
            actor_hidden_size: 16,
            critic_hidden_size: 8,
            training_batch_size: 8,
            replay_buffer_capacity: 64,
            ..DdpgConfig::with_sizes(4, 2)
        }
    }

    fn filled_buffer(
        config: &DdpgConfig,
        n: usize,
    ) -> ReplayBuffer {
        let mut buffer = ReplayBuffer::new(config.replay_buffer_capacity).unwrap();
        for i in 0..n {
            let state = Tensor::full(i as f64 * 0.1, 4, &Device::Cpu).unwrap();
            let action = Tensor::new(&[0.1f64, 0.0], &Device::Cpu).unwrap();
            let next_state = Tensor::full((i + 1) as f64 * 0.1, 4, &Device::Cpu).unwrap();
            buffer.push(&state, &action, i as f64, &next_state).unwrap();
        }
        buffer
    }

    fn flat(varmap: &candle_nn::VarMap) -> Vec<f64> {
        named_vars(varmap)
            .unwrap()
            .into_iter()
            .flat_map(|(_, v)| v.as_tensor().flatten_all().unwrap().to_vec1::<f64>().unwrap())
            .collect()
    }

    #[test]
    fn targets_start_equal_to_live_networks() {
        let ddpg = DDPG::new(small_config(), RecordingSink::new(), &Device::Cpu).unwrap();
        assert_eq!(flat(ddpg.actor().varmap()), flat(ddpg.target_actor().varmap()));
        assert_eq!(flat(ddpg.critic().varmap()), flat(ddpg.target_critic().varmap()));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = DdpgConfig {
            training_batch_size: 0,
            ..small_config()
        };
        assert!(matches!(
            DDPG::new(config, RecordingSink::new(), &Device::Cpu),
            Err(DdpgError::Config(_)),
        ));
    }

    #[test]
    fn optimizing_before_a_full_batch_underflows() {
        let config = small_config();
        let buffer = filled_buffer(&config, 5);
        let mut ddpg = DDPG::new(config, RecordingSink::new(), &Device::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let result = ddpg.optimize(&buffer, &mut rng);
        assert!(matches!(result, Err(DdpgError::Underflow { needed: 8, available: 5 })));
        assert_eq!(ddpg.train_steps(), 0);
    }

    #[test]
    fn optimizer_step_emits_every_metric() {
        let config = small_config();
        let buffer = filled_buffer(&config, 16);
        let mut ddpg = DDPG::new(config, RecordingSink::new(), &Device::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let stats = ddpg.optimize(&buffer, &mut rng).unwrap();
        ddpg.optimize(&buffer, &mut rng).unwrap();
        assert_eq!(ddpg.train_steps(), 2);

        let metrics = ddpg.metrics();
        for name in ["max_q", "loss_critic", "critic_ref", "loss_actor"] {
            assert_eq!(metrics.series(name).len(), 2, "{name}");
        }
        assert_eq!(metrics.series("loss_actor")[0], (0, stats.actor_loss));
        assert!(stats.critic_loss.is_finite() && stats.critic_loss >= 0.0);
    }

    #[test]
    fn actor_update_leaves_the_critic_alone() {
        let config = small_config();
        let buffer = filled_buffer(&config, 16);
        let mut ddpg = DDPG::new(config, RecordingSink::new(), &Device::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let batch = buffer.sample(8, &mut rng).unwrap().unwrap();

        let critic_before = flat(ddpg.critic().varmap());
        let actor_before = flat(ddpg.actor().varmap());
        ddpg.update_actor(&batch).unwrap();

        assert_eq!(flat(ddpg.critic().varmap()), critic_before);
        assert_ne!(flat(ddpg.actor().varmap()), actor_before);
    }

    #[test]
    fn critic_update_leaves_the_actor_alone() {
        let config = small_config();
        let buffer = filled_buffer(&config, 16);
        let mut ddpg = DDPG::new(config, RecordingSink::new(), &Device::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let batch = buffer.sample(8, &mut rng).unwrap().unwrap();

        let critic_before = flat(ddpg.critic().varmap());
        let actor_before = flat(ddpg.actor().varmap());
        ddpg.update_critic(&batch).unwrap();

        assert_ne!(flat(ddpg.critic().varmap()), critic_before);
        assert_eq!(flat(ddpg.actor().varmap()), actor_before);
        assert_eq!(flat(ddpg.target_critic().varmap()), critic_before);
    }

    #[test]
    fn action_is_detached_and_bounded() {
        let config = small_config();
        let ddpg = DDPG::new(config.clone(), RecordingSink::new(), &Device::Cpu).unwrap();
        let state = Tensor::ones(4, candle_core::DType::F64, &Device::Cpu).unwrap();

        let action = ddpg.action(&state).unwrap().to_vec1::<f64>().unwrap();
        assert!((0.0..=config.max_linear_velocity).contains(&action[0]));
        assert!(action[1].abs() <= config.max_angular_velocity);
    }
}
