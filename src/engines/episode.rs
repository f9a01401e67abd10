use {
    super::{
        CheckpointStore,
        MetricSink,
    },
    crate::{
        agents::DDPG,
        components::{
            OuNoise,
            ReplayBuffer,
        },
        configs::{
            ensure,
            TrainConfig,
        },
        envs::Environment,
        error::{
            DdpgError,
            Result,
        },
        RunMode,
    },
    candle_core::Tensor,
    rand::rngs::StdRng,
    strum::Display,
    tracing::{
        info,
        warn,
    },
};


/// What an episode is used for.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Collect transitions until the buffer holds enough to train on.
    WarmUp,
    /// Collect transitions and take one optimizer step per environment step.
    Train,
    /// Only measure the current policy.
    Evaluate,
}
impl Phase {
    pub fn select(
        episode: usize,
        buffer_len: usize,
        config: &TrainConfig,
    ) -> Self {
        match config.run_mode {
            RunMode::Test => Phase::Evaluate,
            RunMode::Train if buffer_len < config.warmup_transitions => Phase::WarmUp,
            RunMode::Train if episode % config.eval_interval == 0 => Phase::Evaluate,
            RunMode::Train => Phase::Train,
        }
    }

    pub fn stores(&self) -> bool {
        matches!(self, Phase::WarmUp | Phase::Train)
    }

    pub fn trains(&self) -> bool {
        matches!(self, Phase::Train)
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub phase: Phase,
    pub total_reward: f64,
    // Number of environment steps taken.
    pub steps: usize,
    // Replay buffer length after the episode.
    pub buffer_len: usize,
}


/// Drives the environment, the replay buffer and the trainer.
pub struct EpisodeController<M: MetricSink, S: CheckpointStore> {
    config: TrainConfig,
    trainer: DDPG<M>,
    buffer: ReplayBuffer,
    store: S,
    rng: StdRng,
    ou_noise: Option<OuNoise>,
    previous_action: Vec<f64>,
}

impl<M: MetricSink, S: CheckpointStore> EpisodeController<M, S> {
    pub fn new(
        config: TrainConfig,
        trainer: DDPG<M>,
        buffer: ReplayBuffer,
        store: S,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate(trainer.config())?;
        ensure(
            buffer.capacity() >= config.warmup_transitions,
            || format!(
                "a buffer of capacity {} never reaches {} warm-up transitions",
                buffer.capacity(),
                config.warmup_transitions,
            ),
        )?;

        let action_size = trainer.config().action_size;
        let ou_noise = config
            .ou_noise
            .as_ref()
            .map(|ou| OuNoise::new(ou, action_size, trainer.device()))
            .transpose()?;

        Ok(Self {
            config,
            trainer,
            buffer,
            store,
            rng,
            ou_noise,
            previous_action: vec![0.0; action_size],
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn trainer(&self) -> &DDPG<M> {
        &self.trainer
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn previous_action(&self) -> &[f64] {
        &self.previous_action
    }

    pub fn into_parts(self) -> (DDPG<M>, ReplayBuffer, S) {
        (self.trainer, self.buffer, self.store)
    }

    /// Load the configured checkpoint, if any, and return the first episode
    /// index to run.
    pub fn resume(&mut self) -> Result<usize> {
        match self.config.resume_episode {
            Some(episode) => {
                self.trainer.load_models(&self.store, &self.config.world, episode)?;
                warn!("Resuming after episode {episode}");
                Ok(episode + 1)
            }
            None => Ok(0),
        }
    }

    /// Run every remaining episode, checkpointing along the way.
    pub fn run<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
    ) -> Result<Vec<EpisodeSummary>> {
        ensure(
            env.observation_size() == self.trainer.config().observation_size
                && env.action_size() == self.trainer.config().action_size,
            || format!(
                "environment with {} observation and {} action dims does not fit the networks",
                env.observation_size(),
                env.action_size(),
            ),
        )?;

        let first = self.resume()?;
        let mut summaries = Vec::with_capacity(self.config.max_episodes.saturating_sub(first));

        for episode in first..self.config.max_episodes {
            summaries.push(self.run_episode(env, episode)?);

            if self.config.run_mode == RunMode::Train && episode % self.config.checkpoint_interval == 0 {
                self.trainer.save_models(&self.store, &self.config.world, episode)?;
                self.trainer.metrics_mut().flush()?;
            }
        }
        self.trainer.metrics_mut().flush()?;
        warn!("Completed {} episodes", summaries.len());
        Ok(summaries)
    }

    /// Run a single episode of at most `max_steps` environment steps.
    pub fn run_episode<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        episode: usize,
    ) -> Result<EpisodeSummary> {
        let phase = Phase::select(episode, self.buffer.len(), &self.config);
        warn!("Episode {episode}: {phase} ({} transitions in memory)", self.buffer.len());

        let mut state = self.to_state(env.reset()?)?;
        if let Some(ou) = &mut self.ou_noise {
            ou.reset()?;
        }

        let mut total_reward = 0.0;
        let mut last_step = 0;
        for step in 0..self.config.max_steps {
            let action = self.select_action(&state, phase, step)?;
            let outcome = env.step(&action, &self.previous_action)?;
            if !outcome.reward.is_finite() {
                return Err(DdpgError::Environment(format!(
                    "non-finite reward {} at step {step}",
                    outcome.reward,
                )));
            }
            let next_state = self.to_state(outcome.observation)?;
            let action_tensor = Tensor::new(action.as_slice(), self.trainer.device())?;
            self.previous_action = action;
            total_reward += outcome.reward;

            if phase.stores() {
                let repeats = if outcome.reward == self.config.max_reward {
                    warn!("Maximum reward reached at step {step}");
                    self.config.max_reward_repeats
                } else {
                    1
                };
                for _ in 0..repeats {
                    self.buffer.push(&state, &action_tensor, outcome.reward, &next_state)?;
                }
            }
            state = next_state;

            if phase.trains() {
                self.trainer.optimize(&self.buffer, &mut self.rng)?;
            }

            last_step = step;
            if outcome.done || step == self.config.max_steps - 1 {
                break;
            }
        }

        warn!("Episode {episode} ended after step {last_step} with reward {total_reward}");
        let memory = self.buffer.len();
        let metrics = self.trainer.metrics_mut();
        metrics.add_scalar("test_reward", total_reward, episode);
        metrics.add_scalar("memory", memory as f64, episode);
        metrics.add_scalar("step", last_step as f64, episode);
        if phase == Phase::Evaluate {
            metrics.add_scalar("result", total_reward, episode);
        }

        Ok(EpisodeSummary {
            episode,
            phase,
            total_reward,
            steps: last_step + 1,
            buffer_len: memory,
        })
    }

    /// The actor's action, plus clipped OU noise while training if configured.
    fn select_action(
        &mut self,
        state: &Tensor,
        phase: Phase,
        step: usize,
    ) -> Result<Vec<f64>> {
        let mut action = self.trainer.action(state)?.to_vec1::<f64>()?;
        if let (Phase::Train, Some(ou)) = (phase, &mut self.ou_noise) {
            let noise = ou.sample(step)?.to_vec1::<f64>()?;
            let v_max = self.trainer.config().max_linear_velocity;
            let w_max = self.trainer.config().max_angular_velocity;
            action[0] = (action[0] + noise[0] * v_max / 2.0).clamp(0.0, v_max);
            action[1] = (action[1] + noise[1] * w_max).clamp(-w_max, w_max);
        }
        info!("action {action:?}");
        Ok(action)
    }

    fn to_state(
        &self,
        observation: Vec<f64>,
    ) -> Result<Tensor> {
        let expected = self.trainer.config().observation_size;
        if observation.len() != expected {
            return Err(DdpgError::Environment(format!(
                "observation has {} values, expected {expected}",
                observation.len(),
            )));
        }
        if observation.iter().any(|v| !v.is_finite()) {
            return Err(DdpgError::Environment(format!(
                "observation contains non-finite values: {observation:?}",
            )));
        }
        Ok(Tensor::new(observation, self.trainer.device())?)
    }
}
