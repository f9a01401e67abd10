use {
    candle_core::Device,
    candle_nn::VarMap,
    noisy_ddpg::{
        agents::DDPG,
        components::{
            named_vars,
            ReplayBuffer,
        },
        configs::{
            DdpgConfig,
            TrainConfig,
        },
        engines::{
            EpisodeController,
            FileCheckpointStore,
            Phase,
            RecordingSink,
        },
        envs::{
            DiffDriveConfig,
            DiffDriveEnv,
        },
        error::DdpgError,
    },
    rand::{
        rngs::StdRng,
        SeedableRng,
    },
    tempdir::TempDir,
};


fn alg_config() -> DdpgConfig {
    DdpgConfig {
        actor_hidden_size: 16,
        critic_hidden_size: 8,
        training_batch_size: 8,
        replay_buffer_capacity: 256,
        ..DdpgConfig::with_sizes(40, 2)
    }
}

fn train_config(dir: &TempDir) -> TrainConfig {
    TrainConfig {
        max_episodes: 5,
        max_steps: 10,
        warmup_transitions: 8,
        eval_interval: 3,
        checkpoint_interval: 2,
        checkpoint_dir: dir.path().to_path_buf(),
        seed: Some(1),
        ..Default::default()
    }
}

fn controller(config: TrainConfig) -> EpisodeController<RecordingSink, FileCheckpointStore> {
    let alg = alg_config();
    let buffer = ReplayBuffer::new(alg.replay_buffer_capacity).unwrap();
    let store = FileCheckpointStore::new(&config.checkpoint_dir);
    let trainer = DDPG::new(alg, RecordingSink::new(), &Device::Cpu).unwrap();
    EpisodeController::new(config, trainer, buffer, store, StdRng::seed_from_u64(1)).unwrap()
}

fn values(varmap: &VarMap) -> Vec<Vec<f64>> {
    named_vars(varmap)
        .unwrap()
        .into_iter()
        .map(|(_, v)| v.as_tensor().flatten_all().unwrap().to_vec1::<f64>().unwrap())
        .collect()
}

#[test]
fn simulated_robot_run_emits_metrics_and_checkpoints() {
    let dir = TempDir::new("episode_loop").unwrap();
    let mut env = DiffDriveEnv::new(DiffDriveConfig {
        scan_noise: 0.01,
        ..Default::default()
    })
    .unwrap();
    let mut controller = controller(train_config(&dir));

    let summaries = controller.run(&mut env).unwrap();
    assert_eq!(summaries.len(), 5);
    assert!(summaries.iter().all(|s| s.steps >= 1 && s.steps <= 10));
    assert!(summaries.iter().all(|s| s.total_reward.is_finite()));
    assert_eq!(summaries[0].phase, Phase::WarmUp);

    let store = controller.store().clone();
    for episode in [0, 2, 4] {
        let (actor, critic) = store.paths("stage_1", episode);
        assert!(actor.exists() && critic.exists(), "episode {episode}");
    }
    let (actor, _) = store.paths("stage_1", 1);
    assert!(!actor.exists());

    let (trainer, buffer, _) = controller.into_parts();
    let metrics = trainer.metrics();
    assert_eq!(metrics.series("test_reward").len(), 5);
    assert_eq!(metrics.series("memory").last().map(|(_, m)| *m as usize), Some(buffer.len()));
    let evaluated = summaries.iter().filter(|s| s.phase == Phase::Evaluate).count();
    assert_eq!(metrics.series("result").len(), evaluated);
    assert_eq!(metrics.series("max_q").len(), trainer.train_steps());
}

#[test]
fn resuming_restores_the_saved_target_networks() {
    let dir = TempDir::new("episode_loop").unwrap();
    let mut env = DiffDriveEnv::new(DiffDriveConfig::default()).unwrap();

    let mut first = controller(train_config(&dir));
    first.run(&mut env).unwrap();
    let (trained, _, _) = first.into_parts();

    let mut resumed = controller(TrainConfig {
        resume_episode: Some(4),
        ..train_config(&dir)
    });
    assert_eq!(resumed.resume().unwrap(), 5);

    let trainer = resumed.trainer();
    assert_eq!(values(trainer.actor().varmap()), values(trained.target_actor().varmap()));
    assert_eq!(values(trainer.critic().varmap()), values(trained.target_critic().varmap()));
    assert_eq!(values(trainer.target_actor().varmap()), values(trainer.actor().varmap()));
}

#[test]
fn resuming_from_a_missing_checkpoint_fails() {
    let dir = TempDir::new("episode_loop").unwrap();
    let mut env = DiffDriveEnv::new(DiffDriveConfig::default()).unwrap();
    let mut controller = controller(TrainConfig {
        resume_episode: Some(140),
        ..train_config(&dir)
    });

    assert!(matches!(controller.run(&mut env), Err(DdpgError::Persistence { .. })));
}
