use {
    crate::error::{
        DdpgError,
        Result,
    },
    candle_nn::VarMap,
    std::{
        fs::create_dir_all,
        path::{
            Path,
            PathBuf,
        },
    },
    tracing::warn,
};


/// Persists actor and critic parameters keyed by world and episode.
pub trait CheckpointStore {
    fn save(
        &self,
        world: &str,
        episode: usize,
        actor: &VarMap,
        critic: &VarMap,
    ) -> Result<()>;

    /// Overwrite the variables of `actor` and `critic` with the stored values.
    ///
    /// Every variable must be present in the checkpoint.
    fn load(
        &self,
        world: &str,
        episode: usize,
        actor: &mut VarMap,
        critic: &mut VarMap,
    ) -> Result<()>;
}


/// Stores `<root>/<world>/<episode>_actor.safetensors` and
/// `<root>/<world>/<episode>_critic.safetensors`.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    root: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn paths(
        &self,
        world: &str,
        episode: usize,
    ) -> (PathBuf, PathBuf) {
        let dir = self.root.join(world);
        (
            dir.join(format!("{episode}_actor.safetensors")),
            dir.join(format!("{episode}_critic.safetensors")),
        )
    }
}

fn persistence_error(
    path: &Path,
    reason: impl ToString,
) -> DdpgError {
    DdpgError::Persistence {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn load_one(
    varmap: &mut VarMap,
    path: &Path,
) -> Result<()> {
    if !path.try_exists()? {
        return Err(persistence_error(path, "no such checkpoint"));
    }
    varmap.load(path).map_err(|e| persistence_error(path, e))
}

impl CheckpointStore for FileCheckpointStore {
    fn save(
        &self,
        world: &str,
        episode: usize,
        actor: &VarMap,
        critic: &VarMap,
    ) -> Result<()> {
        let (actor_path, critic_path) = self.paths(world, episode);
        let dir = self.root.join(world);
        create_dir_all(&dir).map_err(|e| persistence_error(&dir, e))?;

        actor.save(&actor_path).map_err(|e| persistence_error(&actor_path, e))?;
        critic.save(&critic_path).map_err(|e| persistence_error(&critic_path, e))?;
        warn!("Models saved to {actor_path:?} and {critic_path:?}");
        Ok(())
    }

    fn load(
        &self,
        world: &str,
        episode: usize,
        actor: &mut VarMap,
        critic: &mut VarMap,
    ) -> Result<()> {
        let (actor_path, critic_path) = self.paths(world, episode);
        load_one(actor, &actor_path)?;
        load_one(critic, &critic_path)?;
        warn!("Models loaded from {actor_path:?} and {critic_path:?}");
        Ok(())
    }
}
