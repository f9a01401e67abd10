use {
    crate::error::{
        DdpgError,
        Result,
    },
    candle_core::Tensor,
    rand::{
        seq::index,
        Rng,
    },
    std::collections::VecDeque,
    unzip_n::unzip_n,
};

unzip_n!(4);

/// A transition in the replay buffer.
///
/// # Fields
///
/// * `state` - The observation the action was chosen in, shape `(D,)`.
/// * `action` - The action taken, shape `(A,)`.
/// * `reward` - The reward received, shape `(1,)`.
/// * `next_state` - The observation after the action, shape `(D,)`.
#[derive(Clone, Debug)]
pub struct Transition {
    state: Tensor,
    action: Tensor,
    reward: Tensor,
    next_state: Tensor,
}
impl Transition {
    fn new(
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
    ) -> Result<Self> {
        Ok(Self {
            state: state.detach(),
            action: action.detach(),
            reward: Tensor::new(&[reward], state.device())?.to_dtype(state.dtype())?,
            next_state: next_state.detach(),
        })
    }

    pub fn state(&self) -> &Tensor {
        &self.state
    }

    pub fn action(&self) -> &Tensor {
        &self.action
    }

    pub fn reward(&self) -> &Tensor {
        &self.reward
    }

    pub fn next_state(&self) -> &Tensor {
        &self.next_state
    }
}

/// A sampled batch, stored as parallel tensors.
///
/// * `states` - `(n, D)`
/// * `actions` - `(n, A)`
/// * `rewards` - `(n,)`
/// * `next_states` - `(n, D)`
#[derive(Clone, Debug)]
pub struct Batch {
    pub states: Tensor,
    pub actions: Tensor,
    pub rewards: Tensor,
    pub next_states: Tensor,
}
impl Batch {
    pub fn len(&self) -> usize {
        self.rewards.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A replay buffer for off-policy algorithms.
///
/// The replay buffer is implemented as a simple ring buffer / VecDeque:
/// once `capacity` transitions are held, every push evicts the oldest one.
///
/// # Fields
///
/// * `buffer` - The buffer of transitions.
/// * `capacity` - The capacity of the buffer.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}
impl ReplayBuffer {
    /// Create a new replay buffer with the given capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DdpgError::Config("replay buffer capacity must be positive".into()));
        }
        Ok(Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Held transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Push a transition into the buffer.
    ///
    /// If the buffer is full, the oldest transition is removed to make room for
    /// the new transition.
    pub fn push(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
    ) -> Result<()> {
        let transition = Transition::new(state, action, reward, next_state)?;
        if self.is_full() {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
        Ok(())
    }

    /// Sample up to `batch_size` distinct transitions uniformly at random.
    ///
    /// When fewer transitions are held, all of them are returned (in random
    /// order). An empty buffer yields `None`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Option<Batch>> {
        let count = batch_size.min(self.len());
        if count == 0 {
            return Ok(None);
        }

        let transition_to_tuple = |t: &Transition| -> candle_core::Result<(Tensor, Tensor, Tensor, Tensor)> {
            Ok((
                t.state.unsqueeze(0)?,
                t.action.unsqueeze(0)?,
                t.reward.clone(),
                t.next_state.unsqueeze(0)?,
            ))
        };

        let (states, actions, rewards, next_states) = index::sample(rng, self.len(), count)
            .into_iter()
            .map(|i| transition_to_tuple(&self.buffer[i]))
            .collect::<candle_core::Result<Vec<(Tensor, Tensor, Tensor, Tensor)>>>()?
            .into_iter()
            .unzip_n_vec();

        Ok(Some(Batch {
            states: Tensor::cat(&states, 0)?,
            actions: Tensor::cat(&actions, 0)?,
            rewards: Tensor::cat(&rewards, 0)?,
            next_states: Tensor::cat(&next_states, 0)?,
        }))
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        candle_core::{
            DType,
            Device,
        },
        rand::{
            rngs::StdRng,
            SeedableRng,
        },
        std::collections::HashSet,
    };

    const D: usize = 3;

    fn filled(value: f64) -> Tensor {
        Tensor::full(value, D, &Device::Cpu).unwrap()
    }

    fn push_nth(
        buffer: &mut ReplayBuffer,
        i: usize,
    ) {
        let action = Tensor::new(&[0.1f64, 0.0], &Device::Cpu).unwrap();
        buffer
            .push(&filled(i as f64), &action, i as f64, &filled(i as f64 + 1.0))
            .unwrap();
    }

    fn rewards_of(batch: &Batch) -> Vec<f64> {
        batch.rewards.to_vec1::<f64>().unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(ReplayBuffer::new(0), Err(DdpgError::Config(_))));
    }

    #[test]
    fn never_exceeds_capacity_and_evicts_oldest() {
        let mut buffer = ReplayBuffer::new(4).unwrap();
        for i in 0..10 {
            push_nth(&mut buffer, i);
            assert!(buffer.len() <= buffer.capacity());
        }
        assert!(buffer.is_full());

        let held: Vec<f64> = buffer
            .iter()
            .map(|t| t.reward().to_vec1::<f64>().unwrap()[0])
            .collect();
        assert_eq!(held, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn sampling_clamps_to_what_is_held() {
        let mut buffer = ReplayBuffer::new(10).unwrap();
        for i in 0..3 {
            push_nth(&mut buffer, i);
        }
        let mut rng = StdRng::seed_from_u64(0);
        let batch = buffer.sample(8, &mut rng).unwrap().unwrap();
        assert_eq!(batch.len(), 3);

        let mut rewards = rewards_of(&batch);
        rewards.sort_by(f64::total_cmp);
        assert_eq!(rewards, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_buffer_samples_nothing() {
        let buffer = ReplayBuffer::new(10).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(buffer.sample(4, &mut rng).unwrap().is_none());
    }

    #[test]
    fn batches_are_parallel_and_without_duplicates() {
        let mut buffer = ReplayBuffer::new(100).unwrap();
        for i in 0..50 {
            push_nth(&mut buffer, i);
        }
        let mut rng = StdRng::seed_from_u64(7);
        let batch = buffer.sample(20, &mut rng).unwrap().unwrap();

        assert_eq!(batch.states.dims(), &[20, D]);
        assert_eq!(batch.actions.dims(), &[20, 2]);
        assert_eq!(batch.rewards.dims(), &[20]);
        assert_eq!(batch.next_states.dims(), &[20, D]);
        assert_eq!(batch.states.dtype(), DType::F64);

        let rewards = rewards_of(&batch);
        let unique: HashSet<u64> = rewards.iter().map(|r| r.to_bits()).collect();
        assert_eq!(unique.len(), 20);

        let states = batch.states.to_vec2::<f64>().unwrap();
        let next_states = batch.next_states.to_vec2::<f64>().unwrap();
        for ((reward, state), next_state) in rewards.iter().zip(states).zip(next_states) {
            assert!(state.iter().all(|s| s == reward));
            assert!(next_state.iter().all(|s| *s == reward + 1.0));
        }
    }

    #[test]
    fn sampling_covers_every_held_transition() {
        let mut buffer = ReplayBuffer::new(8).unwrap();
        for i in 0..8 {
            push_nth(&mut buffer, i);
        }
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            for r in rewards_of(&buffer.sample(2, &mut rng).unwrap().unwrap()) {
                seen.insert(r as usize);
            }
        }
        assert_eq!(seen, (0..8).collect());
    }
}
