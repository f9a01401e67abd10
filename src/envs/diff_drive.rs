use {
    super::{
        Environment,
        Step,
    },
    crate::error::{
        DdpgError,
        Result,
    },
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    rand_distr::{
        Distribution,
        Normal,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::f64::consts::PI,
    tracing::info,
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffDriveConfig {
    // The arena is the square [-half_width, half_width]^2 (m).
    pub half_width: f64,
    // Number of evenly spaced range readings per observation.
    pub scan_beams: usize,
    // Range readings are clipped to this distance (m).
    pub max_range: f64,
    // Standard deviation of gaussian noise added to every range reading (m).
    pub scan_noise: f64,
    // Closer than this to a wall counts as a collision (m).
    pub collision_distance: f64,
    // Closer than this to the goal counts as reaching it (m).
    pub goal_distance: f64,
    // Integration time step (s).
    pub dt: f64,
    // Reward for reaching the goal; ends the episode.
    pub goal_reward: f64,
    // Reward for a collision; ends the episode.
    pub collision_reward: f64,
    // Reward per meter of progress towards the goal.
    pub progress_reward: f64,
    pub seed: u64,
}
impl Default for DiffDriveConfig {
    fn default() -> Self {
        Self {
            half_width: 2.0,
            scan_beams: 36,
            max_range: 3.5,
            scan_noise: 0.0,
            collision_distance: 0.13,
            goal_distance: 0.2,
            dt: 0.2,
            goal_reward: 500.0,
            collision_reward: -200.0,
            progress_reward: 100.0,
            seed: 42,
        }
    }
}


// Goals keep at least this distance to the walls (m).
const GOAL_WALL_CLEARANCE: f64 = 0.3;
const MAX_GOAL_ATTEMPTS: usize = 1_000;

fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

/// A differential-drive robot in an empty square arena with a goal.
///
/// Observations are `scan_beams` range readings followed by the previous
/// linear and angular velocity, the heading error towards the goal and the
/// distance to the goal.
pub struct DiffDriveEnv {
    config: DiffDriveConfig,
    x: f64,
    y: f64,
    theta: f64,
    goal: (f64, f64),
    goal_distance: f64,
    timestep: usize,
    scan_noise: Option<Normal<f64>>,
    rng: StdRng,
}

impl DiffDriveEnv {
    pub fn new(config: DiffDriveConfig) -> Result<Self> {
        if config.scan_beams == 0 || config.dt <= 0.0 || config.goal_distance <= 0.0 {
            return Err(DdpgError::Config(format!("invalid arena: {config:?}")));
        }
        // the farthest goal from the center sits in a corner of the goal square
        let margin = config.half_width - GOAL_WALL_CLEARANCE;
        if margin <= 0.0 || 2.0_f64.sqrt() * margin <= 2.0 * config.goal_distance {
            return Err(DdpgError::Config(format!(
                "an arena of half width {} has no room for a goal {} m away from the start",
                config.half_width,
                2.0 * config.goal_distance,
            )));
        }
        let scan_noise = if config.scan_noise > 0.0 {
            Some(Normal::new(0.0, config.scan_noise).map_err(|e| DdpgError::Config(e.to_string()))?)
        } else {
            None
        };
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            goal: (1.0, 0.0),
            goal_distance: 1.0,
            timestep: 0,
            scan_noise,
            rng,
        })
    }

    pub fn config(&self) -> &DiffDriveConfig {
        &self.config
    }

    pub fn position(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.theta)
    }

    pub fn goal(&self) -> (f64, f64) {
        self.goal
    }

    /// Place the goal somewhere well inside the arena and away from the robot.
    fn respawn_goal(&mut self) -> Result<()> {
        let margin = self.config.half_width - GOAL_WALL_CLEARANCE;
        for _ in 0..MAX_GOAL_ATTEMPTS {
            let goal = (
                self.rng.gen_range(-margin..=margin),
                self.rng.gen_range(-margin..=margin),
            );
            if (goal.0 - self.x).hypot(goal.1 - self.y) > 2.0 * self.config.goal_distance {
                self.goal = goal;
                self.goal_distance = self.distance_to_goal();
                return Ok(());
            }
        }
        Err(DdpgError::Environment(format!(
            "no goal found after {MAX_GOAL_ATTEMPTS} attempts from ({:.3}, {:.3})",
            self.x,
            self.y,
        )))
    }

    fn distance_to_goal(&self) -> f64 {
        (self.goal.0 - self.x).hypot(self.goal.1 - self.y)
    }

    fn heading_error(&self) -> f64 {
        let bearing = (self.goal.1 - self.y).atan2(self.goal.0 - self.x);
        wrap_angle(bearing - self.theta)
    }

    /// Distance along `angle` from the robot to the arena border.
    fn cast(
        &self,
        angle: f64,
    ) -> f64 {
        let (dx, dy) = (angle.cos(), angle.sin());
        let h = self.config.half_width;
        let along = |pos: f64, dir: f64| {
            if dir > 1e-12 {
                (h - pos) / dir
            } else if dir < -1e-12 {
                (-h - pos) / dir
            } else {
                f64::INFINITY
            }
        };
        along(self.x, dx).min(along(self.y, dy)).min(self.config.max_range)
    }

    fn scan(&mut self) -> Vec<f64> {
        let n = self.config.scan_beams;
        let ranges: Vec<f64> = (0..n)
            .map(|i| self.cast(self.theta + 2.0 * PI * i as f64 / n as f64))
            .collect();
        match &self.scan_noise {
            Some(normal) => ranges
                .into_iter()
                .map(|range| (range + normal.sample(&mut self.rng)).clamp(0.0, self.config.max_range))
                .collect(),
            None => ranges,
        }
    }

    fn observe(
        &mut self,
        previous_action: &[f64],
    ) -> Vec<f64> {
        let mut observation = self.scan();
        observation.extend([
            previous_action.first().copied().unwrap_or(0.0),
            previous_action.get(1).copied().unwrap_or(0.0),
            self.heading_error(),
            self.distance_to_goal(),
        ]);
        observation
    }

    fn clearance(&self) -> f64 {
        let h = self.config.half_width;
        (h - self.x.abs()).min(h - self.y.abs())
    }
}

impl Environment for DiffDriveEnv {
    fn reset(&mut self) -> Result<Vec<f64>> {
        self.x = 0.0;
        self.y = 0.0;
        self.theta = self.rng.gen_range(-PI..PI);
        self.timestep = 0;
        self.respawn_goal()?;
        Ok(self.observe(&[0.0, 0.0]))
    }

    fn step(
        &mut self,
        action: &[f64],
        previous_action: &[f64],
    ) -> Result<Step> {
        if action.len() != 2 || action.iter().any(|a| !a.is_finite()) {
            return Err(DdpgError::Environment(format!("cannot apply action {action:?}")));
        }
        let (v, w) = (action[0], action[1]);
        let dt = self.config.dt;

        self.x += v * self.theta.cos() * dt;
        self.y += v * self.theta.sin() * dt;
        self.theta = wrap_angle(self.theta + w * dt);
        self.timestep += 1;

        let distance = self.distance_to_goal();
        let (reward, done) = if self.clearance() < self.config.collision_distance {
            (self.config.collision_reward, true)
        } else if distance < self.config.goal_distance {
            (self.config.goal_reward, true)
        } else {
            (self.config.progress_reward * (self.goal_distance - distance), false)
        };
        self.goal_distance = distance;

        info!(
            concat!(
                "\nDiffDrive Step {}:",
                "\nS({:.3}, {:.3}, {:.3}) G({:.3}, {:.3})",
                "\nA({:.3}, {:.3}) R: {:.3}",
            ),
            self.timestep,
            self.x, self.y, self.theta, self.goal.0, self.goal.1,
            v, w, reward,
        );

        Ok(Step {
            observation: self.observe(previous_action),
            reward,
            done,
        })
    }

    fn observation_size(&self) -> usize {
        self.config.scan_beams + 4
    }
}
