use {
    crate::configs::OuConfig,
    candle_core::{
        DType,
        Device,
        Result,
        Tensor,
    },
};

/// Ornstein-Uhlenbeck process with a linearly decaying volatility.
pub struct OuNoise {
    mu: f64,
    theta: f64,
    sigma: f64,
    max_sigma: f64,
    min_sigma: f64,
    decay_period: usize,
    state: Tensor,
}
impl OuNoise {
    pub fn new(
        config: &OuConfig,
        size_action: usize,
        device: &Device,
    ) -> Result<Self> {
        Ok(Self {
            mu: config.mu,
            theta: config.theta,
            sigma: config.max_sigma,
            max_sigma: config.max_sigma,
            min_sigma: config.min_sigma,
            decay_period: config.decay_period,
            state: (Tensor::ones(size_action, DType::F64, device)? * config.mu)?,
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Put the process back at its mean.
    pub fn reset(&mut self) -> Result<()> {
        self.state = (self.state.ones_like()? * self.mu)?;
        Ok(())
    }

    /// Evolve the process one step and decay sigma according to `t`.
    pub fn sample(
        &mut self,
        t: usize,
    ) -> Result<Tensor> {
        let rand = self.state.randn_like(0.0, 1.0)?;
        let dx = ((self.theta * (self.mu - &self.state)?)? + (self.sigma * rand)?)?;
        self.state = (&self.state + dx)?;

        let decaying = (t as f64 / self.decay_period as f64).min(1.0);
        self.sigma = (self.sigma - (self.max_sigma - self.min_sigma) * decaying).max(self.min_sigma);

        Ok(self.state.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_decays_to_its_floor() {
        let config = OuConfig {
            decay_period: 10,
            ..Default::default()
        };
        let mut noise = OuNoise::new(&config, 2, &Device::Cpu).unwrap();
        assert_eq!(noise.sigma(), config.max_sigma);

        for t in 0..20 {
            let sample = noise.sample(t).unwrap();
            assert_eq!(sample.dims(), &[2]);
        }
        assert_eq!(noise.sigma(), config.min_sigma);
    }

    #[test]
    fn reset_returns_to_mean() {
        let config = OuConfig {
            mu: 0.5,
            ..Default::default()
        };
        let mut noise = OuNoise::new(&config, 2, &Device::Cpu).unwrap();
        noise.sample(0).unwrap();
        noise.reset().unwrap();
        assert_eq!(noise.state.to_vec1::<f64>().unwrap(), vec![0.5, 0.5]);
    }
}
