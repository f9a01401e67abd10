use candle_core::{
    Result,
    Tensor,
};

/// Mean Huber loss with threshold 1 (PyTorch's `SmoothL1Loss`).
///
/// `0.5 * d^2` where `|d| < 1`, `|d| - 0.5` elsewhere.
pub fn smooth_l1_loss(
    x: &Tensor,
    y: &Tensor,
) -> Result<Tensor> {
    let d = (x - y)?.abs()?;
    let quadratic = d.lt(1.0)?.to_dtype(d.dtype())?;
    let linear = quadratic.affine(-1.0, 1.0)?;
    ((0.5 * (&quadratic * d.sqr()?)?)? + (linear * (d - 0.5)?)?)?.mean_all()
}
