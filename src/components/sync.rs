use {
    candle_core::{
        Error,
        Result,
        Var,
    },
    candle_nn::VarMap,
};


/// The variables of `varmap`, ordered by name.
pub fn named_vars(varmap: &VarMap) -> Result<Vec<(String, Var)>> {
    let data = varmap
        .data()
        .lock()
        .map_err(|_| Error::Msg("variable map lock is poisoned".into()))?;
    let mut vars: Vec<(String, Var)> = data
        .iter()
        .map(|(name, var)| (name.clone(), var.clone()))
        .collect();
    vars.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(vars)
}

fn paired(
    target: &VarMap,
    source: &VarMap,
) -> Result<Vec<(Var, Var)>> {
    let target = named_vars(target)?;
    let source = named_vars(source)?;
    if target.len() != source.len() {
        return Err(Error::Msg(format!(
            "cannot synchronize {} target variables with {} source variables",
            target.len(),
            source.len(),
        )));
    }
    target
        .into_iter()
        .zip(source)
        .map(|((t_name, t_var), (s_name, s_var))| {
            if t_name != s_name {
                return Err(Error::Msg(format!("variable {t_name} has no counterpart (found {s_name})")));
            }
            if t_var.shape() != s_var.shape() {
                return Err(Error::Msg(format!(
                    "variable {t_name} has shape {:?} but its source has {:?}",
                    t_var.shape(),
                    s_var.shape(),
                )));
            }
            Ok((t_var, s_var))
        })
        .collect()
}

/// Copy every variable of `source` into the same-named variable of `target`.
pub fn hard_update(
    target: &VarMap,
    source: &VarMap,
) -> Result<()> {
    for (t_var, s_var) in paired(target, source)? {
        t_var.set(&s_var.as_tensor().detach())?;
    }
    Ok(())
}

/// target = tau * source + (1 - tau) * target, per variable.
pub fn soft_update(
    target: &VarMap,
    source: &VarMap,
    tau: f64,
) -> Result<()> {
    if !(0.0..=1.0).contains(&tau) {
        return Err(Error::Msg(format!("tau must lie in [0, 1], got {tau}")));
    }
    for (t_var, s_var) in paired(target, source)? {
        let tracked = ((tau * s_var.as_tensor().detach())? + ((1.0 - tau) * t_var.as_tensor().detach())?)?;
        t_var.set(&tracked)?;
    }
    Ok(())
}
