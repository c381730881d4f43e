//! Parameter schemas: which names a distribution requires, and how a call's
//! parameter mapping is validated against them.

use br_core::{Error, Parameters, Result, Tensor, TensorMap};

/// One entry of a distribution's required-parameter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The named parameter must be present.
    One(&'static str),
    /// At least one of the named alternatives must be present.
    AnyOf(&'static [&'static str]),
}

impl Requirement {
    /// `true` when `parameters` satisfies this requirement.
    pub fn is_satisfied(&self, parameters: &Parameters) -> bool {
        match self {
            Requirement::One(name) => parameters.contains_key(*name),
            Requirement::AnyOf(names) => names.iter().any(|n| parameters.contains_key(*n)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Requirement::One(name) => format!("'{}'", name),
            Requirement::AnyOf(names) => {
                names.iter().map(|n| format!("'{}'", n)).collect::<Vec<_>>().join(" or ")
            }
        }
    }
}

/// Fail with [`Error::MissingParameter`] naming every unsatisfied requirement.
pub fn check_parameters(
    distribution: &'static str,
    required: &[Requirement],
    parameters: &Parameters,
) -> Result<()> {
    let missing: Vec<String> =
        required.iter().filter(|r| !r.is_satisfied(parameters)).map(Requirement::describe).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingParameter { distribution, missing: missing.join(", ") })
    }
}

/// Extract every parameter as a tensor.
pub fn tensor_parameters(parameters: &Parameters) -> Result<TensorMap> {
    parameters.iter().map(|(k, v)| Ok((k.clone(), v.as_tensor(k)?.clone()))).collect()
}

/// Borrow a required tensor from an extracted map.
pub(crate) fn get<'a>(
    map: &'a TensorMap,
    distribution: &'static str,
    name: &'static str,
) -> Result<&'a Tensor> {
    map.get(name)
        .ok_or_else(|| Error::MissingParameter { distribution, missing: format!("'{}'", name) })
}

/// Fail unless `value` is finite and strictly positive.
pub(crate) fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Validation(format!("{} must be finite and > 0, got {}", name, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use br_core::{Value, parameters};
    use ndarray::IxDyn;

    fn one() -> Tensor {
        Tensor::ones(IxDyn(&[1, 1]))
    }

    #[test]
    fn test_alternatives() {
        let req = [Requirement::One("n"), Requirement::AnyOf(&["p", "logit_p"])];
        let ok = parameters([("n", one()), ("logit_p", one())]);
        assert!(check_parameters("Binomial", &req, &ok).is_ok());

        let missing = parameters([("n", one())]);
        let err = check_parameters("Binomial", &req, &missing).unwrap_err();
        match err {
            Error::MissingParameter { distribution, missing } => {
                assert_eq!(distribution, "Binomial");
                assert_eq!(missing, "'p' or 'logit_p'");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_reports_every_missing_group() {
        let req = [Requirement::One("loc"), Requirement::One("scale")];
        let err = check_parameters("Normal", &req, &Parameters::new()).unwrap_err();
        assert!(err.to_string().contains("'loc', 'scale'"));
    }

    #[test]
    fn test_check_positive() {
        assert!(check_positive("scale", 1.0).is_ok());
        assert!(check_positive("scale", 0.0).is_err());
        assert!(check_positive("scale", f64::NAN).is_err());
    }

    #[test]
    fn test_tensor_parameters_rejects_symbols() {
        let mut p = parameters([("loc", one())]);
        p.insert("scale".into(), Value::Symbols(vec!["a".into()]));
        assert!(matches!(tensor_parameters(&p), Err(Error::Validation(_))));
    }
}
