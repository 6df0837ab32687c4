//! Fraud-class probability extraction from classifier outputs.
//!
//! scikit-learn exports expose class probabilities either as a float tensor
//! (`[batch, classes]` or `[classes]`) or, with zipmap enabled, as
//! `seq(map(int64, float))`. Class 1 is the fraud class in both.

use crate::error::InferenceError;
use ort::memory::Allocator;
use ort::session::SessionOutputs;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue};
use tracing::debug;

const FRAUD_CLASS: i64 = 1;

/// Find the fraud probability in a session's outputs.
///
/// The named probability output is tried first, then every non-label
/// output. Fails instead of guessing when nothing usable is found.
pub fn fraud_probability(
    outputs: &SessionOutputs<'_>,
    output_name: &str,
    model_name: &str,
) -> Result<f64, InferenceError> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = probability_from_value(output, model_name)? {
            return checked(prob, model_name);
        }
    }

    for (name, output) in outputs.iter() {
        if name == output_name || name.contains("label") {
            continue;
        }
        if let Some(prob) = probability_from_value(&output, model_name)? {
            debug!(model = %model_name, output = %name, "Probability read from fallback output");
            return checked(prob, model_name);
        }
    }

    Err(InferenceError::output(
        model_name,
        format!("no probability output found (expected `{}`)", output_name),
    ))
}

fn probability_from_value(
    output: &DynValue,
    model_name: &str,
) -> Result<Option<f64>, InferenceError> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        return fraud_prob_from_tensor(&dims, data, model_name).map(Some);
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        return fraud_prob_from_sequence_map(output, model_name).map(Some);
    }

    Ok(None)
}

/// Class-1 probability from a `[1, C]` or `[C]` tensor.
pub(crate) fn fraud_prob_from_tensor(
    dims: &[i64],
    data: &[f32],
    model_name: &str,
) -> Result<f64, InferenceError> {
    let classes = match dims {
        [_, classes] => *classes,
        [classes] => *classes,
        _ => {
            return Err(InferenceError::output(
                model_name,
                format!("unexpected probability shape {:?}", dims),
            ))
        }
    };

    if classes < 2 {
        return Err(InferenceError::output(
            model_name,
            format!("expected a binary class-probability pair, got {} class(es)", classes),
        ));
    }

    data.get(FRAUD_CLASS as usize)
        .map(|&p| p as f64)
        .ok_or_else(|| InferenceError::output(model_name, "probability tensor is empty"))
}

fn fraud_prob_from_sequence_map(output: &DynValue, model_name: &str) -> Result<f64, InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| InferenceError::runtime(model_name, e))?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| InferenceError::runtime(model_name, e))?;

    let map_value = maps
        .first()
        .ok_or_else(|| InferenceError::output(model_name, "empty probability sequence"))?;
    let pairs = map_value
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| InferenceError::runtime(model_name, e))?;

    fraud_prob_from_pairs(&pairs, model_name)
}

pub(crate) fn fraud_prob_from_pairs(
    pairs: &[(i64, f32)],
    model_name: &str,
) -> Result<f64, InferenceError> {
    pairs
        .iter()
        .find(|(class_id, _)| *class_id == FRAUD_CLASS)
        .map(|(_, prob)| *prob as f64)
        .ok_or_else(|| InferenceError::output(model_name, "no class-1 entry in probability map"))
}

fn checked(prob: f64, model_name: &str) -> Result<f64, InferenceError> {
    if prob.is_finite() && (0.0..=1.0).contains(&prob) {
        Ok(prob)
    } else {
        Err(InferenceError::InvalidProbability {
            model: model_name.to_string(),
            value: prob,
        })
    }
}
