//! Classifier capability and its ONNX-backed implementations

use crate::error::{InferenceError, ModelLoadError};
use crate::models::loader::{InputSpec, LoadedModel};
use crate::models::output::fraud_probability;
use crate::url::features::{UrlFeatures, FEATURE_NAMES};
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor};

/// Something that turns an input into a fraud probability.
///
/// Implementations must be pure with respect to their input and safe to
/// call from many threads at once.
pub trait Classifier: Send + Sync {
    type Input: ?Sized;

    fn name(&self) -> &str;

    fn score(&self, input: &Self::Input) -> Result<f64, InferenceError>;
}

/// Text model over normalized message text (string tensor `[1, 1]`).
pub struct OnnxTextClassifier {
    model: LoadedModel,
    input_name: String,
}

impl OnnxTextClassifier {
    pub fn from_model(model: LoadedModel) -> Result<Self, ModelLoadError> {
        let input = match model.inputs.as_slice() {
            [input] => input.clone(),
            other => {
                return Err(schema_error(
                    &model.name,
                    format!("expected one string input, found {}", other.len()),
                ))
            }
        };

        if let Some(element) = input.element {
            if element != TensorElementType::String {
                return Err(schema_error(
                    &model.name,
                    format!("input `{}` is {:?}, expected a string tensor", input.name, element),
                ));
            }
        }

        Ok(Self {
            input_name: input.name,
            model,
        })
    }
}

impl Classifier for OnnxTextClassifier {
    type Input = str;

    fn name(&self) -> &str {
        &self.model.name
    }

    fn score(&self, text: &str) -> Result<f64, InferenceError> {
        let name = self.model.name.as_str();
        self.model.pool.with_session(name, |session| {
            let data = [text.to_owned()];
            let input_tensor = Tensor::from_string_array(([1usize, 1], &data[..]))
                .map_err(|e| InferenceError::runtime(name, e))?;

            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input_tensor])
                .map_err(|e| InferenceError::runtime(name, e))?;

            fraud_probability(&outputs, &self.model.output_name, name)
        })
    }
}

/// How the URL model expects its four features.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlInputLayout {
    /// One `[1, 4]` tensor in trained column order
    Packed { name: String, integer: bool },
    /// One `[1, 1]` tensor per named column, in trained order
    Columnar { names: Vec<String>, integer: bool },
}

impl UrlInputLayout {
    /// Work out the layout from the model's declared inputs. Anything that
    /// does not line up with the trained columns is rejected.
    pub fn detect(model_name: &str, inputs: &[InputSpec]) -> Result<Self, ModelLoadError> {
        let integer = inputs
            .first()
            .map(|i| i.element == Some(TensorElementType::Int64))
            .unwrap_or(false);

        match inputs {
            [input] => Ok(UrlInputLayout::Packed {
                name: input.name.clone(),
                integer,
            }),
            columns if columns.len() == FEATURE_NAMES.len() => {
                let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
                if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
                    return Err(schema_error(
                        model_name,
                        format!("columns {:?} do not match {:?}", names, FEATURE_NAMES),
                    ));
                }
                if columns.iter().any(|c| c.element != columns[0].element) {
                    return Err(schema_error(model_name, "columns mix element types"));
                }
                Ok(UrlInputLayout::Columnar { names, integer })
            }
            other => Err(schema_error(
                model_name,
                format!(
                    "expected 1 packed or {} named inputs, found {}",
                    FEATURE_NAMES.len(),
                    other.len()
                ),
            )),
        }
    }
}

/// URL model over a [`UrlFeatures`] record.
pub struct OnnxUrlClassifier {
    model: LoadedModel,
    layout: UrlInputLayout,
}

impl OnnxUrlClassifier {
    pub fn from_model(model: LoadedModel) -> Result<Self, ModelLoadError> {
        let layout = UrlInputLayout::detect(&model.name, &model.inputs)?;
        Ok(Self { model, layout })
    }

    pub fn layout(&self) -> &UrlInputLayout {
        &self.layout
    }

    fn input_values(&self, features: &UrlFeatures) -> Result<Vec<(String, DynValue)>, ort::Error> {
        match &self.layout {
            UrlInputLayout::Packed { name, integer } => {
                let value = if *integer {
                    Tensor::from_array((vec![1_i64, 4], features.to_i64_row().to_vec()))?.into_dyn()
                } else {
                    Tensor::from_array((vec![1_i64, 4], features.to_f32_row().to_vec()))?.into_dyn()
                };
                Ok(vec![(name.clone(), value)])
            }
            UrlInputLayout::Columnar { names, integer } => {
                let ints = features.to_i64_row();
                let floats = features.to_f32_row();
                names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let value = if *integer {
                            Tensor::from_array((vec![1_i64, 1], vec![ints[i]]))?.into_dyn()
                        } else {
                            Tensor::from_array((vec![1_i64, 1], vec![floats[i]]))?.into_dyn()
                        };
                        Ok((name.clone(), value))
                    })
                    .collect()
            }
        }
    }
}

impl Classifier for OnnxUrlClassifier {
    type Input = UrlFeatures;

    fn name(&self) -> &str {
        &self.model.name
    }

    fn score(&self, features: &UrlFeatures) -> Result<f64, InferenceError> {
        let name = self.model.name.as_str();
        let inputs = self
            .input_values(features)
            .map_err(|e| InferenceError::runtime(name, e))?;

        self.model.pool.with_session(name, |session| {
            let outputs = session
                .run(inputs)
                .map_err(|e| InferenceError::runtime(name, e))?;
            fraud_probability(&outputs, &self.model.output_name, name)
        })
    }
}

fn schema_error(model: &str, reason: impl Into<String>) -> ModelLoadError {
    ModelLoadError::Schema {
        model: model.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, element: Option<TensorElementType>) -> InputSpec {
        InputSpec {
            name: name.to_string(),
            element,
        }
    }

    #[test]
    fn test_packed_layout() {
        let layout =
            UrlInputLayout::detect("url", &[spec("float_input", Some(TensorElementType::Float32))])
                .unwrap();
        assert_eq!(
            layout,
            UrlInputLayout::Packed {
                name: "float_input".to_string(),
                integer: false
            }
        );
    }

    #[test]
    fn test_columnar_layout() {
        let inputs: Vec<InputSpec> = FEATURE_NAMES
            .iter()
            .map(|n| spec(n, Some(TensorElementType::Int64)))
            .collect();
        let layout = UrlInputLayout::detect("url", &inputs).unwrap();
        assert!(matches!(layout, UrlInputLayout::Columnar { integer: true, .. }));
    }

    #[test]
    fn test_columns_out_of_order_rejected() {
        let inputs = vec![
            spec("num_subdomains", None),
            spec("length", None),
            spec("has_https", None),
            spec("has_suspicious_words", None),
        ];
        let err = UrlInputLayout::detect("url", &inputs).unwrap_err();
        assert!(matches!(err, ModelLoadError::Schema { .. }));
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let inputs = vec![spec("a", None), spec("b", None)];
        assert!(UrlInputLayout::detect("url", &inputs).is_err());
        assert!(UrlInputLayout::detect("url", &[]).is_err());
    }
}
