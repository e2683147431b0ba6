//! Errors raised by the data model.

use recompose_common::error::RecomposeError;

use crate::layer::LayerId;

/// Errors that can occur when building or mutating model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid transport encoding: {message}")]
    InvalidEncoding { message: String },

    #[error("Unknown layer: {0}")]
    UnknownLayer(LayerId),

    #[error("Layer index {index} out of range for {len} layers")]
    IndexOutOfRange { index: usize, len: usize },
}

impl ModelError {
    pub fn invalid_encoding(msg: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            message: msg.into(),
        }
    }
}

/// Model errors are always caused by the caller's input.
impl From<ModelError> for RecomposeError {
    fn from(err: ModelError) -> Self {
        RecomposeError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recompose_common::error::RecomposeResult;

    use crate::geometry::Rectangle;
    use crate::layer::{Layer, LayerStack};
    use crate::transport::EncodedRaster;

    fn remove_twice(stack: &mut LayerStack, id: LayerId) -> RecomposeResult<()> {
        stack.remove(id)?;
        stack.remove(id)?;
        Ok(())
    }

    #[test]
    fn test_stack_errors_propagate_as_validation() {
        let mut stack = LayerStack::new();
        let id = stack.add(Layer::empty(Rectangle::new(0, 0, 1, 1)));
        let err = remove_twice(&mut stack, id).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Unknown layer: el-1"));
    }

    #[test]
    fn test_bad_data_url_converts() {
        let err: RecomposeError = EncodedRaster::parse("not a url").unwrap_err().into();
        assert!(matches!(err, RecomposeError::Validation { .. }));
    }
}
