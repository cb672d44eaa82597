//! Request and response capabilities
//!
//! Every workflow input and every activity request realizes
//! [`WorkflowRequest`]; activity results realize [`ActivityResponse`] so the
//! invocation layer and the step sequencer can classify them uniformly.

use crate::{ObservabilityProperties, ValidationResult};

/// Anything that can produce a validation verdict about itself
pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

/// Capability set shared by every request variant
pub trait WorkflowRequest: Validate {
    fn observability_properties(&self) -> &ObservabilityProperties;

    fn observability_properties_mut(&mut self) -> &mut ObservabilityProperties;
}

/// Classification hooks for activity results
pub trait ActivityResponse {
    /// An empty result terminates the orchestration step that received it
    fn is_empty(&self) -> bool {
        false
    }

    /// Name of the soft failure this value stands for, if it is a sentinel
    fn soft_failure(&self) -> Option<&'static str> {
        None
    }
}

/// Implements [`WorkflowRequest`] for structs holding an `observability` field
macro_rules! impl_workflow_request {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::WorkflowRequest for $ty {
                fn observability_properties(&self) -> &$crate::ObservabilityProperties {
                    &self.observability
                }

                fn observability_properties_mut(&mut self) -> &mut $crate::ObservabilityProperties {
                    &mut self.observability
                }
            }
        )+
    };
}

pub(crate) use impl_workflow_request;
