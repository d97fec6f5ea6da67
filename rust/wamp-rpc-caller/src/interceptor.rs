//! Method-to-procedure resolution.

use std::collections::HashMap;

use wamp_rpc_core::{Arguments, CallOptions, RegisterOptions, Value};

use crate::InterceptError;

/// Everything needed to issue one CALL.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    pub procedure: String,
    pub arguments: Arguments,
    pub options: CallOptions,
}

impl CallDescriptor {
    pub fn new(procedure: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            procedure: procedure.into(),
            arguments,
            options: CallOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }
}

/// Everything needed to issue one REGISTER.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDescriptor {
    pub procedure: String,
    pub options: RegisterOptions,
}

/// Maps local method identities to procedures.
pub trait CalleeInterceptor: Send + Sync {
    /// Build the CALL for invoking `method` with `arguments`.
    fn call_descriptor(&self, method: &str, arguments: Vec<Value>) -> Result<CallDescriptor, InterceptError>;

    /// Build the REGISTER that exposes `method`.
    fn registration(&self, method: &str) -> Result<RegistrationDescriptor, InterceptError>;
}

/// How method arguments are laid out in the CALL payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArgumentLayout {
    /// Arguments become positional values.
    #[default]
    Positional,
    /// Arguments become named values under these parameter names, in order.
    Keyword(Vec<String>),
}

/// The procedure and options bound to one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    pub procedure: String,
    pub layout: ArgumentLayout,
    pub call_options: CallOptions,
    pub register_options: RegisterOptions,
}

impl MethodBinding {
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            layout: ArgumentLayout::Positional,
            call_options: CallOptions::default(),
            register_options: RegisterOptions::default(),
        }
    }

    /// Send arguments as named values under `names`.
    pub fn keyword<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.layout = ArgumentLayout::Keyword(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn call_options(mut self, options: CallOptions) -> Self {
        self.call_options = options;
        self
    }

    pub fn register_options(mut self, options: RegisterOptions) -> Self {
        self.register_options = options;
        self
    }
}

/// An interceptor backed by a fixed table of bindings.
#[derive(Debug, Clone, Default)]
pub struct StaticInterceptor {
    methods: HashMap<String, MethodBinding>,
}

impl StaticInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, method: impl Into<String>, binding: MethodBinding) -> Self {
        self.methods.insert(method.into(), binding);
        self
    }

    /// Bind `method` to `procedure` with positional arguments.
    pub fn method(self, method: impl Into<String>, procedure: impl Into<String>) -> Self {
        self.bind(method, MethodBinding::new(procedure))
    }

    fn binding(&self, method: &str) -> Result<&MethodBinding, InterceptError> {
        self.methods
            .get(method)
            .ok_or_else(|| InterceptError::UnknownMethod(method.to_string()))
    }
}

impl CalleeInterceptor for StaticInterceptor {
    fn call_descriptor(&self, method: &str, arguments: Vec<Value>) -> Result<CallDescriptor, InterceptError> {
        let binding = self.binding(method)?;
        let payload = match &binding.layout {
            ArgumentLayout::Positional => Arguments::positional(arguments),
            ArgumentLayout::Keyword(names) => {
                if names.len() != arguments.len() {
                    return Err(InterceptError::ArityMismatch {
                        method: method.to_string(),
                        expected: names.len(),
                        actual: arguments.len(),
                    });
                }
                Arguments::named(names.iter().cloned().zip(arguments))
            }
        };

        Ok(CallDescriptor::new(binding.procedure.clone(), payload).with_options(binding.call_options.clone()))
    }

    fn registration(&self, method: &str) -> Result<RegistrationDescriptor, InterceptError> {
        let binding = self.binding(method)?;
        Ok(RegistrationDescriptor {
            procedure: binding.procedure.clone(),
            options: binding.register_options.clone(),
        })
    }
}
