use std::sync::Arc;

use serde::de::DeserializeOwned;
use wamp_rpc_core::Value;

use crate::{
    CallDescriptor, CalleeInterceptor, CallerSession, InvocationError, InvocationHandler,
    MultiValueExtractor, ProgressSink, SingleValueExtractor,
};

/// Typed invocation of remote procedures by local method name.
///
/// Method names are resolved to procedures by the interceptor; results are
/// extracted as one value (`single_*`), no value (`*_void`) or every
/// positional value (`multi_*`).
pub struct CalleeProxy<S> {
    handler: InvocationHandler<S>,
    interceptor: Arc<dyn CalleeInterceptor>,
}

impl<S> Clone for CalleeProxy<S> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            interceptor: self.interceptor.clone(),
        }
    }
}

impl<S: CallerSession> CalleeProxy<S> {
    pub fn new(handler: InvocationHandler<S>, interceptor: Arc<dyn CalleeInterceptor>) -> Self {
        Self {
            handler,
            interceptor,
        }
    }

    pub fn handler(&self) -> &InvocationHandler<S> {
        &self.handler
    }

    fn descriptor(&self, method: &str, arguments: Vec<Value>) -> Result<CallDescriptor, InvocationError> {
        Ok(self.interceptor.call_descriptor(method, arguments)?)
    }

    pub fn single_invoke_sync<T>(&self, method: &str, arguments: Vec<Value>) -> Result<T, InvocationError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.handler
            .invoke_sync(self.descriptor(method, arguments)?, SingleValueExtractor::returning())
    }

    pub fn single_invoke_sync_void(&self, method: &str, arguments: Vec<Value>) -> Result<(), InvocationError> {
        self.handler
            .invoke_sync(self.descriptor(method, arguments)?, SingleValueExtractor::void())
    }

    pub fn multi_invoke_sync<T>(&self, method: &str, arguments: Vec<Value>) -> Result<Vec<T>, InvocationError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.handler
            .invoke_sync(self.descriptor(method, arguments)?, MultiValueExtractor::new())
    }

    pub async fn single_invoke_async<T>(&self, method: &str, arguments: Vec<Value>) -> Result<T, InvocationError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let descriptor = self.descriptor(method, arguments)?;
        self.handler
            .invoke_async(descriptor, SingleValueExtractor::returning())
            .await
    }

    pub async fn single_invoke_async_void(&self, method: &str, arguments: Vec<Value>) -> Result<(), InvocationError> {
        let descriptor = self.descriptor(method, arguments)?;
        self.handler
            .invoke_async(descriptor, SingleValueExtractor::void())
            .await
    }

    pub async fn multi_invoke_async<T>(&self, method: &str, arguments: Vec<Value>) -> Result<Vec<T>, InvocationError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let descriptor = self.descriptor(method, arguments)?;
        self.handler
            .invoke_async(descriptor, MultiValueExtractor::new())
            .await
    }

    /// Each progressive result is extracted as one value and handed to `sink`.
    pub async fn single_invoke_progressive_async<T, P>(
        &self,
        method: &str,
        arguments: Vec<Value>,
        sink: P,
    ) -> Result<T, InvocationError>
    where
        T: DeserializeOwned + Send + 'static,
        P: ProgressSink<T>,
    {
        let descriptor = self.descriptor(method, arguments)?;
        self.handler
            .invoke_progressive_async(descriptor, SingleValueExtractor::returning(), sink)
            .await
    }

    /// Each progressive result is extracted as a sequence and handed to `sink`.
    pub async fn multi_invoke_progressive_async<T, P>(
        &self,
        method: &str,
        arguments: Vec<Value>,
        sink: P,
    ) -> Result<Vec<T>, InvocationError>
    where
        T: DeserializeOwned + Send + 'static,
        P: ProgressSink<Vec<T>>,
    {
        let descriptor = self.descriptor(method, arguments)?;
        self.handler
            .invoke_progressive_async(descriptor, MultiValueExtractor::new(), sink)
            .await
    }
}
