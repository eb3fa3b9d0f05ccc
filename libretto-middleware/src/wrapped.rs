use async_trait::async_trait;
use libretto_core::{CallOptions, GenerateResult, LanguageModel, LibrettoError};

use crate::LibrettoMiddleware;

/// A model whose calls go through [`LibrettoMiddleware`].
#[derive(Debug, Clone)]
pub struct WrappedModel<M> {
    inner: M,
    middleware: LibrettoMiddleware,
}

pub fn wrap_language_model<M>(model: M, middleware: LibrettoMiddleware) -> WrappedModel<M>
where
    M: LanguageModel,
{
    WrappedModel {
        inner: model,
        middleware,
    }
}

#[async_trait]
impl<M> LanguageModel for WrappedModel<M>
where
    M: LanguageModel,
{
    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LibrettoError> {
        let options = self.middleware.transform_params(options)?;
        self.middleware.wrap_generate(&self.inner, options).await
    }
}
