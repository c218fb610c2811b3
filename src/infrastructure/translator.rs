use crate::config::TranslatorConfig;
use crate::services::translator::Translator;
use crate::services::translator::deepl::DeeplTranslator;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// Builds the DeepL gateway. A missing API key stops startup here.
pub fn setup_translator(config: &TranslatorConfig) -> anyhow::Result<Arc<dyn Translator>> {
    let translator =
        DeeplTranslator::new(config).context("failed to configure the DeepL translator")?;
    info!(
        "🔤 DeepL translator: {} (poll every {:?}, timeout {:?})",
        translator.base_url(),
        config.poll_interval,
        config.timeout
    );
    Ok(Arc::new(translator))
}
