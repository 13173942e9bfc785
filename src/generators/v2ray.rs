//! v2ray (Format A) generator: the converter's share-link output, unchanged.

use async_trait::async_trait;

use crate::generators::converter::{ConverterClient, Target};
use crate::generators::{ConfigGenerator, GeneratorError, GeneratorResult};
use crate::pipeline::RequestDescriptor;

pub struct V2rayGenerator {
    converter: ConverterClient,
}

impl V2rayGenerator {
    pub fn new(converter: ConverterClient) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl ConfigGenerator for V2rayGenerator {
    async fn generate(&self, descriptor: &RequestDescriptor) -> Result<GeneratorResult, GeneratorError> {
        let upstream = self.converter.fetch_nodes(descriptor, Target::V2ray).await?;
        Ok(GeneratorResult {
            status: Some(upstream.status),
            headers: upstream.headers,
            data: upstream.body.into(),
        })
    }
}
