use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::speech::SpeechError;

/// Uploads synthesized replies and mints short-lived playback URLs.
#[derive(Clone)]
pub struct AudioStore {
    s3: aws_sdk_s3::Client,
    bucket: String,
    url_ttl: Duration,
}

impl AudioStore {
    pub fn new(s3: aws_sdk_s3::Client, bucket: String, url_ttl: Duration) -> Self {
        Self { s3, bucket, url_ttl }
    }

    /// Stores `audio` under a fresh key and returns a presigned GET URL for it.
    pub async fn publish(&self, audio: Bytes) -> Result<String, SpeechError> {
        let key = audio_key(Uuid::new_v4());

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(audio))
            .content_type("audio/wav")
            .send()
            .await
            .map_err(|e| SpeechError::Upload(format!("S3 upload failed: {e}")))?;

        info!("Uploaded reply audio to s3://{}/{}", self.bucket, key);

        let presigning = PresigningConfig::expires_in(self.url_ttl)
            .map_err(|e| SpeechError::Upload(format!("Invalid presign TTL: {e}")))?;
        let request = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| SpeechError::Upload(format!("Presigning failed: {e}")))?;

        Ok(request.uri().to_string())
    }
}

fn audio_key(id: Uuid) -> String {
    format!("replies/{id}.wav")
}
