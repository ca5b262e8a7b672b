use std::io::Read;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use super::types::SpeechSynthesizer;
use super::SpeechError;

/// Longest text sent for narration, in characters.
pub const MAX_SPEECH_CHARS: usize = 3000;

const READ_CHUNK_BYTES: usize = 16 * 1024;

/// First `MAX_SPEECH_CHARS` characters of `text`, cut on a char boundary.
pub fn truncate_for_speech(text: &str) -> &str {
    match text.char_indices().nth(MAX_SPEECH_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Concatenate audio chunks in order into an MP3 data URI.
pub fn encode_audio_data_uri(chunks: &[Vec<u8>]) -> String {
    let audio: Vec<u8> = chunks.concat();
    format!("data:audio/mpeg;base64,{}", STANDARD.encode(audio))
}

/// ElevenLabs streaming text-to-speech client.
pub struct ElevenLabsClient {
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl ElevenLabsClient {
    /// Must be called outside the async runtime (blocking client).
    pub fn new(
        base_url: &str,
        api_key: &str,
        voice_id: &str,
        model_id: &str,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeechError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            voice_id: voice_id.to_string(),
            model_id: model_id.to_string(),
            client,
        })
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl SpeechSynthesizer for ElevenLabsClient {
    fn synthesize(&self, text: &str) -> Result<Vec<Vec<u8>>, SpeechError> {
        let url = format!("{}/text-to-speech/{}/stream", self.base_url, self.voice_id);
        let mut response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .map_err(|e| SpeechError::HttpClient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Upstream(status.as_u16()));
        }

        let mut chunks = Vec::new();
        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        loop {
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            chunks.push(buf[..n].to_vec());
        }

        if chunks.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        Ok(chunks)
    }
}

/// Mock synthesizer for testing: fixed chunks or always fails.
pub struct MockSpeechSynthesizer {
    chunks: Option<Vec<Vec<u8>>>,
}

impl MockSpeechSynthesizer {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: Some(chunks),
        }
    }

    pub fn failing() -> Self {
        Self { chunks: None }
    }
}

impl SpeechSynthesizer for MockSpeechSynthesizer {
    fn synthesize(&self, _text: &str) -> Result<Vec<Vec<u8>>, SpeechError> {
        self.chunks.clone().ok_or(SpeechError::Upstream(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_for_speech("curto"), "curto");
    }

    #[test]
    fn truncate_cuts_on_char_boundary() {
        let text = "ç".repeat(MAX_SPEECH_CHARS + 10);
        let cut = truncate_for_speech(&text);
        assert_eq!(cut.chars().count(), MAX_SPEECH_CHARS);
        assert!(text.starts_with(cut));
    }

    #[test]
    fn data_uri_concatenates_in_order() {
        let uri = encode_audio_data_uri(&[b"ab".to_vec(), b"cd".to_vec()]);
        assert_eq!(uri, format!("data:audio/mpeg;base64,{}", STANDARD.encode(b"abcd")));
    }

    async fn tts_stub(
        Path(voice): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Result<Vec<u8>, StatusCode> {
        if headers.get("xi-api-key").and_then(|v| v.to_str().ok()) != Some("xi-test") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let text = body["text"].as_str().unwrap_or_default();
        let model = body["model_id"].as_str().unwrap_or_default();
        Ok(format!("{voice}:{model}:{text}").into_bytes())
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/v1/text-to-speech/:voice/stream", post(tts_stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn synth(base: String, key: &'static str) -> Result<Vec<Vec<u8>>, SpeechError> {
        let client =
            ElevenLabsClient::new(&base, key, "voice-1", "model-x", Duration::from_secs(5))?;
        client.synthesize("olá")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn client_posts_text_and_reads_stream() {
        let base = spawn_stub().await;
        let chunks = tokio::task::spawn_blocking(move || synth(base, "xi-test"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chunks.concat(), "voice-1:model-x:olá".as_bytes());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn client_maps_rejection() {
        let base = spawn_stub().await;
        let err = tokio::task::spawn_blocking(move || synth(base, "wrong"))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, SpeechError::Upstream(401)));
    }

    #[test]
    fn mock_synthesizer() {
        let mock = MockSpeechSynthesizer::new(vec![vec![1], vec![2]]);
        assert_eq!(mock.synthesize("x").unwrap(), vec![vec![1], vec![2]]);
        assert!(MockSpeechSynthesizer::failing().synthesize("x").is_err());
    }
}
