use super::{GenerationError, SpeechError};

/// Trait for text generation (allows mocking in tests).
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt` under the `system` instruction.
    fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}

/// Trait for speech synthesis (allows mocking in tests).
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning the audio stream as received, chunk by chunk.
    fn synthesize(&self, text: &str) -> Result<Vec<Vec<u8>>, SpeechError>;
}
