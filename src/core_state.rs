//! Application state shared by every request.
//!
//! Holds configuration and the external collaborators, all built once at
//! startup. There is no mutable in-process state: each request opens its
//! own SQLite connection through [`CoreState::open_db`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db;
use crate::identity::{HttpIdentityProvider, IdentityProvider};
use crate::pipeline::{
    ChatCompletionsClient, ElevenLabsClient, InstructionGenerator, SpeechSynthesizer,
    TextGenerator,
};

pub struct CoreState {
    pub config: AppConfig,
    pub auth: AuthService,
    db_path: PathBuf,
    generator: Arc<dyn TextGenerator>,
    /// `None` when no speech credential is configured.
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    identity: Arc<dyn IdentityProvider>,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        generator: Arc<dyn TextGenerator>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let auth = AuthService::new(
            &config.jwt_secret,
            config.token_ttl_days,
            config.password_iterations,
        );
        Self {
            db_path: config.database_path.clone(),
            config,
            auth,
            generator,
            speech,
            identity,
        }
    }

    /// Build the HTTP clients described by `config`.
    ///
    /// The clients are blocking, so this must run outside the async
    /// runtime (startup uses `spawn_blocking`).
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let timeout = config.upstream_timeout;
        let generator = ChatCompletionsClient::new(
            &config.llm.base_url,
            &config.llm.api_key,
            &config.llm.model,
            timeout,
        )
        .map_err(|e| CoreError::ClientSetup(e.to_string()))?;

        let speech: Option<Arc<dyn SpeechSynthesizer>> = match &config.speech {
            Some(settings) => Some(Arc::new(
                ElevenLabsClient::new(
                    &settings.base_url,
                    &settings.api_key,
                    &settings.voice_id,
                    &settings.model_id,
                    timeout,
                )
                .map_err(|e| CoreError::ClientSetup(e.to_string()))?,
            )),
            None => {
                tracing::info!("ELEVENLABS_API_KEY not set, instructions will have no audio");
                None
            }
        };

        let identity = HttpIdentityProvider::new(&config.identity_session_url, timeout)
            .map_err(|e| CoreError::ClientSetup(e.to_string()))?;

        tracing::info!(model = %generator.model(), "External clients ready");
        Ok(Self::new(
            config,
            Arc::new(generator),
            speech,
            Arc::new(identity),
        ))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection for one request. The schema is created at startup.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_connection(&self.db_path).map_err(CoreError::Database)
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// Instruction pipeline wired to the configured collaborators.
    pub fn instruction_generator(&self) -> InstructionGenerator<'_> {
        InstructionGenerator::new(self.generator.as_ref(), self.speech.as_deref())
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(db::DatabaseError),
    #[error("Client setup failed: {0}")]
    ClientSetup(String),
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::identity::{ExternalIdentity, MockIdentityProvider};
    use crate::pipeline::{MockSpeechSynthesizer, MockTextGenerator};

    /// Session id accepted by the test identity provider.
    pub const TEST_SESSION_ID: &str = "sess-ok";

    pub const TEST_REPLY: &str =
        "## CUIDADOS GERAIS\n**Repouso** por 24 horas.\n- Aplique gelo\n\n\n\n### RETORNO\nEm `7 dias`.";

    /// Config pointing at a fresh database inside `dir`, with cheap hashing.
    pub fn test_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::from_lookup(|_| None);
        config.database_path = dir.join("carefollow.db");
        config.password_iterations = 1_000;
        config
    }

    /// CoreState with mock collaborators and a migrated database.
    pub fn test_core(dir: &Path) -> Arc<CoreState> {
        let config = test_config(dir);
        db::open_database(&config.database_path).unwrap();
        Arc::new(CoreState::new(
            config,
            Arc::new(MockTextGenerator::new(TEST_REPLY)),
            Some(Arc::new(MockSpeechSynthesizer::new(vec![b"ID3".to_vec()]))),
            Arc::new(MockIdentityProvider::new(
                TEST_SESSION_ID,
                ExternalIdentity {
                    email: "sso@clinic.example".into(),
                    name: "Sso Staff".into(),
                    picture: None,
                },
            )),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;

    #[test]
    fn open_db_reaches_migrated_schema() {
        let dir = tempfile::tempdir().unwrap();
        let core = test_core(dir.path());
        let conn = core.open_db().unwrap();
        assert_eq!(crate::db::count_tables(&conn).unwrap(), 7);
    }

    #[test]
    fn each_open_is_an_independent_connection() {
        let dir = tempfile::tempdir().unwrap();
        let core = test_core(dir.path());
        let a = core.open_db().unwrap();
        let b = core.open_db().unwrap();
        a.execute(
            "INSERT INTO patients (patient_id, name, email, phone, created_at, created_by)
             VALUES ('pat_1', 'Ana', 'a@b.c', '', '2024-01-01T00:00:00.000000Z', 'u')",
            [],
        )
        .unwrap();
        let n: i64 = b
            .query_row("SELECT COUNT(*) FROM patients", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn from_config_builds_clients_without_speech_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert!(config.speech.is_none());
        let core = super::CoreState::from_config(config).unwrap();
        assert_eq!(core.db_path(), dir.path().join("carefollow.db"));
    }
}
