//! Configuração do lastpost carregada a partir de `lastpost.toml`.
//!
//! A struct [`CheckerConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `LASTPOST_API_KEY` e `LASTPOST_ENDPOINT` têm
//! precedência sobre o arquivo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::error::CheckerError;
use crate::session::RetryPolicy;

/// Limites aceitos para os atrasos entre itens, em segundos.
pub const DELAY_BOUNDS: (u64, u64) = (1, 120);

/// Configuração de nível superior carregada de `lastpost.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckerConfig {
    /// URL do endpoint de perfil consultado para cada identificador.
    #[serde(default)]
    pub endpoint: String,

    /// Token enviado como `Authorization: Bearer`, se houver.
    #[serde(default)]
    pub api_key: String,

    /// Atraso mínimo entre itens, em segundos.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,

    /// Atraso máximo entre itens, em segundos.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    /// Retoma a sessão salva quando o tamanho da entrada bate.
    #[serde(default = "default_resume")]
    pub resume: bool,

    /// Tentativas por identificador, incluindo a primeira.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Atraso base em milissegundos para backoff exponencial.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Jitter máximo somado a cada backoff, em milissegundos.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Timeout total de cada requisição HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Salva um checkpoint a cada N itens concluídos.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Diretório onde os checkpoints são gravados.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Chave da sessão dentro de `state_dir`.
    #[serde(default = "default_session")]
    pub session: String,
}

// Valor padrão para o atraso mínimo: 5s.
fn default_min_delay_secs() -> u64 {
    5
}

// Valor padrão para o atraso máximo: 7s.
fn default_max_delay_secs() -> u64 {
    7
}

// Valor padrão para retomada: habilitada.
fn default_resume() -> bool {
    true
}

// Valor padrão para tentativas: 3.
fn default_max_attempts() -> u32 {
    3
}

// Valor padrão para o atraso base: 1000ms.
fn default_base_delay_ms() -> u64 {
    1000
}

// Valor padrão para o jitter: 500ms.
fn default_jitter_ms() -> u64 {
    500
}

// Valor padrão para o timeout de requisição: 30s.
fn default_request_timeout_secs() -> u64 {
    30
}

// Valor padrão para o intervalo de checkpoint: 10 itens.
fn default_checkpoint_interval() -> usize {
    10
}

// Valor padrão para o diretório de estado: ".lastpost".
fn default_state_dir() -> PathBuf {
    PathBuf::from(".lastpost")
}

// Valor padrão para a chave de sessão: "default".
fn default_session() -> String {
    "default".to_string()
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            resume: default_resume(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            checkpoint_interval: default_checkpoint_interval(),
            state_dir: default_state_dir(),
            session: default_session(),
        }
    }
}

impl CheckerConfig {
    /// Carrega a configuração do caminho indicado, usando defaults se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<CheckerConfig>(&contents).map_err(CheckerError::from)?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("LASTPOST_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }
        if let Ok(endpoint) = std::env::var("LASTPOST_ENDPOINT")
            && !endpoint.is_empty()
        {
            config.endpoint = endpoint;
        }

        Ok(config)
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            min_delay_secs: self.min_delay_secs,
            max_delay_secs: self.max_delay_secs,
            resume: self.resume,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
            jitter_ms: self.jitter_ms,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn api_key(&self) -> Option<String> {
        (!self.api_key.is_empty()).then(|| self.api_key.clone())
    }
}

/// Parâmetros de uma execução, validados antes de qualquer efeito colateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub resume: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        CheckerConfig::default().run_config()
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), CheckerError> {
        let (lo, hi) = DELAY_BOUNDS;
        for (name, value) in [("min", self.min_delay_secs), ("max", self.max_delay_secs)] {
            if !(lo..=hi).contains(&value) {
                return Err(CheckerError::Config(format!(
                    "{name} delay {value}s is outside {lo}..={hi}s"
                )));
            }
        }
        if self.min_delay_secs > self.max_delay_secs {
            return Err(CheckerError::Config(format!(
                "min delay {}s exceeds max delay {}s",
                self.min_delay_secs, self.max_delay_secs
            )));
        }
        Ok(())
    }
}
