//! Tipos de erro para o cliente do serviço de consulta de perfis.
//!
//! Define [`LookupError`] com variantes para perfil inexistente, rate limiting,
//! erros de rede, erros HTTP genéricos e payloads inválidos. O método
//! [`LookupError::kind`] classifica cada erro para a política de retentativa.

use std::time::Duration;

use thiserror::Error;

/// Erros que podem ocorrer ao consultar um identificador no serviço remoto.
///
/// - [`NotFound`](LookupError::NotFound): o servidor retornou HTTP 404
/// - [`RateLimited`](LookupError::RateLimited): o servidor retornou HTTP 429
/// - [`Network`](LookupError::Network): falha na camada de rede ou timeout
/// - [`Api`](LookupError::Api): qualquer outro status HTTP de erro
/// - [`InvalidPayload`](LookupError::InvalidPayload): corpo 200 que não pôde ser decodificado
/// - [`InvalidEndpoint`](LookupError::InvalidEndpoint): URL do endpoint inválida
#[derive(Debug, Error)]
pub enum LookupError {
    /// O perfil não existe.
    #[error("user not found")]
    NotFound,

    /// O servidor pediu para desacelerar. `retry_after` vem do cabeçalho
    /// `Retry-After`, quando presente.
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Status HTTP de erro sem tratamento específico.
    #[error("HTTP Error {status}: {message}")]
    Api { status: u16, message: String },

    /// Resposta de sucesso com corpo em formato inesperado.
    #[error("invalid response format: {0}")]
    InvalidPayload(String),

    /// A URL configurada não é um endpoint HTTP utilizável.
    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Classificação de uma falha para decisões de retentativa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Servidor sinalizou excesso de requisições; vale retentar com backoff.
    RateLimited,
    /// Falha de transporte; vale retentar com backoff.
    Transient,
    /// Nenhuma retentativa vai mudar o resultado.
    Permanent,
}

impl LookupError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LookupError::RateLimited { .. } => FailureKind::RateLimited,
            // Erro ao montar a requisição se repete em toda tentativa.
            LookupError::Network(e) if e.is_builder() => FailureKind::Permanent,
            LookupError::Network(_) => FailureKind::Transient,
            LookupError::NotFound
            | LookupError::Api { .. }
            | LookupError::InvalidPayload(_)
            | LookupError::InvalidEndpoint { .. } => FailureKind::Permanent,
        }
    }

    /// Mensagem gravada no resultado quando o erro é terminal.
    pub fn result_message(&self) -> String {
        match self {
            LookupError::NotFound => "Error: User not found".to_string(),
            LookupError::InvalidPayload(_) => "Error: Invalid response format".to_string(),
            LookupError::Api { status, .. } => format!("Error: HTTP Error {status}"),
            LookupError::RateLimited { .. } => "Error: Rate limited".to_string(),
            LookupError::Network(e) => format!("Error: {e}"),
            LookupError::InvalidEndpoint { .. } => "Error: Invalid endpoint".to_string(),
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "RateLimited"),
            FailureKind::Transient => write!(f, "Transient"),
            FailureKind::Permanent => write!(f, "Permanent"),
        }
    }
}
